/// A stored snapshot of the whole state file
#[derive(Debug, Clone, PartialEq)]
pub struct Backup {
    pub id: Option<i64>,
    pub label: Option<String>,
    pub created_ts: i64,
    pub state_json: String,
}
