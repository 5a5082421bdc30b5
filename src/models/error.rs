use thiserror::Error;

/// Recoverable failures of list operations
///
/// None of these are fatal: the session reports them on the log line and
/// leaves the tree untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("item does not exist: {target}")]
    NotFound { target: String },

    #[error("an item with id '{id}' already exists")]
    DuplicateId { id: String },

    #[error("invalid recurrence '{token}' (valid: {})", valid.join(", "))]
    InvalidRecurrence { token: String, valid: Vec<String> },

    #[error("dates of item '{id}' cannot move past the calendar's range")]
    DateOutOfRange { id: String },
}

impl TaskError {
    pub fn not_found(target: &str) -> Self {
        TaskError::NotFound { target: target.to_string() }
    }
}
