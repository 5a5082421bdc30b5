use rusqlite::{Connection, OptionalExtension};
use crate::models::Backup;
use anyhow::{Context, Result};

/// Backup repository for the snapshot ledger
///
/// Each backup is the full serialized state file at the moment it was taken.
/// Ids grow monotonically, so the highest id is always the newest snapshot.
pub struct BackupRepo;

impl BackupRepo {
    /// Store a new snapshot
    pub fn create(conn: &Connection, state_json: &str, label: Option<&str>) -> Result<Backup> {
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO backups (label, created_ts, state_json) VALUES (?1, ?2, ?3)",
            rusqlite::params![label, now, state_json],
        )?;

        let id = conn.last_insert_rowid();
        log::debug!("Created backup {} ({} bytes)", id, state_json.len());

        Ok(Backup {
            id: Some(id),
            label: label.map(|l| l.to_string()),
            created_ts: now,
            state_json: state_json.to_string(),
        })
    }

    /// All snapshots, newest first
    pub fn list(conn: &Connection) -> Result<Vec<Backup>> {
        let mut stmt = conn.prepare(
            "SELECT id, label, created_ts, state_json
             FROM backups
             ORDER BY id DESC"
        )?;

        let rows = stmt.query_map([], row_to_backup)?;

        let mut backups = Vec::new();
        for row in rows {
            backups.push(row?);
        }
        Ok(backups)
    }

    /// Get backup by ID
    pub fn get_by_id(conn: &Connection, backup_id: i64) -> Result<Option<Backup>> {
        let mut stmt = conn.prepare(
            "SELECT id, label, created_ts, state_json
             FROM backups
             WHERE id = ?1"
        )?;

        stmt.query_row([backup_id], row_to_backup)
            .optional()
            .context("Failed to query backup")
    }

    /// Delete all but the newest `keep` snapshots, returning how many were removed
    pub fn prune(conn: &Connection, keep: usize) -> Result<usize> {
        let removed = conn.execute(
            "DELETE FROM backups WHERE id NOT IN (
                SELECT id FROM backups ORDER BY id DESC LIMIT ?1
            )",
            [keep as i64],
        )?;
        if removed > 0 {
            log::debug!("Pruned {} old backup(s)", removed);
        }
        Ok(removed)
    }
}

fn row_to_backup(row: &rusqlite::Row) -> rusqlite::Result<Backup> {
    Ok(Backup {
        id: Some(row.get(0)?),
        label: row.get(1)?,
        created_ts: row.get(2)?,
        state_json: row.get(3)?,
    })
}
