use rusqlite::{params, Connection};

use crate::db::DatabaseError;

/// One persisted access record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AuditRow {
    pub timestamp: String,
    pub actor: String,
    pub action: String,
    pub outcome: String,
}

/// Insert a batch of audit entries into the audit_log table.
pub fn insert_audit_entries(conn: &Connection, entries: &[AuditRow]) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare(
        "INSERT INTO audit_log (timestamp, actor, action, outcome) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for entry in entries {
        stmt.execute(params![entry.timestamp, entry.actor, entry.action, entry.outcome])?;
    }
    Ok(())
}

/// Prune audit entries older than the given number of days.
pub fn prune_audit_log(conn: &Connection, retention_days: i64) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM audit_log WHERE timestamp < strftime('%Y-%m-%dT%H:%M:%S', 'now', ?1)",
        params![format!("-{retention_days} days")],
    )?;
    Ok(deleted)
}

/// Most recent entries for one actor, newest first.
pub fn query_audit_by_actor(
    conn: &Connection,
    actor: &str,
    limit: u32,
) -> Result<Vec<AuditRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT timestamp, actor, action, outcome FROM audit_log
         WHERE actor = ?1 ORDER BY timestamp DESC, id DESC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![actor, limit], |row| {
            Ok(AuditRow {
                timestamp: row.get(0)?,
                actor: row.get(1)?,
                action: row.get(2)?,
                outcome: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
