use rusqlite::Connection;

use crate::error::Result;
use crate::types::SessionRecord;

/// Initialise the sessions table.
///
/// Safe to call on every startup; uses `IF NOT EXISTS` throughout.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            data        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            saved_at    TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_name
            ON sessions(name);",
    )?;
    Ok(())
}

/// Replace every stored row with `records`, in one transaction.
pub fn write_records(conn: &mut Connection, records: &[SessionRecord]) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM sessions", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO sessions (id, name, data, created_at, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for record in records {
            let data = serde_json::to_string(&record.data)?;
            stmt.execute(rusqlite::params![
                record.id.as_str(),
                record.data.name,
                data,
                record.created_at,
                now
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Read every stored row, oldest first.
pub fn read_records(conn: &Connection) -> Result<Vec<SessionRecord>> {
    let mut stmt =
        conn.prepare("SELECT id, data, created_at FROM sessions ORDER BY created_at, id")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (id, data, created_at) = row?;
        records.push(SessionRecord {
            id: id.into(),
            data: serde_json::from_str(&data)?,
            created_at,
        });
    }
    Ok(records)
}
