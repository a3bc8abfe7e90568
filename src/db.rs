use anyhow::{Context, Result};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};

/// A registered bot user
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub blocked: bool,
    pub receipt_count: i64,
    pub created_at: String,
    pub last_seen_at: String,
}

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    info!("Initializing database schema...");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            telegram_id INTEGER NOT NULL UNIQUE,
            username TEXT,
            first_name TEXT NOT NULL,
            blocked INTEGER NOT NULL DEFAULT 0,
            receipt_count INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            last_seen_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create users table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS usage_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            telegram_id INTEGER NOT NULL,
            action TEXT NOT NULL,
            detail TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create usage_log table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Register a user on first contact, refresh their name and last-seen
/// timestamp on every later one. Users are never deleted.
pub fn upsert_user(
    conn: &Connection,
    telegram_id: i64,
    username: Option<&str>,
    first_name: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO users (telegram_id, username, first_name) VALUES (?1, ?2, ?3)
         ON CONFLICT(telegram_id) DO UPDATE SET
             username = excluded.username,
             first_name = excluded.first_name,
             last_seen_at = CURRENT_TIMESTAMP",
        params![telegram_id, username, first_name],
    )
    .context("Failed to upsert user")?;
    Ok(())
}

/// Fetch a user by telegram id
pub fn get_user(conn: &Connection, telegram_id: i64) -> Result<Option<UserRecord>> {
    conn.query_row(
        "SELECT id, telegram_id, username, first_name, blocked, receipt_count,
                created_at, last_seen_at
         FROM users WHERE telegram_id = ?1",
        params![telegram_id],
        |row| {
            Ok(UserRecord {
                id: row.get(0)?,
                telegram_id: row.get(1)?,
                username: row.get(2)?,
                first_name: row.get(3)?,
                blocked: row.get::<_, i64>(4)? != 0,
                receipt_count: row.get(5)?,
                created_at: row.get(6)?,
                last_seen_at: row.get(7)?,
            })
        },
    )
    .optional()
    .context("Failed to read user")
}

/// Whether a user is blocked. Unknown users are not blocked.
pub fn is_blocked(conn: &Connection, telegram_id: i64) -> Result<bool> {
    let blocked: Option<i64> = conn
        .query_row(
            "SELECT blocked FROM users WHERE telegram_id = ?1",
            params![telegram_id],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to read blocked flag")?;
    Ok(blocked.unwrap_or(0) != 0)
}

/// Set or clear the blocked flag. Returns false when the user is unknown.
pub fn set_blocked(conn: &Connection, telegram_id: i64, blocked: bool) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "UPDATE users SET blocked = ?1 WHERE telegram_id = ?2",
            params![blocked as i64, telegram_id],
        )
        .context("Failed to update blocked flag")?;

    if rows_affected > 0 {
        info!("User {telegram_id} blocked flag set to {blocked}");
        Ok(true)
    } else {
        info!("No user found with telegram_id: {telegram_id}");
        Ok(false)
    }
}

/// All registered users, newest first
pub fn list_users(conn: &Connection) -> Result<Vec<UserRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, telegram_id, username, first_name, blocked, receipt_count,
                    created_at, last_seen_at
             FROM users ORDER BY created_at DESC",
        )
        .context("Failed to prepare user listing")?;

    let users = stmt
        .query_map([], |row| {
            Ok(UserRecord {
                id: row.get(0)?,
                telegram_id: row.get(1)?,
                username: row.get(2)?,
                first_name: row.get(3)?,
                blocked: row.get::<_, i64>(4)? != 0,
                receipt_count: row.get(5)?,
                created_at: row.get(6)?,
                last_seen_at: row.get(7)?,
            })
        })
        .context("Failed to list users")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to read user rows")?;

    Ok(users)
}

/// Bump the usage counter after a successful render
pub fn record_receipt(conn: &Connection, telegram_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE users SET receipt_count = receipt_count + 1,
                          last_seen_at = CURRENT_TIMESTAMP
         WHERE telegram_id = ?1",
        params![telegram_id],
    )
    .context("Failed to record receipt")?;
    Ok(())
}

/// Append an entry to the usage log
pub fn log_action(
    conn: &Connection,
    telegram_id: i64,
    action: &str,
    detail: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO usage_log (telegram_id, action, detail) VALUES (?1, ?2, ?3)",
        params![telegram_id, action, detail],
    )
    .context("Failed to insert usage log entry")?;
    Ok(())
}
