use rusqlite::Connection;
use std::path::Path;

use crate::error::ContactsResult;

/// Initialize the database schema. Creates all tables if they don't exist.
pub fn initialize(conn: &Connection) -> ContactsResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS contacts (
            id TEXT PRIMARY KEY NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            avatar TEXT,
            notes TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS addresses (
            id TEXT PRIMARY KEY NOT NULL,
            contact_id TEXT NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
            label TEXT NOT NULL,
            line1 TEXT NOT NULL,
            line2 TEXT NOT NULL DEFAULT '',
            city TEXT NOT NULL,
            country TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_addresses_contact_id ON addresses(contact_id);
        CREATE INDEX IF NOT EXISTS idx_contacts_created_at ON contacts(created_at);

        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

/// Open (creating if needed) the database file and initialize the schema.
pub fn open(path: &Path) -> ContactsResult<Connection> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let conn = Connection::open(path)?;
    initialize(&conn)?;
    Ok(conn)
}

/// Create an in-memory connection for testing. Available in test builds.
pub fn test_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    initialize(&conn).unwrap();
    conn
}
