use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::ContactsResult;
use crate::model::{Contact, Id};

const COLUMNS: &str = "id, first_name, last_name, email, avatar, notes, created_at";

pub fn insert(conn: &Connection, contact: &Contact) -> ContactsResult<()> {
    conn.execute(
        "INSERT INTO contacts (id, first_name, last_name, email, avatar, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            contact.id,
            contact.first_name,
            contact.last_name,
            contact.email,
            contact.avatar,
            contact.notes,
            format_timestamp(&contact.created_at),
        ],
    )?;
    Ok(())
}

/// Writes every mutable column. `created_at` is never rewritten.
pub fn update(conn: &Connection, contact: &Contact) -> ContactsResult<()> {
    conn.execute(
        "UPDATE contacts SET first_name = ?1, last_name = ?2, email = ?3, avatar = ?4, notes = ?5
         WHERE id = ?6",
        params![
            contact.first_name,
            contact.last_name,
            contact.email,
            contact.avatar,
            contact.notes,
            contact.id,
        ],
    )?;
    Ok(())
}

/// Returns whether a row was removed. Addresses go with it.
pub fn delete(conn: &Connection, contact_id: Id<Contact>) -> ContactsResult<bool> {
    let removed = conn.execute("DELETE FROM contacts WHERE id = ?1", params![contact_id])?;
    Ok(removed > 0)
}

pub fn find_by_id(conn: &Connection, id: Id<Contact>) -> ContactsResult<Option<Contact>> {
    let contact = conn
        .query_row(
            &format!("SELECT {} FROM contacts WHERE id = ?1", COLUMNS),
            params![id],
            row_to_contact,
        )
        .optional()?;
    Ok(contact)
}

pub fn find_by_email(conn: &Connection, email: &str) -> ContactsResult<Option<Contact>> {
    let contact = conn
        .query_row(
            &format!("SELECT {} FROM contacts WHERE email = ?1", COLUMNS),
            params![email],
            row_to_contact,
        )
        .optional()?;
    Ok(contact)
}

pub fn count(conn: &Connection) -> ContactsResult<usize> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
    Ok(n as usize)
}

/// Contacts in creation order, oldest first.
pub fn find_page(conn: &Connection, limit: usize, offset: usize) -> ContactsResult<Vec<Contact>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM contacts ORDER BY created_at, rowid LIMIT ?1 OFFSET ?2",
        COLUMNS
    ))?;

    let contacts = stmt
        .query_map(params![limit as i64, offset as i64], row_to_contact)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(contacts)
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_contact(row: &rusqlite::Row) -> rusqlite::Result<Contact> {
    let created_at: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(Contact {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        avatar: row.get(4)?,
        notes: row.get(5)?,
        created_at,
    })
}
