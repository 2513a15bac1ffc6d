use rusqlite::{params, Connection, OptionalExtension};

use crate::error::ContactsResult;
use crate::model::{Address, AddressData, Contact, Id};

pub fn insert(conn: &Connection, address: &Address) -> ContactsResult<()> {
    conn.execute(
        "INSERT INTO addresses (id, contact_id, label, line1, line2, city, country)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            address.id,
            address.contact_id,
            address.label,
            address.line1,
            address.line2,
            address.city,
            address.country,
        ],
    )?;
    Ok(())
}

/// Updates an address only if it belongs to `contact_id`. Returns whether a
/// row changed.
pub fn update(
    conn: &Connection,
    contact_id: Id<Contact>,
    address_id: Id<Address>,
    data: &AddressData,
) -> ContactsResult<bool> {
    let changed = conn.execute(
        "UPDATE addresses SET label = ?1, line1 = ?2, line2 = ?3, city = ?4, country = ?5
         WHERE id = ?6 AND contact_id = ?7",
        params![
            data.label,
            data.line1,
            data.line2,
            data.city,
            data.country,
            address_id,
            contact_id,
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete(
    conn: &Connection,
    contact_id: Id<Contact>,
    address_id: Id<Address>,
) -> ContactsResult<bool> {
    let removed = conn.execute(
        "DELETE FROM addresses WHERE id = ?1 AND contact_id = ?2",
        params![address_id, contact_id],
    )?;
    Ok(removed > 0)
}

pub fn find_by_id(conn: &Connection, id: Id<Address>) -> ContactsResult<Option<Address>> {
    let address = conn
        .query_row(
            "SELECT id, contact_id, label, line1, line2, city, country
             FROM addresses WHERE id = ?1",
            params![id],
            row_to_address,
        )
        .optional()?;
    Ok(address)
}

/// Addresses of one contact in insertion order.
pub fn find_by_contact(conn: &Connection, contact_id: Id<Contact>) -> ContactsResult<Vec<Address>> {
    let mut stmt = conn.prepare(
        "SELECT id, contact_id, label, line1, line2, city, country
         FROM addresses WHERE contact_id = ?1 ORDER BY rowid",
    )?;

    let addresses = stmt
        .query_map(params![contact_id], row_to_address)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(addresses)
}

pub fn count_for_contact(conn: &Connection, contact_id: Id<Contact>) -> ContactsResult<usize> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM addresses WHERE contact_id = ?1",
        params![contact_id],
        |row| row.get(0),
    )?;
    Ok(n as usize)
}

fn row_to_address(row: &rusqlite::Row) -> rusqlite::Result<Address> {
    Ok(Address {
        id: row.get(0)?,
        contact_id: row.get(1)?,
        label: row.get(2)?,
        line1: row.get(3)?,
        line2: row.get(4)?,
        city: row.get(5)?,
        country: row.get(6)?,
    })
}
