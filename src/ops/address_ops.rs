use rusqlite::Connection;
use tracing::debug;

use crate::db::address_repo;
use crate::error::{ContactsError, ContactsResult};
use crate::forms::RowCommand;
use crate::model::{Address, Contact, Id};

/// What a batch of row commands did to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressChanges {
    pub inserted: Vec<Address>,
    pub updated: usize,
    pub deleted: usize,
}

impl AddressChanges {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated == 0 && self.deleted == 0
    }
}

/// Applies validated row commands to one contact's addresses. Callers run
/// this inside the transaction that also saves the contact.
pub fn apply(
    conn: &Connection,
    contact_id: Id<Contact>,
    commands: &[RowCommand],
) -> ContactsResult<AddressChanges> {
    let mut changes = AddressChanges::default();

    for command in commands {
        match command {
            RowCommand::Insert(data) => {
                let address = Address::create(contact_id, data.clone());
                address_repo::insert(conn, &address)?;
                changes.inserted.push(address);
            }
            RowCommand::Update(address_id, data) => {
                if !address_repo::update(conn, contact_id, *address_id, data)? {
                    return Err(ContactsError::not_found("Address", address_id));
                }
                changes.updated += 1;
            }
            RowCommand::Delete(address_id) => {
                if !address_repo::delete(conn, contact_id, *address_id)? {
                    return Err(ContactsError::not_found("Address", address_id));
                }
                changes.deleted += 1;
            }
        }
    }

    debug!(
        contact_id = %contact_id,
        inserted = changes.inserted.len(),
        updated = changes.updated,
        deleted = changes.deleted,
        "Applied address changes"
    );
    Ok(changes)
}
