use rusqlite::Connection;
use tracing::{info, instrument, warn};

use crate::db::{self, address_repo, contact_repo};
use crate::error::{ContactsError, ContactsResult};
use crate::forms::contact_form::EMAIL_TAKEN;
use crate::forms::{AddressFormSet, AvatarChange, ContactForm, FormErrors, RowCommand};
use crate::model::{Contact, Id};
use crate::ops::address_ops::{self, AddressChanges};
use crate::storage::AvatarStore;
use crate::validation::FieldErrors;

/// Validates a create form and inserts the contact.
#[instrument(name = "contacts.ops.create_contact", skip_all, fields(email = %form.input.email.trim()))]
pub fn create_contact(
    conn: &Connection,
    avatars: &AvatarStore,
    form: &ContactForm,
) -> ContactsResult<Contact> {
    let draft = form.validate(conn)?;
    let (mut contact, change) = draft.into_contact();
    let swap = AvatarSwap::prepare(avatars, &mut contact, &change)?;

    if let Err(e) = contact_repo::insert(conn, &contact) {
        swap.rollback(avatars);
        return Err(map_unique_email(e));
    }

    info!(contact_id = %contact.id, "Created contact");
    Ok(contact)
}

/// Validates an edit form bound to an existing contact and saves it.
#[instrument(name = "contacts.ops.update_contact", skip_all, fields(contact_id = ?form.instance()))]
pub fn update_contact(
    conn: &Connection,
    avatars: &AvatarStore,
    form: &ContactForm,
) -> ContactsResult<Contact> {
    let id = bound_instance(form)?;
    let mut contact = load(conn, id)?;

    let draft = form.validate(conn)?;
    let change = draft.apply_to(&mut contact);
    let swap = AvatarSwap::prepare(avatars, &mut contact, &change)?;

    if let Err(e) = contact_repo::update(conn, &contact) {
        swap.rollback(avatars);
        return Err(map_unique_email(e));
    }
    swap.commit(avatars);

    info!("Updated contact");
    Ok(contact)
}

/// Saves a contact together with its address rows. Both are validated
/// independently and every error is reported at once; the store is only
/// touched when both pass, and then in a single transaction.
#[instrument(name = "contacts.ops.save_contact_with_addresses", skip_all, fields(contact_id = ?form.instance()))]
pub fn save_contact_with_addresses(
    conn: &mut Connection,
    avatars: &AvatarStore,
    form: &ContactForm,
    formset: &AddressFormSet,
) -> ContactsResult<(Contact, AddressChanges)> {
    let id = bound_instance(form)?;
    let mut contact = load(conn, id)?;
    let existing = address_repo::find_by_contact(conn, id)?;

    let (draft, commands) = match (form.validate(conn), formset.clean(&existing)) {
        (Ok(draft), Ok(commands)) => (draft, commands),
        (contact_result, rows_result) => {
            let mut errors = FormErrors::default();
            match contact_result {
                Ok(_) => {}
                Err(ContactsError::Invalid(e)) => errors.contact = e.contact,
                Err(other) => return Err(other),
            }
            if let Err(e) = rows_result {
                errors.addresses = e;
            }
            warn!(errors = %errors, "Rejected contact with addresses");
            return Err(ContactsError::Invalid(errors));
        }
    };

    let change = draft.apply_to(&mut contact);
    let swap = AvatarSwap::prepare(avatars, &mut contact, &change)?;

    match persist_jointly(conn, &contact, &commands) {
        Ok(changes) => {
            swap.commit(avatars);
            info!(
                inserted = changes.inserted.len(),
                updated = changes.updated,
                deleted = changes.deleted,
                "Saved contact with addresses"
            );
            Ok((contact, changes))
        }
        Err(e) => {
            swap.rollback(avatars);
            Err(map_unique_email(e))
        }
    }
}

/// Removes a contact, its addresses and its avatar file.
#[instrument(name = "contacts.ops.delete_contact", skip(conn, avatars))]
pub fn delete_contact(
    conn: &Connection,
    avatars: &AvatarStore,
    id: Id<Contact>,
) -> ContactsResult<()> {
    let contact = load(conn, id)?;
    contact_repo::delete(conn, id)?;
    if let Some(reference) = &contact.avatar {
        avatars.discard(reference);
    }
    info!("Deleted contact");
    Ok(())
}

fn persist_jointly(
    conn: &mut Connection,
    contact: &Contact,
    commands: &[RowCommand],
) -> ContactsResult<AddressChanges> {
    let tx = conn.transaction()?;
    contact_repo::update(&tx, contact)?;
    let changes = address_ops::apply(&tx, contact.id, commands)?;
    tx.commit()?;
    Ok(changes)
}

fn load(conn: &Connection, id: Id<Contact>) -> ContactsResult<Contact> {
    contact_repo::find_by_id(conn, id)?.ok_or_else(|| ContactsError::not_found("Contact", id))
}

fn bound_instance(form: &ContactForm) -> ContactsResult<Id<Contact>> {
    form.instance()
        .ok_or_else(|| ContactsError::Other("Contact form is not bound to a contact".into()))
}

/// The store's UNIQUE constraint backs up the validation-time lookup; a
/// violation is reported the same way.
fn map_unique_email(err: ContactsError) -> ContactsError {
    match err {
        ContactsError::Database(ref e) if db::is_unique_violation(e, "contacts", "email") => {
            let mut errors = FieldErrors::new();
            errors.add("email", EMAIL_TAKEN);
            ContactsError::Invalid(FormErrors::from(errors))
        }
        other => other,
    }
}

/// Avatar file written ahead of a save, plus the file it displaces. The new
/// file is dropped if the save fails; the old one once it succeeds.
#[derive(Debug, Default)]
struct AvatarSwap {
    stored: Option<String>,
    replaced: Option<String>,
}

impl AvatarSwap {
    fn prepare(
        avatars: &AvatarStore,
        contact: &mut Contact,
        change: &AvatarChange,
    ) -> ContactsResult<Self> {
        match change {
            AvatarChange::Keep => Ok(Self::default()),
            AvatarChange::Clear => Ok(Self {
                stored: None,
                replaced: contact.avatar.take(),
            }),
            AvatarChange::Replace(file) => {
                let reference = avatars.save(file)?;
                let replaced = contact.avatar.replace(reference.clone());
                Ok(Self {
                    stored: Some(reference),
                    replaced,
                })
            }
        }
    }

    fn commit(self, avatars: &AvatarStore) {
        if let Some(reference) = &self.replaced {
            avatars.discard(reference);
        }
    }

    fn rollback(self, avatars: &AvatarStore) {
        if let Some(reference) = &self.stored {
            avatars.discard(reference);
        }
    }
}
