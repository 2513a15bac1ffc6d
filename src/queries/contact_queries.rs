use rusqlite::Connection;
use serde::Serialize;

use crate::db::{address_repo, contact_repo};
use crate::error::{ContactsError, ContactsResult};
use crate::model::{Address, Contact, Id};

/// One page of a listing. Page numbers start at 1.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }
}

/// Resolves a raw `page` query value against the listing size. `None` is the
/// first page and `"last"` the last one; anything else must be a number
/// within range. An empty listing still has page 1.
pub fn resolve_page(raw: Option<&str>, total: usize, page_size: usize) -> ContactsResult<usize> {
    let num_pages = num_pages(total, page_size);
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());

    let number = match raw {
        None => 1,
        Some("last") => num_pages,
        Some(s) => s
            .parse::<usize>()
            .map_err(|_| ContactsError::not_found("Page", s))?,
    };

    if number == 0 || number > num_pages {
        return Err(ContactsError::not_found("Page", number));
    }
    Ok(number)
}

fn num_pages(total: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    total.div_ceil(page_size).max(1)
}

/// Contacts in creation order, `page_size` per page.
pub fn list_page(
    conn: &Connection,
    raw_page: Option<&str>,
    page_size: usize,
) -> ContactsResult<Page<Contact>> {
    let page_size = page_size.max(1);
    let total = contact_repo::count(conn)?;
    let number = resolve_page(raw_page, total, page_size)?;
    let items = contact_repo::find_page(conn, page_size, (number - 1) * page_size)?;

    Ok(Page {
        items,
        number,
        num_pages: num_pages(total, page_size),
        total,
        page_size,
    })
}

pub fn get_contact(conn: &Connection, id: Id<Contact>) -> ContactsResult<Option<Contact>> {
    contact_repo::find_by_id(conn, id)
}

pub fn contact_with_addresses(
    conn: &Connection,
    id: Id<Contact>,
) -> ContactsResult<Option<(Contact, Vec<Address>)>> {
    match contact_repo::find_by_id(conn, id)? {
        Some(contact) => {
            let addresses = address_repo::find_by_contact(conn, id)?;
            Ok(Some((contact, addresses)))
        }
        None => Ok(None),
    }
}

pub fn find_by_email(conn: &Connection, email: &str) -> ContactsResult<Option<Contact>> {
    contact_repo::find_by_email(conn, email.trim())
}
