use contacts::db::*;
use contacts::model::*;
use contacts::queries::contact_queries;

fn setup_with(count: usize) -> (rusqlite::Connection, Vec<Contact>) {
    let conn = schema::test_connection();
    let contacts = (0..count)
        .map(|i| {
            let contact = Contact::create(
                format!("First{i}"),
                format!("Last{i}"),
                format!("person{i}@example.com"),
            );
            contact_repo::insert(&conn, &contact).unwrap();
            contact
        })
        .collect();
    (conn, contacts)
}

// ==========================================================================
// LIST TESTS
// ==========================================================================

#[test]
fn empty_list_is_single_empty_page() {
    let (conn, _) = setup_with(0);
    let page = contact_queries::list_page(&conn, None, 10).unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.number, 1);
    assert_eq!(page.num_pages, 1);
    assert!(!page.has_next());
    assert!(!page.has_previous());
}

#[test]
fn list_paginates_in_creation_order() {
    let (conn, contacts) = setup_with(23);

    let first = contact_queries::list_page(&conn, None, 10).unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.num_pages, 3);
    assert_eq!(first.total, 23);
    assert_eq!(first.items[0].id, contacts[0].id);
    assert!(first.has_next());

    let last = contact_queries::list_page(&conn, Some("3"), 10).unwrap();
    assert_eq!(last.items.len(), 3);
    assert_eq!(last.items[2].id, contacts[22].id);
    assert!(!last.has_next());
    assert!(last.has_previous());
}

#[test]
fn list_accepts_last_keyword() {
    let (conn, _) = setup_with(11);
    let page = contact_queries::list_page(&conn, Some("last"), 10).unwrap();
    assert_eq!(page.number, 2);
    assert_eq!(page.items.len(), 1);
}

#[test]
fn list_rejects_out_of_range_pages() {
    let (conn, _) = setup_with(5);
    assert!(contact_queries::list_page(&conn, Some("2"), 10).unwrap_err().is_not_found());
    assert!(contact_queries::list_page(&conn, Some("abc"), 10).unwrap_err().is_not_found());
    assert!(contact_queries::list_page(&conn, Some("0"), 10).unwrap_err().is_not_found());
}

// ==========================================================================
// LOOKUP TESTS
// ==========================================================================

#[test]
fn contact_with_addresses_returns_children() {
    let (conn, contacts) = setup_with(2);
    let owner = &contacts[1];
    let address = Address::create(
        owner.id,
        AddressData {
            label: "Home".into(),
            line1: "1 Main Street".into(),
            line2: String::new(),
            city: "London".into(),
            country: "UK".into(),
        },
    );
    address_repo::insert(&conn, &address).unwrap();

    let (contact, addresses) = contact_queries::contact_with_addresses(&conn, owner.id)
        .unwrap()
        .unwrap();
    assert_eq!(contact.id, owner.id);
    assert_eq!(addresses, vec![address]);

    let (_, none) = contact_queries::contact_with_addresses(&conn, contacts[0].id)
        .unwrap()
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn lookups_of_unknown_contact_return_none() {
    let (conn, _) = setup_with(1);
    assert!(contact_queries::get_contact(&conn, Id::generate()).unwrap().is_none());
    assert!(contact_queries::contact_with_addresses(&conn, Id::generate())
        .unwrap()
        .is_none());
}

#[test]
fn find_by_email_trims_input() {
    let (conn, contacts) = setup_with(1);
    let found = contact_queries::find_by_email(&conn, "  person0@example.com ")
        .unwrap()
        .unwrap();
    assert_eq!(found.id, contacts[0].id);
}
