use contacts::db::*;
use contacts::model::*;

fn setup() -> rusqlite::Connection {
    schema::test_connection()
}

fn insert_contact(conn: &rusqlite::Connection, first: &str, last: &str, email: &str) -> Contact {
    let contact = Contact::create(first.into(), last.into(), email.into());
    contact_repo::insert(conn, &contact).unwrap();
    contact
}

fn home(city: &str) -> AddressData {
    AddressData {
        label: "Home".into(),
        line1: "1 Main Street".into(),
        line2: String::new(),
        city: city.into(),
        country: "UK".into(),
    }
}

// ==========================================================================
// CONTACT REPO TESTS
// ==========================================================================

#[test]
fn insert_and_find_contact() {
    let conn = setup();
    let contact = insert_contact(&conn, "Ada", "Lovelace", "ada@example.com");

    let found = contact_repo::find_by_id(&conn, contact.id).unwrap().unwrap();
    assert_eq!(found.first_name, "Ada");
    assert_eq!(found.last_name, "Lovelace");
    assert_eq!(found.email, "ada@example.com");
    assert_eq!(found.avatar, None);
    assert_eq!(found.created_at, contact.created_at);
}

#[test]
fn find_missing_contact_returns_none() {
    let conn = setup();
    assert!(contact_repo::find_by_id(&conn, Id::generate()).unwrap().is_none());
}

#[test]
fn find_by_email_is_exact() {
    let conn = setup();
    let contact = insert_contact(&conn, "Ada", "Lovelace", "ada@example.com");

    let found = contact_repo::find_by_email(&conn, "ada@example.com").unwrap().unwrap();
    assert_eq!(found.id, contact.id);
    assert!(contact_repo::find_by_email(&conn, "grace@example.com").unwrap().is_none());
}

#[test]
fn duplicate_email_violates_unique_constraint() {
    let conn = setup();
    insert_contact(&conn, "Ada", "Lovelace", "ada@example.com");

    let twin = Contact::create("Augusta".into(), "King".into(), "ada@example.com".into());
    let err = contact_repo::insert(&conn, &twin).unwrap_err();
    match err {
        contacts::error::ContactsError::Database(ref e) => {
            assert!(is_unique_violation(e, "contacts", "email"));
        }
        other => panic!("expected database error, got {other:?}"),
    }
}

#[test]
fn update_contact_keeps_created_at() {
    let conn = setup();
    let mut contact = insert_contact(&conn, "Ada", "Lovelace", "ada@example.com");
    let created_at = contact.created_at;

    contact.last_name = "King".into();
    contact.avatar = Some("avatars/abc.png".into());
    contact.notes = "Analyst".into();
    contact_repo::update(&conn, &contact).unwrap();

    let found = contact_repo::find_by_id(&conn, contact.id).unwrap().unwrap();
    assert_eq!(found.last_name, "King");
    assert_eq!(found.avatar.as_deref(), Some("avatars/abc.png"));
    assert_eq!(found.notes, "Analyst");
    assert_eq!(found.created_at, created_at);
}

#[test]
fn delete_contact_reports_whether_removed() {
    let conn = setup();
    let contact = insert_contact(&conn, "Ada", "Lovelace", "ada@example.com");

    assert!(contact_repo::delete(&conn, contact.id).unwrap());
    assert!(!contact_repo::delete(&conn, contact.id).unwrap());
    assert_eq!(contact_repo::count(&conn).unwrap(), 0);
}

#[test]
fn find_page_orders_by_creation() {
    let conn = setup();
    let first = insert_contact(&conn, "Ada", "Lovelace", "ada@example.com");
    let second = insert_contact(&conn, "Grace", "Hopper", "grace@example.com");
    let third = insert_contact(&conn, "Linus", "Torvalds", "linus@example.com");

    assert_eq!(contact_repo::count(&conn).unwrap(), 3);

    let page = contact_repo::find_page(&conn, 2, 0).unwrap();
    let ids: Vec<_> = page.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    let rest = contact_repo::find_page(&conn, 2, 2).unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].id, third.id);
}

// ==========================================================================
// ADDRESS REPO TESTS
// ==========================================================================

#[test]
fn insert_and_list_addresses() {
    let conn = setup();
    let contact = insert_contact(&conn, "Ada", "Lovelace", "ada@example.com");

    let a = Address::create(contact.id, home("London"));
    let b = Address::create(contact.id, home("Paris"));
    address_repo::insert(&conn, &a).unwrap();
    address_repo::insert(&conn, &b).unwrap();

    let listed = address_repo::find_by_contact(&conn, contact.id).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].city, "London");
    assert_eq!(listed[1].city, "Paris");
    assert_eq!(address_repo::count_for_contact(&conn, contact.id).unwrap(), 2);
}

#[test]
fn address_requires_existing_contact() {
    let conn = setup();
    let orphan = Address::create(Id::generate(), home("Nowhere"));
    assert!(address_repo::insert(&conn, &orphan).is_err());
}

#[test]
fn update_address_scoped_to_owner() {
    let conn = setup();
    let ada = insert_contact(&conn, "Ada", "Lovelace", "ada@example.com");
    let grace = insert_contact(&conn, "Grace", "Hopper", "grace@example.com");
    let address = Address::create(ada.id, home("London"));
    address_repo::insert(&conn, &address).unwrap();

    assert!(!address_repo::update(&conn, grace.id, address.id, &home("Arlington")).unwrap());
    assert!(address_repo::update(&conn, ada.id, address.id, &home("Bath")).unwrap());

    let found = address_repo::find_by_id(&conn, address.id).unwrap().unwrap();
    assert_eq!(found.city, "Bath");
}

#[test]
fn delete_address_scoped_to_owner() {
    let conn = setup();
    let ada = insert_contact(&conn, "Ada", "Lovelace", "ada@example.com");
    let grace = insert_contact(&conn, "Grace", "Hopper", "grace@example.com");
    let address = Address::create(ada.id, home("London"));
    address_repo::insert(&conn, &address).unwrap();

    assert!(!address_repo::delete(&conn, grace.id, address.id).unwrap());
    assert!(address_repo::delete(&conn, ada.id, address.id).unwrap());
    assert!(address_repo::find_by_id(&conn, address.id).unwrap().is_none());
}

#[test]
fn deleting_contact_cascades_to_addresses() {
    let conn = setup();
    let contact = insert_contact(&conn, "Ada", "Lovelace", "ada@example.com");
    let address = Address::create(contact.id, home("London"));
    address_repo::insert(&conn, &address).unwrap();

    contact_repo::delete(&conn, contact.id).unwrap();

    assert!(address_repo::find_by_id(&conn, address.id).unwrap().is_none());
    assert_eq!(address_repo::count_for_contact(&conn, contact.id).unwrap(), 0);
}
