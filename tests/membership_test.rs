mod common;

use common::{borrower_input, library_at};
use library_circulation::{LibraryError, MembershipType};
use pretty_assertions::assert_eq;

#[test]
fn new_borrowers_get_a_membership_id_and_defaults() {
    let lib = library_at("2024-06-01");
    let borrower = lib
        .membership
        .create_borrower(borrower_input("a@example.com"))
        .unwrap();

    assert!(borrower.membership_id.starts_with("MEM-"));
    assert_eq!(borrower.membership_id.len(), 12);
    assert_eq!(borrower.membership_type, MembershipType::Regular);
    assert!(borrower.is_active);
    assert_eq!(lib.membership.get_borrower(borrower.id).unwrap(), borrower);
}

#[test]
fn new_borrowers_start_active_even_if_asked_otherwise() {
    let lib = library_at("2024-06-01");
    let mut input = borrower_input("a@example.com");
    input.is_active = Some(false);
    input.membership_type = Some(MembershipType::Premium);

    let borrower = lib.membership.create_borrower(input).unwrap();
    assert!(borrower.is_active);
    assert_eq!(borrower.membership_type, MembershipType::Premium);
}

#[test]
fn duplicate_email_is_rejected() {
    let lib = library_at("2024-06-01");
    lib.membership
        .create_borrower(borrower_input("a@example.com"))
        .unwrap();

    let err = lib
        .membership
        .create_borrower(borrower_input("a@example.com"))
        .unwrap_err();
    assert!(matches!(err, LibraryError::Duplicate(_)));
}

#[test]
fn membership_ids_are_distinct() {
    let lib = library_at("2024-06-01");
    let ids: std::collections::HashSet<String> = (0..20)
        .map(|i| {
            lib.membership
                .create_borrower(borrower_input(&format!("reader{i}@example.com")))
                .unwrap()
                .membership_id
        })
        .collect();
    assert_eq!(ids.len(), 20);
}

#[test]
fn update_keeps_membership_id_and_rechecks_email() {
    let lib = library_at("2024-06-01");
    let ada = lib
        .membership
        .create_borrower(borrower_input("ada@example.com"))
        .unwrap();
    lib.membership
        .create_borrower(borrower_input("grace@example.com"))
        .unwrap();

    let err = lib
        .membership
        .update_borrower(ada.id, borrower_input("grace@example.com"))
        .unwrap_err();
    assert!(matches!(err, LibraryError::Duplicate(_)));

    let mut input = borrower_input("ada@example.org");
    input.name = "Augusta Ada King".to_string();
    input.membership_type = Some(MembershipType::Student);
    let updated = lib.membership.update_borrower(ada.id, input).unwrap();

    assert_eq!(updated.membership_id, ada.membership_id);
    assert_eq!(updated.name, "Augusta Ada King");
    assert_eq!(updated.email, "ada@example.org");
    assert_eq!(updated.membership_type, MembershipType::Student);
    assert!(updated.is_active);
}

#[test]
fn activation_flips_are_idempotent_and_reversible() {
    let lib = library_at("2024-06-01");
    let borrower = lib
        .membership
        .create_borrower(borrower_input("a@example.com"))
        .unwrap();

    lib.membership.deactivate(borrower.id).unwrap();
    lib.membership.deactivate(borrower.id).unwrap();
    assert!(!lib.membership.get_borrower(borrower.id).unwrap().is_active);
    assert!(lib.membership.list_active_borrowers().unwrap().is_empty());
    assert_eq!(lib.membership.list_borrowers().unwrap().len(), 1);

    lib.membership.activate(borrower.id).unwrap();
    let restored = lib.membership.get_borrower(borrower.id).unwrap();
    assert!(restored.is_active);
    assert_eq!(restored.membership_id, borrower.membership_id);
    assert_eq!(lib.membership.list_active_borrowers().unwrap().len(), 1);

    assert!(matches!(
        lib.membership.activate(404),
        Err(LibraryError::NotFound(_))
    ));
}

#[test]
fn borrowers_holding_books_cannot_be_deleted() {
    let lib = library_at("2024-06-01");
    let (book_id, borrower_id) = lib.book_and_borrower("9780134685991", 1, "a@example.com");
    let record = lib.circulation.borrow(book_id, borrower_id, 14).unwrap();

    assert!(matches!(
        lib.membership.delete_borrower(borrower_id),
        Err(LibraryError::Conflict(_))
    ));

    lib.circulation.return_book(record.id, None).unwrap();
    lib.membership.delete_borrower(borrower_id).unwrap();
    assert!(matches!(
        lib.membership.get_borrower(borrower_id),
        Err(LibraryError::NotFound(_))
    ));
    assert!(lib
        .circulation
        .records_for_borrower(borrower_id)
        .unwrap()
        .is_empty());
}
