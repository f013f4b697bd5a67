#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use library_circulation::models::{BookInput, BorrowerInput};
use library_circulation::{Catalog, Circulation, FixedClock, Membership, Store};

pub fn date(s: &str) -> NaiveDate {
    s.parse().expect("valid test date")
}

/// A fresh library in its own temporary directory, with the clock pinned.
pub struct TestLibrary {
    _dir: tempfile::TempDir,
    pub store: Store,
    pub clock: Arc<FixedClock>,
    pub catalog: Catalog,
    pub membership: Membership,
    pub circulation: Circulation,
}

pub fn library_at(today: &str) -> TestLibrary {
    library_with_pool(today, 4)
}

pub fn library_with_pool(today: &str, pool_size: usize) -> TestLibrary {
    let dir = tempfile::TempDir::new().expect("create temp dir");
    let store = Store::open(&dir.path().join("library.sqlite"), pool_size).expect("open store");
    let clock = Arc::new(FixedClock::new(date(today)));

    TestLibrary {
        catalog: Catalog::new(store.clone()),
        membership: Membership::new(store.clone()),
        circulation: Circulation::new(store.clone(), clock.clone()),
        store,
        clock,
        _dir: dir,
    }
}

pub fn book_input(isbn: &str, total_copies: i32) -> BookInput {
    BookInput {
        title: "Effective Java".to_string(),
        author: "Joshua Bloch".to_string(),
        isbn: isbn.to_string(),
        category: "Programming".to_string(),
        total_copies,
        publisher: Some("Addison-Wesley".to_string()),
        publish_year: Some(2018),
        description: None,
        status: None,
    }
}

pub fn borrower_input(email: &str) -> BorrowerInput {
    BorrowerInput {
        name: "Ada Lovelace".to_string(),
        email: email.to_string(),
        phone: "5551234567".to_string(),
        membership_type: None,
        is_active: None,
    }
}

impl TestLibrary {
    /// Book with `copies` copies plus an active borrower, returning their ids.
    pub fn book_and_borrower(&self, isbn: &str, copies: i32, email: &str) -> (i64, i64) {
        let book = self
            .catalog
            .create_book(book_input(isbn, copies))
            .expect("create book");
        let borrower = self
            .membership
            .create_borrower(borrower_input(email))
            .expect("create borrower");
        (book.id, borrower.id)
    }
}
