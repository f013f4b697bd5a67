//! Book lifecycle: creation, edits with copy-count reconciliation, deletion,
//! search and the copy bookkeeping circulation relies on.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::{self, Store};
use crate::error::{AppResult, LibraryError};
use crate::models::{Book, BookFields, BookId, BookInput, BookStatus};

#[derive(Clone)]
pub struct Catalog {
    store: Store,
}

impl Catalog {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Register a new title with every copy on the shelf.
    pub fn create_book(&self, input: BookInput) -> AppResult<Book> {
        let book = self.store.transaction(|tx| {
            if db::find_book_by_isbn(tx, &input.isbn)?.is_some() {
                return Err(duplicate_isbn(&input.isbn));
            }

            let fields = BookFields {
                available_copies: input.total_copies,
                status: BookStatus::Available,
                title: input.title,
                author: input.author,
                isbn: input.isbn,
                category: input.category,
                total_copies: input.total_copies,
                publisher: input.publisher,
                publish_year: input.publish_year,
                description: input.description,
            };
            Ok(db::insert_book(tx, &fields)?)
        })?;

        info!(book_id = book.id, isbn = %book.isbn, copies = book.total_copies, "book created");
        Ok(book)
    }

    /// Look up one book; `NotFound` when the id is unknown.
    pub fn get_book(&self, id: BookId) -> AppResult<Book> {
        self.store.read(|conn| load_book(conn, id))
    }

    /// Every catalogued book, in id order.
    pub fn list_books(&self) -> AppResult<Vec<Book>> {
        self.store.read(|conn| Ok(db::fetch_books(conn)?))
    }

    /// Replace a book's attributes. Changing `total_copies` shifts the
    /// available count by the same delta, which must not leave it negative.
    ///
    /// `input.status` only matters for the maintenance override: requesting
    /// `MAINTENANCE` sets it, any other status clears it, and `None` keeps
    /// whatever the book had. Otherwise the status follows the copy count.
    pub fn update_book(&self, id: BookId, input: BookInput) -> AppResult<Book> {
        let book = self.store.transaction(|tx| {
            let current = load_book(tx, id)?;

            if current.isbn != input.isbn && db::find_book_by_isbn(tx, &input.isbn)?.is_some() {
                return Err(duplicate_isbn(&input.isbn));
            }

            let delta = input.total_copies - current.total_copies;
            let available_copies = current.available_copies + delta;
            if available_copies < 0 {
                let on_loan = current.total_copies - current.available_copies;
                return Err(LibraryError::InvalidOperation(format!(
                    "Cannot reduce total copies to {} while {on_loan} copies are on loan",
                    input.total_copies
                )));
            }

            let base = match input.status {
                Some(BookStatus::Maintenance) => BookStatus::Maintenance,
                Some(_) => BookStatus::Available,
                None => current.status,
            };

            let fields = BookFields {
                available_copies,
                status: base.derive(available_copies),
                title: input.title,
                author: input.author,
                isbn: input.isbn,
                category: input.category,
                total_copies: input.total_copies,
                publisher: input.publisher,
                publish_year: input.publish_year,
                description: input.description,
            };
            Ok(db::update_book(tx, id, &fields)?)
        })?;

        info!(
            book_id = book.id,
            total = book.total_copies,
            available = book.available_copies,
            status = %book.status,
            "book updated"
        );
        Ok(book)
    }

    /// Delete a book that has no copy out on loan.
    pub fn delete_book(&self, id: BookId) -> AppResult<()> {
        self.store.transaction(|tx| {
            load_book(tx, id)?;
            let on_loan = db::count_active_records_for_book(tx, id)?;
            if on_loan > 0 {
                return Err(LibraryError::Conflict(format!(
                    "Book {id} has {on_loan} active borrow records"
                )));
            }
            Ok(db::delete_book(tx, id)?)
        })?;

        info!(book_id = id, "book deleted");
        Ok(())
    }

    /// Case-insensitive substring match on the title.
    pub fn search_by_title(&self, title: &str) -> AppResult<Vec<Book>> {
        debug!(title, "searching books by title");
        self.store
            .read(|conn| Ok(db::find_books_by_title_like(conn, title)?))
    }

    /// Case-insensitive substring match on the author.
    pub fn search_by_author(&self, author: &str) -> AppResult<Vec<Book>> {
        debug!(author, "searching books by author");
        self.store
            .read(|conn| Ok(db::find_books_by_author_like(conn, author)?))
    }

    /// Exact category match. Category names are compared as stored.
    pub fn search_by_category(&self, category: &str) -> AppResult<Vec<Book>> {
        debug!(category, "listing books by category");
        self.store
            .read(|conn| Ok(db::find_books_by_category(conn, category)?))
    }

    /// Books with fewer than a fifth of their copies still on the shelf.
    pub fn low_stock(&self) -> AppResult<Vec<Book>> {
        self.store.read(|conn| Ok(db::find_low_stock_books(conn)?))
    }
}

fn load_book(conn: &Connection, id: BookId) -> AppResult<Book> {
    db::find_book(conn, id)?
        .ok_or_else(|| LibraryError::NotFound(format!("Book not found with id: {id}")))
}

fn duplicate_isbn(isbn: &str) -> LibraryError {
    LibraryError::Duplicate(format!("Book with ISBN {isbn} already exists"))
}

/// Take one copy off the shelf. Runs inside the caller's transaction.
pub(crate) fn decrement_available(conn: &Connection, id: BookId) -> AppResult<Book> {
    let book = load_book(conn, id)?;
    if book.available_copies < 1 {
        return Err(LibraryError::BookNotAvailable(format!(
            "Book {id} is currently not available"
        )));
    }

    let available = book.available_copies - 1;
    Ok(db::update_book_copies(
        conn,
        id,
        available,
        book.status.derive(available),
    )?)
}

/// Put one copy back on the shelf, never beyond `total_copies`. Runs inside
/// the caller's transaction.
pub(crate) fn increment_available(conn: &Connection, id: BookId) -> AppResult<Book> {
    let book = load_book(conn, id)?;
    let available = (book.available_copies + 1).min(book.total_copies);
    Ok(db::update_book_copies(
        conn,
        id,
        available,
        book.status.derive(available),
    )?)
}
