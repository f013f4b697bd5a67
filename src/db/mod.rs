//! Persistence module split across logical submodules: one per table, plus
//! the connection pool and schema in `connection`.

mod books;
mod borrowers;
mod connection;
mod records;

pub use books::{
    delete_book, fetch_books, find_book, find_book_by_isbn, find_books_by_author_like,
    find_books_by_category, find_books_by_title_like, find_low_stock_books, insert_book,
    update_book, update_book_copies,
};
pub use borrowers::{
    delete_borrower, fetch_active_borrowers, fetch_borrowers, find_borrower,
    find_borrower_by_email, find_borrower_by_membership_id, insert_borrower, set_borrower_active,
    update_borrower,
};
pub use connection::{default_db_path, ensure_schema, Store};
pub use records::{
    close_record, count_active_borrows, count_active_records_for_book, find_overdue_records,
    find_record, find_records_by_book, find_records_by_borrower, find_records_by_status,
    insert_record, set_record_status,
};

use anyhow::anyhow;
use rusqlite::{Error as SqlError, ErrorCode};

use crate::error::LibraryError;

/// Turn a unique-index violation into a duplicate-resource error carrying
/// `message`; every other SQLite failure stays unexpected with `context`.
fn map_unique_violation(err: SqlError, message: String, context: &'static str) -> anyhow::Error {
    let is_unique = matches!(
        &err,
        SqlError::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    );
    if is_unique {
        LibraryError::Duplicate(message).into()
    } else {
        anyhow!(err).context(context)
    }
}

/// Escape `%`, `_` and the escape character itself so user text is matched
/// literally inside a `LIKE ... ESCAPE '\'` pattern.
fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for ch in fragment.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
