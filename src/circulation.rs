//! The borrow/return state machine.
//!
//! ```text
//!   borrow ──> BORROWED ──return──> RETURNED
//!                 │  │                  ^
//!       sweep     │  └──mark-lost──┐    │
//!                 v                v    │
//!              OVERDUE ──mark-lost──> LOST
//!                 └────return (fined)───┘
//! ```
//!
//! Every operation that writes runs in one store transaction covering the
//! eligibility reads, the record write and the copy-count update, so two
//! borrowers racing for the last copy cannot both win.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::catalog;
use crate::clock::Clock;
use crate::db::{self, Store};
use crate::error::{AppResult, LibraryError};
use crate::models::{BookId, BorrowRecord, BorrowStatus, BorrowerId, NewBorrowRecord, RecordId};

/// Loans a borrower may hold at once, overdue ones included.
pub const MAX_ACTIVE_BORROWS: u32 = 5;
/// Loan length used when a request does not name one.
pub const DEFAULT_BORROW_DAYS: u32 = 14;
/// Shortest loan, in days.
pub const MIN_BORROW_DAYS: u32 = 1;
/// Longest loan, in days.
pub const MAX_BORROW_DAYS: u32 = 90;
/// Charged per calendar day a book comes back after its due date.
pub const FINE_PER_DAY: f64 = 2.0;
/// Flat charge for a book reported lost.
pub const LOST_BOOK_FINE: f64 = 100.0;

/// Fine owed for returning on `returned` a book due on `due`.
pub fn late_fine(due: NaiveDate, returned: NaiveDate) -> f64 {
    let days_late = (returned - due).num_days();
    if days_late > 0 {
        days_late as f64 * FINE_PER_DAY
    } else {
        0.0
    }
}

#[derive(Clone)]
pub struct Circulation {
    store: Store,
    clock: Arc<dyn Clock>,
}

impl Circulation {
    pub fn new(store: Store, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Lend one copy of `book_id` to `borrower_id` for `borrow_days` days.
    pub fn borrow(
        &self,
        book_id: BookId,
        borrower_id: BorrowerId,
        borrow_days: u32,
    ) -> AppResult<BorrowRecord> {
        if !(MIN_BORROW_DAYS..=MAX_BORROW_DAYS).contains(&borrow_days) {
            return Err(LibraryError::Validation(format!(
                "Borrow days must be between {MIN_BORROW_DAYS} and {MAX_BORROW_DAYS}"
            )));
        }

        let result = self.store.transaction(|tx| {
            let book = db::find_book(tx, book_id)?.ok_or_else(|| {
                LibraryError::NotFound(format!("Book not found with id: {book_id}"))
            })?;
            let borrower = db::find_borrower(tx, borrower_id)?.ok_or_else(|| {
                LibraryError::NotFound(format!("Borrower not found with id: {borrower_id}"))
            })?;

            if !borrower.is_active {
                return Err(LibraryError::BorrowerNotActive(
                    "Borrower account is not active".to_string(),
                ));
            }
            if book.available_copies <= 0 {
                return Err(LibraryError::BookNotAvailable(
                    "Book is currently not available".to_string(),
                ));
            }
            let active = db::count_active_borrows(tx, borrower_id)?;
            if active >= MAX_ACTIVE_BORROWS {
                return Err(LibraryError::InvalidOperation(format!(
                    "Borrower has reached maximum borrow limit of {MAX_ACTIVE_BORROWS} books"
                )));
            }

            let borrow_date = self.clock.today();
            let due_date = borrow_date
                .checked_add_days(Days::new(u64::from(borrow_days)))
                .ok_or_else(|| LibraryError::Validation("Due date is out of range".to_string()))?;

            let record = db::insert_record(
                tx,
                &NewBorrowRecord {
                    book_id,
                    borrower_id,
                    borrow_date,
                    due_date,
                },
            )?;
            catalog::decrement_available(tx, book_id)?;
            Ok(record)
        });

        match &result {
            Ok(record) => info!(
                record_id = record.id,
                book_id,
                borrower_id,
                due_date = %record.due_date,
                "book borrowed"
            ),
            Err(err) => warn!(book_id, borrower_id, error = %err, "borrow rejected"),
        }
        result
    }

    /// Close a loan, charging for every day past the due date.
    pub fn return_book(&self, record_id: RecordId, notes: Option<String>) -> AppResult<BorrowRecord> {
        let record = self.store.transaction(|tx| {
            let record = load_record(tx, record_id)?;
            if !record.status.is_active() {
                return Err(LibraryError::InvalidOperation(
                    "Book has already been returned or marked as lost".to_string(),
                ));
            }

            let return_date = self.clock.today();
            let fine = late_fine(record.due_date, return_date);
            let updated = db::close_record(
                tx,
                record_id,
                BorrowStatus::Returned,
                return_date,
                fine,
                notes.as_deref(),
            )?;
            catalog::increment_available(tx, record.book_id)?;
            Ok(updated)
        })?;

        info!(
            record_id,
            book_id = record.book_id,
            fine = record.fine_amount,
            "book returned"
        );
        Ok(record)
    }

    /// Write off a loaned copy. The copy does not return to the shelf.
    pub fn mark_as_lost(&self, record_id: RecordId) -> AppResult<BorrowRecord> {
        let record = self.store.transaction(|tx| {
            let record = load_record(tx, record_id)?;
            match record.status {
                BorrowStatus::Returned => {
                    return Err(LibraryError::InvalidOperation(
                        "Cannot mark returned book as lost".to_string(),
                    ))
                }
                BorrowStatus::Lost => {
                    return Err(LibraryError::InvalidOperation(
                        "Book is already marked as lost".to_string(),
                    ))
                }
                BorrowStatus::Borrowed | BorrowStatus::Overdue => {}
            }

            Ok(db::close_record(
                tx,
                record_id,
                BorrowStatus::Lost,
                self.clock.today(),
                LOST_BOOK_FINE,
                None,
            )?)
        })?;

        info!(record_id, book_id = record.book_id, "book marked as lost");
        Ok(record)
    }

    /// Flag every borrowed loan past its due date as `OVERDUE` and return all
    /// overdue loans. Running it again without the date changing finds nothing
    /// new to flag and returns the same set.
    pub fn list_overdue(&self) -> AppResult<Vec<BorrowRecord>> {
        let today = self.clock.today();
        let (flagged, overdue) = self.store.transaction(|tx| {
            let due = db::find_overdue_records(tx, today)?;
            for record in &due {
                db::set_record_status(tx, record.id, BorrowStatus::Overdue)?;
            }
            Ok((due.len(), db::find_records_by_status(tx, BorrowStatus::Overdue)?))
        })?;

        if flagged > 0 {
            info!(flagged, %today, "overdue sweep flagged loans");
        } else {
            debug!(%today, "overdue sweep found nothing new");
        }
        Ok(overdue)
    }

    /// Loans in `BORROWED` state, as of the last sweep.
    pub fn list_active(&self) -> AppResult<Vec<BorrowRecord>> {
        self.store
            .read(|conn| Ok(db::find_records_by_status(conn, BorrowStatus::Borrowed)?))
    }

    /// Full loan history of one borrower, closed loans included.
    pub fn records_for_borrower(&self, borrower_id: BorrowerId) -> AppResult<Vec<BorrowRecord>> {
        self.store
            .read(|conn| Ok(db::find_records_by_borrower(conn, borrower_id)?))
    }

    /// Full loan history of one book, closed loans included.
    pub fn records_for_book(&self, book_id: BookId) -> AppResult<Vec<BorrowRecord>> {
        self.store
            .read(|conn| Ok(db::find_records_by_book(conn, book_id)?))
    }

    /// Look up one loan; `NotFound` when the id is unknown.
    pub fn get_record(&self, record_id: RecordId) -> AppResult<BorrowRecord> {
        self.store.read(|conn| load_record(conn, record_id))
    }
}

fn load_record(conn: &Connection, id: RecordId) -> AppResult<BorrowRecord> {
    db::find_record(conn, id)?
        .ok_or_else(|| LibraryError::NotFound(format!("Borrow record not found with id: {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn no_fine_on_or_before_due_date() {
        assert_eq!(late_fine(date(2024, 6, 15), date(2024, 6, 10)), 0.0);
        assert_eq!(late_fine(date(2024, 6, 15), date(2024, 6, 15)), 0.0);
    }

    #[test]
    fn fine_is_two_per_calendar_day_late() {
        assert_eq!(late_fine(date(2024, 6, 15), date(2024, 6, 16)), 2.0);
        assert_eq!(late_fine(date(2024, 6, 15), date(2024, 6, 20)), 10.0);
        assert_eq!(late_fine(date(2024, 12, 30), date(2025, 1, 2)), 6.0);
    }
}
