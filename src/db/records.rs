use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Params, Row};

use crate::error::LibraryError;
use crate::models::{BookId, BorrowRecord, BorrowStatus, BorrowerId, NewBorrowRecord, RecordId};

/// Record columns joined with the book title and borrower name for display.
const RECORD_SELECT: &str = "SELECT r.id, r.book_id, r.borrower_id, b.title, m.name,
        r.borrow_date, r.due_date, r.return_date, r.status, r.fine_amount, r.notes,
        r.created_at, r.updated_at
     FROM borrow_records r
     INNER JOIN books b ON b.id = r.book_id
     INNER JOIN borrowers m ON m.id = r.borrower_id";

fn not_found(id: RecordId) -> anyhow::Error {
    LibraryError::NotFound(format!("Borrow record not found with id: {id}")).into()
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<BorrowRecord> {
    Ok(BorrowRecord {
        id: row.get(0)?,
        book_id: row.get(1)?,
        borrower_id: row.get(2)?,
        book_title: row.get(3)?,
        borrower_name: row.get(4)?,
        borrow_date: row.get(5)?,
        due_date: row.get(6)?,
        return_date: row.get(7)?,
        status: row.get(8)?,
        fine_amount: row.get(9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn query_records<P: Params>(conn: &Connection, filter: &str, params: P) -> Result<Vec<BorrowRecord>> {
    let sql = format!("{RECORD_SELECT} {filter}");
    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare borrow record query")?;

    let records = stmt
        .query_map(params, record_from_row)
        .context("failed to load borrow records")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect borrow records")?;

    Ok(records)
}

/// Insert a fresh loan in `BORROWED` state with no fine.
pub fn insert_record(conn: &Connection, record: &NewBorrowRecord) -> Result<BorrowRecord> {
    conn.execute(
        "INSERT INTO borrow_records (book_id, borrower_id, borrow_date, due_date, status, fine_amount)
         VALUES (?1, ?2, ?3, ?4, ?5, 0.0)",
        params![
            record.book_id,
            record.borrower_id,
            record.borrow_date,
            record.due_date,
            BorrowStatus::Borrowed,
        ],
    )
    .context("failed to insert borrow record")?;

    let id = conn.last_insert_rowid();
    find_record(conn, id)?.ok_or_else(|| anyhow!("borrow record {id} vanished after insert"))
}

/// Fetch one borrow record joined with its book title and borrower name.
pub fn find_record(conn: &Connection, id: RecordId) -> Result<Option<BorrowRecord>> {
    conn.query_row(&format!("{RECORD_SELECT} WHERE r.id = ?1"), [id], record_from_row)
        .optional()
        .context("failed to load borrow record")
}

/// Every record of one borrower, oldest first.
pub fn find_records_by_borrower(
    conn: &Connection,
    borrower_id: BorrowerId,
) -> Result<Vec<BorrowRecord>> {
    query_records(conn, "WHERE r.borrower_id = ?1 ORDER BY r.id", [borrower_id])
}

/// Every record of one book, oldest first.
pub fn find_records_by_book(conn: &Connection, book_id: BookId) -> Result<Vec<BorrowRecord>> {
    query_records(conn, "WHERE r.book_id = ?1 ORDER BY r.id", [book_id])
}

/// Every record currently in `status`, oldest first.
pub fn find_records_by_status(
    conn: &Connection,
    status: BorrowStatus,
) -> Result<Vec<BorrowRecord>> {
    query_records(conn, "WHERE r.status = ?1 ORDER BY r.id", [status])
}

/// Loans still in `BORROWED` whose due date lies strictly before `as_of`.
pub fn find_overdue_records(conn: &Connection, as_of: NaiveDate) -> Result<Vec<BorrowRecord>> {
    query_records(
        conn,
        "WHERE r.status = ?1 AND r.due_date < ?2 ORDER BY r.id",
        params![BorrowStatus::Borrowed, as_of],
    )
}

/// Number of loans a borrower currently holds, overdue ones included.
pub fn count_active_borrows(conn: &Connection, borrower_id: BorrowerId) -> Result<u32> {
    conn.query_row(
        "SELECT COUNT(*) FROM borrow_records
         WHERE borrower_id = ?1 AND status IN (?2, ?3)",
        params![borrower_id, BorrowStatus::Borrowed, BorrowStatus::Overdue],
        |row| row.get(0),
    )
    .context("failed to count active borrows")
}

/// Number of copies of a book that are out on loan right now.
pub fn count_active_records_for_book(conn: &Connection, book_id: BookId) -> Result<u32> {
    conn.query_row(
        "SELECT COUNT(*) FROM borrow_records
         WHERE book_id = ?1 AND status IN (?2, ?3)",
        params![book_id, BorrowStatus::Borrowed, BorrowStatus::Overdue],
        |row| row.get(0),
    )
    .context("failed to count active records for book")
}

/// Move a record to `status` without touching dates or fines.
pub fn set_record_status(conn: &Connection, id: RecordId, status: BorrowStatus) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE borrow_records SET status = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![status, id],
        )
        .context("failed to update borrow record status")?;

    if updated == 0 {
        Err(not_found(id))
    } else {
        Ok(())
    }
}

/// Move a loan into a terminal state. `notes` replaces the stored notes only
/// when supplied.
pub fn close_record(
    conn: &Connection,
    id: RecordId,
    status: BorrowStatus,
    return_date: NaiveDate,
    fine_amount: f64,
    notes: Option<&str>,
) -> Result<BorrowRecord> {
    let updated = conn
        .execute(
            "UPDATE borrow_records
             SET status = ?1, return_date = ?2, fine_amount = ?3, notes = COALESCE(?4, notes),
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?5",
            params![status, return_date, fine_amount, notes, id],
        )
        .context("failed to close borrow record")?;

    if updated == 0 {
        return Err(not_found(id));
    }
    find_record(conn, id)?.ok_or_else(|| anyhow!("borrow record {id} vanished after update"))
}
