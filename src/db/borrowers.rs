use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::map_unique_violation;
use crate::error::LibraryError;
use crate::models::{Borrower, BorrowerFields, BorrowerId};

const BORROWER_COLUMNS: &str =
    "id, name, email, phone, membership_id, membership_type, is_active, created_at, updated_at";

fn not_found(id: BorrowerId) -> anyhow::Error {
    LibraryError::NotFound(format!("Borrower not found with id: {id}")).into()
}

fn borrower_from_row(row: &Row<'_>) -> rusqlite::Result<Borrower> {
    Ok(Borrower {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        membership_id: row.get(4)?,
        membership_type: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Both unique indexes on this table can trip on insert; name the one that did.
fn duplicate_message(err: &rusqlite::Error, borrower: &BorrowerFields, membership_id: &str) -> String {
    if err.to_string().contains("membership_id") {
        format!("Membership id {membership_id} already exists")
    } else {
        format!("Borrower with email {} already exists", borrower.email)
    }
}

/// Insert a borrower under a pre-generated membership id.
pub fn insert_borrower(
    conn: &Connection,
    borrower: &BorrowerFields,
    membership_id: &str,
) -> Result<Borrower> {
    conn.execute(
        "INSERT INTO borrowers (name, email, phone, membership_id, membership_type, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            borrower.name,
            borrower.email,
            borrower.phone,
            membership_id,
            borrower.membership_type,
            borrower.is_active,
        ],
    )
    .map_err(|err| {
        let message = duplicate_message(&err, borrower, membership_id);
        map_unique_violation(err, message, "failed to insert borrower")
    })?;

    let id = conn.last_insert_rowid();
    find_borrower(conn, id)?.ok_or_else(|| anyhow!("borrower {id} vanished after insert"))
}

/// Fetch a single borrower by id, `None` when it does not exist.
pub fn find_borrower(conn: &Connection, id: BorrowerId) -> Result<Option<Borrower>> {
    conn.query_row(
        &format!("SELECT {BORROWER_COLUMNS} FROM borrowers WHERE id = ?1"),
        [id],
        borrower_from_row,
    )
    .optional()
    .context("failed to load borrower")
}

/// Fetch the borrower registered under `email`.
pub fn find_borrower_by_email(conn: &Connection, email: &str) -> Result<Option<Borrower>> {
    conn.query_row(
        &format!("SELECT {BORROWER_COLUMNS} FROM borrowers WHERE email = ?1"),
        [email],
        borrower_from_row,
    )
    .optional()
    .context("failed to load borrower by email")
}

/// Fetch the borrower holding `membership_id`. Used to keep generated ids unique.
pub fn find_borrower_by_membership_id(
    conn: &Connection,
    membership_id: &str,
) -> Result<Option<Borrower>> {
    conn.query_row(
        &format!("SELECT {BORROWER_COLUMNS} FROM borrowers WHERE membership_id = ?1"),
        [membership_id],
        borrower_from_row,
    )
    .optional()
    .context("failed to load borrower by membership id")
}

/// Fetch every borrower ordered by id.
pub fn fetch_borrowers(conn: &Connection) -> Result<Vec<Borrower>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {BORROWER_COLUMNS} FROM borrowers ORDER BY id"))
        .context("failed to prepare borrower query")?;

    let borrowers = stmt
        .query_map([], borrower_from_row)
        .context("failed to load borrowers")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect borrowers")?;

    Ok(borrowers)
}

/// Fetch only the borrowers whose account is active.
pub fn fetch_active_borrowers(conn: &Connection) -> Result<Vec<Borrower>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {BORROWER_COLUMNS} FROM borrowers WHERE is_active = 1 ORDER BY id"
        ))
        .context("failed to prepare active borrower query")?;

    let borrowers = stmt
        .query_map([], borrower_from_row)
        .context("failed to load active borrowers")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect active borrowers")?;

    Ok(borrowers)
}

/// Overwrite the mutable borrower columns. The membership id is never touched.
pub fn update_borrower(
    conn: &Connection,
    id: BorrowerId,
    borrower: &BorrowerFields,
) -> Result<Borrower> {
    let updated = conn
        .execute(
            "UPDATE borrowers
             SET name = ?1, email = ?2, phone = ?3, membership_type = ?4, is_active = ?5,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?6",
            params![
                borrower.name,
                borrower.email,
                borrower.phone,
                borrower.membership_type,
                borrower.is_active,
                id,
            ],
        )
        .map_err(|err| {
            map_unique_violation(
                err,
                format!("Borrower with email {} already exists", borrower.email),
                "failed to update borrower",
            )
        })?;

    if updated == 0 {
        return Err(not_found(id));
    }
    find_borrower(conn, id)?.ok_or_else(|| anyhow!("borrower {id} vanished after update"))
}

/// Flip the active flag. Setting the current value again still succeeds.
pub fn set_borrower_active(conn: &Connection, id: BorrowerId, active: bool) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE borrowers SET is_active = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![active, id],
        )
        .context("failed to update borrower activity")?;

    if updated == 0 {
        Err(not_found(id))
    } else {
        Ok(())
    }
}

/// Remove a borrower row. Historical borrow records cascade with it.
pub fn delete_borrower(conn: &Connection, id: BorrowerId) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM borrowers WHERE id = ?1", params![id])
        .context("failed to delete borrower")?;

    if deleted == 0 {
        Err(not_found(id))
    } else {
        Ok(())
    }
}
