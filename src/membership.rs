//! Borrower lifecycle. Membership ids are generated here once and never
//! rewritten afterwards.

use rusqlite::Connection;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{self, Store};
use crate::error::{AppResult, LibraryError};
use crate::models::{Borrower, BorrowerFields, BorrowerId, BorrowerInput};

/// Attempts at drawing an unused membership id before giving up.
const MEMBERSHIP_ID_ATTEMPTS: usize = 8;

#[derive(Clone)]
pub struct Membership {
    store: Store,
}

impl Membership {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Register a borrower. New members are always active.
    pub fn create_borrower(&self, input: BorrowerInput) -> AppResult<Borrower> {
        let borrower = self.store.transaction(|tx| {
            if db::find_borrower_by_email(tx, &input.email)?.is_some() {
                return Err(duplicate_email(&input.email));
            }

            let fields = BorrowerFields {
                membership_type: input.membership_type.unwrap_or_default(),
                is_active: true,
                name: input.name,
                email: input.email,
                phone: input.phone,
            };
            let membership_id = unused_membership_id(tx)?;
            Ok(db::insert_borrower(tx, &fields, &membership_id)?)
        })?;

        info!(
            borrower_id = borrower.id,
            membership_id = %borrower.membership_id,
            "borrower created"
        );
        Ok(borrower)
    }

    /// Look up one borrower; `NotFound` when the id is unknown.
    pub fn get_borrower(&self, id: BorrowerId) -> AppResult<Borrower> {
        self.store.read(|conn| load_borrower(conn, id))
    }

    /// Every registered borrower, active or not.
    pub fn list_borrowers(&self) -> AppResult<Vec<Borrower>> {
        self.store.read(|conn| Ok(db::fetch_borrowers(conn)?))
    }

    /// Borrowers currently allowed to borrow.
    pub fn list_active_borrowers(&self) -> AppResult<Vec<Borrower>> {
        self.store.read(|conn| Ok(db::fetch_active_borrowers(conn)?))
    }

    /// Replace contact details. Membership type and activity only change when
    /// the input carries them.
    pub fn update_borrower(&self, id: BorrowerId, input: BorrowerInput) -> AppResult<Borrower> {
        let borrower = self.store.transaction(|tx| {
            let current = load_borrower(tx, id)?;

            if current.email != input.email && db::find_borrower_by_email(tx, &input.email)?.is_some()
            {
                return Err(duplicate_email(&input.email));
            }

            let fields = BorrowerFields {
                membership_type: input.membership_type.unwrap_or(current.membership_type),
                is_active: input.is_active.unwrap_or(current.is_active),
                name: input.name,
                email: input.email,
                phone: input.phone,
            };
            Ok(db::update_borrower(tx, id, &fields)?)
        })?;

        info!(borrower_id = borrower.id, "borrower updated");
        Ok(borrower)
    }

    /// Allow the borrower to borrow again. Activating an active borrower is a no-op.
    pub fn activate(&self, id: BorrowerId) -> AppResult<()> {
        self.set_active(id, true)
    }

    /// Stop the borrower from borrowing. Loans already out stay open.
    pub fn deactivate(&self, id: BorrowerId) -> AppResult<()> {
        self.set_active(id, false)
    }

    fn set_active(&self, id: BorrowerId, active: bool) -> AppResult<()> {
        self.store.transaction(|tx| {
            load_borrower(tx, id)?;
            Ok(db::set_borrower_active(tx, id, active)?)
        })?;

        info!(borrower_id = id, active, "borrower activity changed");
        Ok(())
    }

    /// Delete a borrower who holds no books.
    pub fn delete_borrower(&self, id: BorrowerId) -> AppResult<()> {
        self.store.transaction(|tx| {
            load_borrower(tx, id)?;
            let holding = db::count_active_borrows(tx, id)?;
            if holding > 0 {
                return Err(LibraryError::Conflict(format!(
                    "Borrower {id} still holds {holding} borrowed books"
                )));
            }
            Ok(db::delete_borrower(tx, id)?)
        })?;

        info!(borrower_id = id, "borrower deleted");
        Ok(())
    }
}

fn load_borrower(conn: &Connection, id: BorrowerId) -> AppResult<Borrower> {
    db::find_borrower(conn, id)?
        .ok_or_else(|| LibraryError::NotFound(format!("Borrower not found with id: {id}")))
}

fn duplicate_email(email: &str) -> LibraryError {
    LibraryError::Duplicate(format!("Borrower with email {email} already exists"))
}

/// `MEM-` plus the first eight hex digits of a random v4 UUID. Those digits
/// sit before the version nibble, so all 32 bits are random.
pub fn generate_membership_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("MEM-{}", hex[..8].to_uppercase())
}

fn unused_membership_id(conn: &Connection) -> AppResult<String> {
    for _ in 0..MEMBERSHIP_ID_ATTEMPTS {
        let candidate = generate_membership_id();
        if db::find_borrower_by_membership_id(conn, &candidate)?.is_none() {
            return Ok(candidate);
        }
        warn!(membership_id = %candidate, "membership id collision, drawing again");
    }
    Err(LibraryError::Unexpected(anyhow::anyhow!(
        "could not allocate an unused membership id"
    )))
}

#[cfg(test)]
mod tests {
    use super::generate_membership_id;

    #[test]
    fn membership_ids_are_prefixed_uppercase_hex() {
        for _ in 0..64 {
            let id = generate_membership_id();
            assert_eq!(id.len(), 12);
            let (prefix, hex) = id.split_at(4);
            assert_eq!(prefix, "MEM-");
            assert!(hex
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        }
    }

    #[test]
    fn membership_ids_vary() {
        assert_ne!(generate_membership_id(), generate_membership_id());
    }
}
