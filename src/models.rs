//! Value records that mirror the SQLite schema. Relationships are plain foreign
//! key ids; nothing here holds a reference to another entity, so the types can
//! be cloned, serialized and sent across threads freely.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Row id of a book.
pub type BookId = i64;
/// Row id of a borrower.
pub type BorrowerId = i64;
/// Row id of a borrow record.
pub type RecordId = i64;

/// Implements the text encoding shared by every status-like enum: the stored
/// and displayed form is the enumerator name in upper snake case.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} `{other}`", stringify!($name))),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(self.as_str().into())
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|err: String| FromSqlError::Other(err.into()))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatus {
    Available,
    OutOfStock,
    /// Manual operator override. Circulation never sets or clears it.
    Maintenance,
}

text_enum!(BookStatus {
    Available => "AVAILABLE",
    OutOfStock => "OUT_OF_STOCK",
    Maintenance => "MAINTENANCE",
});

impl BookStatus {
    /// Status a book should carry once its available count becomes
    /// `available`. Maintenance sticks; otherwise zero copies means out of stock.
    pub fn derive(self, available: i32) -> BookStatus {
        match self {
            BookStatus::Maintenance => BookStatus::Maintenance,
            _ if available <= 0 => BookStatus::OutOfStock,
            _ => BookStatus::Available,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipType {
    #[default]
    Regular,
    Premium,
    Student,
}

text_enum!(MembershipType {
    Regular => "REGULAR",
    Premium => "PREMIUM",
    Student => "STUDENT",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorrowStatus {
    Borrowed,
    Returned,
    Overdue,
    Lost,
}

text_enum!(BorrowStatus {
    Borrowed => "BORROWED",
    Returned => "RETURNED",
    Overdue => "OVERDUE",
    Lost => "LOST",
});

impl BorrowStatus {
    /// Borrowed and overdue loans both still hold a physical copy.
    pub fn is_active(self) -> bool {
        matches!(self, BorrowStatus::Borrowed | BorrowStatus::Overdue)
    }
}

/// A catalogued title and its copy accounting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// Unique across the catalog.
    pub isbn: String,
    pub category: String,
    pub total_copies: i32,
    /// Always within `0..=total_copies`.
    pub available_copies: i32,
    pub publisher: Option<String>,
    pub publish_year: Option<i32>,
    pub description: Option<String>,
    pub status: BookStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Editable book attributes as accepted by the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub total_copies: i32,
    pub publisher: Option<String>,
    pub publish_year: Option<i32>,
    pub description: Option<String>,
    /// Only honoured on update; see [`crate::catalog::Catalog::update_book`].
    pub status: Option<BookStatus>,
}

/// Every persisted book column except the id and audit timestamps.
#[derive(Debug, Clone)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub total_copies: i32,
    pub available_copies: i32,
    pub publisher: Option<String>,
    pub publish_year: Option<i32>,
    pub description: Option<String>,
    pub status: BookStatus,
}

/// A registered library member.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrower {
    pub id: BorrowerId,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// `MEM-` followed by eight uppercase hex digits, fixed at creation.
    pub membership_id: String,
    pub membership_type: MembershipType,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BorrowerInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub membership_type: Option<MembershipType>,
    /// Ignored on creation; new members always start active.
    pub is_active: Option<bool>,
}

/// Persisted borrower columns that may change after creation.
#[derive(Debug, Clone)]
pub struct BorrowerFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub membership_type: MembershipType,
    pub is_active: bool,
}

/// One loan of one copy. `book_title` and `borrower_name` are read through a
/// join and are not stored on the record row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    pub id: RecordId,
    pub book_id: BookId,
    pub borrower_id: BorrowerId,
    pub book_title: String,
    pub borrower_name: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: BorrowStatus,
    pub fine_amount: f64,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewBorrowRecord {
    pub book_id: BookId,
    pub borrower_id: BorrowerId,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_status_follows_available_copies() {
        assert_eq!(BookStatus::Available.derive(0), BookStatus::OutOfStock);
        assert_eq!(BookStatus::OutOfStock.derive(1), BookStatus::Available);
        assert_eq!(BookStatus::Available.derive(3), BookStatus::Available);
    }

    #[test]
    fn maintenance_is_never_derived_away() {
        assert_eq!(BookStatus::Maintenance.derive(0), BookStatus::Maintenance);
        assert_eq!(BookStatus::Maintenance.derive(5), BookStatus::Maintenance);
    }

    #[test]
    fn status_text_matches_enumerator_names() {
        assert_eq!(BookStatus::OutOfStock.as_str(), "OUT_OF_STOCK");
        assert_eq!("LOST".parse::<BorrowStatus>(), Ok(BorrowStatus::Lost));
        assert!("lost".parse::<BorrowStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&MembershipType::Premium).unwrap(),
            "\"PREMIUM\""
        );
    }

    #[test]
    fn only_borrowed_and_overdue_are_active() {
        assert!(BorrowStatus::Borrowed.is_active());
        assert!(BorrowStatus::Overdue.is_active());
        assert!(!BorrowStatus::Returned.is_active());
        assert!(!BorrowStatus::Lost.is_active());
    }
}
