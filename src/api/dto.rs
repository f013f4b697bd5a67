//! Request bodies and their validation schema. Server-derived fields such as
//! `availableCopies` or `membershipId` are simply not read from requests.

use garde::Validate;
use serde::Deserialize;

use crate::circulation::DEFAULT_BORROW_DAYS;
use crate::models::{BookInput, BookStatus, BorrowerInput, MembershipType};

fn non_blank(value: &str, _: &()) -> garde::Result {
    if value.trim().is_empty() {
        Err(garde::Error::new("must not be blank"))
    } else {
        Ok(())
    }
}

/// Hyphens allowed anywhere; exactly 10 or 13 digits otherwise.
fn valid_isbn(value: &str, _: &()) -> garde::Result {
    let mut digits = 0;
    for ch in value.chars() {
        match ch {
            '0'..='9' => digits += 1,
            '-' => {}
            _ => return Err(garde::Error::new("invalid ISBN format")),
        }
    }
    if digits == 10 || digits == 13 {
        Ok(())
    } else {
        Err(garde::Error::new("invalid ISBN format"))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[garde(custom(non_blank))]
    pub title: String,
    #[garde(custom(non_blank))]
    pub author: String,
    #[garde(custom(valid_isbn))]
    pub isbn: String,
    #[garde(custom(non_blank))]
    pub category: String,
    #[garde(range(min = 1))]
    pub total_copies: i32,
    #[garde(skip)]
    pub publisher: Option<String>,
    #[garde(range(min = 1000, max = 2100))]
    pub publish_year: Option<i32>,
    #[garde(skip)]
    pub description: Option<String>,
    #[garde(skip)]
    pub status: Option<BookStatus>,
}

impl From<BookRequest> for BookInput {
    fn from(req: BookRequest) -> Self {
        BookInput {
            title: req.title,
            author: req.author,
            isbn: req.isbn,
            category: req.category,
            total_copies: req.total_copies,
            publisher: req.publisher,
            publish_year: req.publish_year,
            description: req.description,
            status: req.status,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerRequest {
    #[garde(custom(non_blank))]
    pub name: String,
    #[garde(email)]
    pub email: String,
    #[garde(pattern(r"^[0-9]{10}$"))]
    pub phone: String,
    #[garde(skip)]
    pub membership_type: Option<MembershipType>,
    #[garde(skip)]
    pub is_active: Option<bool>,
}

impl From<BorrowerRequest> for BorrowerInput {
    fn from(req: BorrowerRequest) -> Self {
        BorrowerInput {
            name: req.name,
            email: req.email,
            phone: req.phone,
            membership_type: req.membership_type,
            is_active: req.is_active,
        }
    }
}

fn default_borrow_days() -> u32 {
    DEFAULT_BORROW_DAYS
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    #[garde(skip)]
    pub book_id: i64,
    #[garde(skip)]
    pub borrower_id: i64,
    #[serde(default = "default_borrow_days")]
    #[garde(range(min = 1, max = 90))]
    pub borrow_days: u32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    #[garde(skip)]
    pub record_id: i64,
    #[garde(skip)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthorQuery {
    pub author: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn book(isbn: &str, total_copies: i32) -> BookRequest {
        serde_json::from_value(json!({
            "title": "Effective Java",
            "author": "Joshua Bloch",
            "isbn": isbn,
            "category": "Programming",
            "totalCopies": total_copies,
        }))
        .unwrap()
    }

    #[test]
    fn accepts_ten_and_thirteen_digit_isbns() {
        assert!(book("9780134685991", 1).validate().is_ok());
        assert!(book("978-0-13-468599-1", 1).validate().is_ok());
        assert!(book("0-306-40615-2", 1).validate().is_ok());
    }

    #[test]
    fn rejects_malformed_isbns() {
        assert!(book("12345", 1).validate().is_err());
        assert!(book("97801346859X1", 1).validate().is_err());
        assert!(book("", 1).validate().is_err());
    }

    #[test]
    fn requires_at_least_one_copy() {
        assert!(book("9780134685991", 0).validate().is_err());
    }

    #[test]
    fn publish_year_must_be_plausible() {
        let mut req = book("9780134685991", 1);
        req.publish_year = Some(999);
        assert!(req.validate().is_err());
        req.publish_year = Some(2018);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut req = book("9780134685991", 1);
        req.title = "   ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn borrower_phone_must_be_ten_digits() {
        let req: BorrowerRequest = serde_json::from_value(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "phone": "12345",
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: BorrowerRequest = serde_json::from_value(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "phone": "5551234567",
            "membershipType": "STUDENT",
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.membership_type, Some(MembershipType::Student));
    }

    #[test]
    fn borrower_email_must_be_well_formed() {
        let req: BorrowerRequest = serde_json::from_value(json!({
            "name": "Ada",
            "email": "not-an-email",
            "phone": "5551234567",
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn borrow_days_default_to_two_weeks() {
        let req: BorrowRequest =
            serde_json::from_value(json!({ "bookId": 1, "borrowerId": 2 })).unwrap();
        assert_eq!(req.borrow_days, 14);
        assert!(req.validate().is_ok());

        let req: BorrowRequest =
            serde_json::from_value(json!({ "bookId": 1, "borrowerId": 2, "borrowDays": 91 }))
                .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn unknown_membership_type_fails_to_decode() {
        let result = serde_json::from_value::<BorrowerRequest>(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "phone": "5551234567",
            "membershipType": "GOLD",
        }));
        assert!(result.is_err());
    }
}
