//! Back-end of a small library-management service: a catalog of books, a
//! membership register and the circulation engine that lends and takes back
//! copies, all persisted in SQLite and served over a JSON HTTP API.
//!
//! Components receive the [`Store`] explicitly and are plain cloneable
//! handles, so the binary, the HTTP layer and tests wire them the same way.
pub mod api;
pub mod catalog;
pub mod circulation;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod membership;
pub mod models;

/// The HTTP entry point the binary serves and the API tests drive.
pub use api::{router, AppState};

/// The three components holding the library's business rules.
pub use catalog::Catalog;
pub use circulation::Circulation;
pub use membership::Membership;

/// Start-up pieces: configuration, the date source and the database handle.
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use db::Store;

/// The error every component operation reports.
pub use error::{AppResult, LibraryError};

/// The entity types other layers pass around.
pub use models::{Book, BookStatus, BorrowRecord, BorrowStatus, Borrower, MembershipType};
