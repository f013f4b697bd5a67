use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::error::AppResult;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-circulation";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.sqlite";
/// How long a connection waits on another writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);
/// How long a caller waits for a free pooled connection.
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle to the library database: a bounded pool of SQLite connections plus
/// the transaction boundary every state-changing operation runs inside.
///
/// Cloning is cheap; all clones share the same pool.
#[derive(Clone)]
pub struct Store {
    pool: Pool<SqliteConnectionManager>,
}

impl Store {
    /// Open (creating if needed) the database at `path`, run the lazy schema
    /// migration and keep at most `pool_size` connections open.
    pub fn open(path: &Path, pool_size: usize) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(configure_connection);
        let max_size = u32::try_from(pool_size.max(1)).unwrap_or(u32::MAX);
        let pool = Pool::builder()
            .max_size(max_size)
            .min_idle(Some(1))
            .connection_timeout(CHECKOUT_TIMEOUT)
            .build(manager)
            .context("failed to open SQLite connection pool")?;

        let conn = pool.get().context("failed to check out a connection")?;
        ensure_schema(&conn)?;
        info!(path = %path.display(), pool_size = max_size, "library database ready");

        Ok(Self { pool })
    }

    /// Run `f` inside a write transaction. `BEGIN IMMEDIATE` takes the write
    /// lock before the first read, so read-modify-write sequences inside `f`
    /// are serialized against every other writer. The transaction commits
    /// when `f` returns `Ok` and rolls back on `Err` or unwinding.
    pub fn transaction<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> AppResult<T>,
    {
        let mut conn = self.pool.get().context("failed to check out a connection")?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("failed to begin transaction")?;

        let value = f(&tx)?;

        tx.commit().context("failed to commit transaction")?;
        Ok(value)
    }

    /// Run an idempotent query outside of an explicit transaction.
    pub fn read<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let conn = self.pool.get().context("failed to check out a connection")?;
        f(&conn)
    }
}

/// Pragmas every pooled connection needs. Foreign keys are per-connection in
/// SQLite, so the pool runs this for each connection it opens.
fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    debug!(journal_mode = %mode, "connection opened");
    Ok(())
}

/// Create the three tables and their indexes if they do not exist yet.
/// Audit timestamps default to `CURRENT_TIMESTAMP`; the CHECK constraints
/// back up the copy-count and date invariants at the storage level.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            isbn TEXT NOT NULL UNIQUE,
            category TEXT NOT NULL,
            total_copies INTEGER NOT NULL CHECK (total_copies >= 1),
            available_copies INTEGER NOT NULL
                CHECK (available_copies >= 0 AND available_copies <= total_copies),
            publisher TEXT,
            publish_year INTEGER,
            description TEXT,
            status TEXT NOT NULL CHECK (status IN ('AVAILABLE', 'OUT_OF_STOCK', 'MAINTENANCE')),
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("failed to create books table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS borrowers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            phone TEXT NOT NULL,
            membership_id TEXT NOT NULL UNIQUE,
            membership_type TEXT NOT NULL CHECK (membership_type IN ('REGULAR', 'PREMIUM', 'STUDENT')),
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("failed to create borrowers table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS borrow_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            book_id INTEGER NOT NULL,
            borrower_id INTEGER NOT NULL,
            borrow_date TEXT NOT NULL,
            due_date TEXT NOT NULL CHECK (due_date >= borrow_date),
            return_date TEXT,
            status TEXT NOT NULL CHECK (status IN ('BORROWED', 'RETURNED', 'OVERDUE', 'LOST')),
            fine_amount REAL NOT NULL DEFAULT 0.0 CHECK (fine_amount >= 0),
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY(book_id) REFERENCES books(id) ON DELETE CASCADE,
            FOREIGN KEY(borrower_id) REFERENCES borrowers(id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create borrow_records table")?;

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_books_category ON books(category);
         CREATE INDEX IF NOT EXISTS idx_records_book ON borrow_records(book_id, status);
         CREATE INDEX IF NOT EXISTS idx_records_borrower ON borrow_records(borrower_id, status);
         CREATE INDEX IF NOT EXISTS idx_records_status_due ON borrow_records(status, due_date);",
    )
    .context("failed to create indexes")?;

    Ok(())
}

/// Resolve the default database location inside the user's home directory.
pub fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}
