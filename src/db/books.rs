use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Params, Row};

use super::{like_pattern, map_unique_violation};
use crate::error::LibraryError;
use crate::models::{Book, BookFields, BookId, BookStatus};

const BOOK_COLUMNS: &str = "id, title, author, isbn, category, total_copies, available_copies,
    publisher, publish_year, description, status, created_at, updated_at";

fn not_found(id: BookId) -> anyhow::Error {
    LibraryError::NotFound(format!("Book not found with id: {id}")).into()
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        isbn: row.get(3)?,
        category: row.get(4)?,
        total_copies: row.get(5)?,
        available_copies: row.get(6)?,
        publisher: row.get(7)?,
        publish_year: row.get(8)?,
        description: row.get(9)?,
        status: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Run a `SELECT` over the book columns and collect every row.
fn query_books<P: Params>(conn: &Connection, filter: &str, params: P) -> Result<Vec<Book>> {
    let sql = format!("SELECT {BOOK_COLUMNS} FROM books {filter}");
    let mut stmt = conn.prepare(&sql).context("failed to prepare book query")?;

    let books = stmt
        .query_map(params, book_from_row)
        .context("failed to load books")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect books")?;

    Ok(books)
}

/// Insert a book row and return it as stored, timestamps included.
pub fn insert_book(conn: &Connection, book: &BookFields) -> Result<Book> {
    conn.execute(
        "INSERT INTO books (title, author, isbn, category, total_copies, available_copies,
                            publisher, publish_year, description, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            book.title,
            book.author,
            book.isbn,
            book.category,
            book.total_copies,
            book.available_copies,
            book.publisher,
            book.publish_year,
            book.description,
            book.status,
        ],
    )
    .map_err(|err| {
        map_unique_violation(
            err,
            format!("Book with ISBN {} already exists", book.isbn),
            "failed to insert book",
        )
    })?;

    let id = conn.last_insert_rowid();
    find_book(conn, id)?.ok_or_else(|| anyhow!("book {id} vanished after insert"))
}

/// Fetch a single book by id, `None` when it does not exist.
pub fn find_book(conn: &Connection, id: BookId) -> Result<Option<Book>> {
    conn.query_row(
        &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
        [id],
        book_from_row,
    )
    .optional()
    .context("failed to load book")
}

/// Fetch the book carrying `isbn`, used for uniqueness checks before writes.
pub fn find_book_by_isbn(conn: &Connection, isbn: &str) -> Result<Option<Book>> {
    conn.query_row(
        &format!("SELECT {BOOK_COLUMNS} FROM books WHERE isbn = ?1"),
        [isbn],
        book_from_row,
    )
    .optional()
    .context("failed to load book by ISBN")
}

/// Fetch every book ordered by id.
pub fn fetch_books(conn: &Connection) -> Result<Vec<Book>> {
    query_books(conn, "ORDER BY id", params![])
}

/// Exact category match.
pub fn find_books_by_category(conn: &Connection, category: &str) -> Result<Vec<Book>> {
    query_books(conn, "WHERE category = ?1 ORDER BY id", [category])
}

/// Case-insensitive substring match on the title.
pub fn find_books_by_title_like(conn: &Connection, title: &str) -> Result<Vec<Book>> {
    query_books(
        conn,
        "WHERE LOWER(title) LIKE ?1 ESCAPE '\\' ORDER BY id",
        [like_pattern(title)],
    )
}

/// Case-insensitive substring match on the author.
pub fn find_books_by_author_like(conn: &Connection, author: &str) -> Result<Vec<Book>> {
    query_books(
        conn,
        "WHERE LOWER(author) LIKE ?1 ESCAPE '\\' ORDER BY id",
        [like_pattern(author)],
    )
}

/// Books with fewer than a fifth of their copies on the shelf.
pub fn find_low_stock_books(conn: &Connection) -> Result<Vec<Book>> {
    query_books(
        conn,
        "WHERE available_copies < total_copies * 0.2 ORDER BY id",
        params![],
    )
}

/// Overwrite every editable column of a book. Errors when the id is unknown.
pub fn update_book(conn: &Connection, id: BookId, book: &BookFields) -> Result<Book> {
    let updated = conn
        .execute(
            "UPDATE books
             SET title = ?1, author = ?2, isbn = ?3, category = ?4, total_copies = ?5,
                 available_copies = ?6, publisher = ?7, publish_year = ?8, description = ?9,
                 status = ?10, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?11",
            params![
                book.title,
                book.author,
                book.isbn,
                book.category,
                book.total_copies,
                book.available_copies,
                book.publisher,
                book.publish_year,
                book.description,
                book.status,
                id,
            ],
        )
        .map_err(|err| {
            map_unique_violation(
                err,
                format!("Book with ISBN {} already exists", book.isbn),
                "failed to update book",
            )
        })?;

    if updated == 0 {
        return Err(not_found(id));
    }
    find_book(conn, id)?.ok_or_else(|| anyhow!("book {id} vanished after update"))
}

/// Write the available-copy count and status, leaving other columns alone.
pub fn update_book_copies(
    conn: &Connection,
    id: BookId,
    available_copies: i32,
    status: BookStatus,
) -> Result<Book> {
    let updated = conn
        .execute(
            "UPDATE books
             SET available_copies = ?1, status = ?2, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?3",
            params![available_copies, status, id],
        )
        .context("failed to update book copies")?;

    if updated == 0 {
        return Err(not_found(id));
    }
    find_book(conn, id)?.ok_or_else(|| anyhow!("book {id} vanished after update"))
}

/// Remove a book row. Its borrow records cascade with it.
pub fn delete_book(conn: &Connection, id: BookId) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM books WHERE id = ?1", params![id])
        .context("failed to delete book")?;

    if deleted == 0 {
        Err(not_found(id))
    } else {
        Ok(())
    }
}
