//! SQLite database layer for the catalog
//!
//! Two tables: `categories` (paths in `|`-delimited form) and `books`.
//! Uses r2d2 connection pooling to allow concurrent reads without mutex blocking.

use crate::interface::BookItem;
use crate::models::StoredBook;
use crate::search::SearchTerm;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

impl DatabaseError {
    /// UNIQUE / PRIMARY KEY / FOREIGN KEY failures
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// A category row: (external id, stored path).
pub type CategoryRow = (String, String);

const BOOK_COLUMNS: &str = "b.id, b.title, b.author, c.cat_id, c.cat_path, b.isbn, b.cover_art";

/// Thread-safe database wrapper using connection pooling
///
/// WAL mode enables readers to proceed without blocking each other.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open or create a database at the given path with connection pooling
    pub fn open<P: AsRef<Path>>(path: P, pool_size: u32) -> DatabaseResult<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| {
                conn.execute_batch("
                    PRAGMA journal_mode=WAL;
                    PRAGMA synchronous=NORMAL;
                    PRAGMA foreign_keys=ON;
                ")?;
                register_functions(conn)
            });

        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)?;

        let db = Self { pool };
        db.setup_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> DatabaseResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| {
                conn.execute_batch("PRAGMA foreign_keys=ON;")?;
                register_functions(conn)
            });

        // In-memory needs single connection to maintain state
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)?;

        let db = Self { pool };
        db.setup_schema()?;
        Ok(db)
    }

    /// Get a connection from the pool
    fn get_conn(&self) -> DatabaseResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Create tables if they do not exist
    pub fn setup_schema(&self) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cat_id TEXT NOT NULL UNIQUE,
                cat_path TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS books (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                category INTEGER REFERENCES categories(id),
                isbn TEXT,
                cover_art TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_books_category ON books(category);
        "#)?;
        Ok(())
    }

    /// Drop every table and recreate the schema
    pub fn reset(&self) -> DatabaseResult<()> {
        {
            let conn = self.get_conn()?;
            conn.execute_batch("
                DROP TABLE IF EXISTS books;
                DROP TABLE IF EXISTS categories;
            ")?;
        }
        self.setup_schema()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Categories
    // ─────────────────────────────────────────────────────────────────────────────

    /// Get total number of categories
    pub fn count_categories(&self) -> DatabaseResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Insert one category. Returns the row id.
    pub fn insert_category(&self, cat_id: &str, cat_path: &str) -> DatabaseResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO categories (cat_id, cat_path) VALUES (?1, ?2)",
            params![cat_id, cat_path],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Insert many categories in a single transaction
    pub fn insert_categories(&self, rows: &[CategoryRow]) -> DatabaseResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO categories (cat_id, cat_path) VALUES (?1, ?2)")?;
            for (cat_id, cat_path) in rows {
                stmt.execute(params![cat_id, cat_path])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// All categories in insertion order
    pub fn fetch_all_categories(&self) -> DatabaseResult<Vec<CategoryRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT cat_id, cat_path FROM categories ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Coarse candidate filter: paths where any term starts the path, follows a
    /// space, or follows a segment delimiter. Paths are lowercased with
    /// `unicode_lower` so non-ASCII labels compare like the in-process matcher.
    /// Results are unordered; callers re-check and rank them.
    pub fn find_category_candidates(&self, terms: &[SearchTerm]) -> DatabaseResult<Vec<CategoryRow>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut patterns: Vec<String> = Vec::with_capacity(terms.len() * 3);
        for term in terms {
            let escaped = escape_like(term.as_str());
            patterns.push(format!("{}%", escaped));
            patterns.push(format!("% {}%", escaped));
            patterns.push(format!("%|{}%", escaped));
        }
        let clauses: Vec<String> = (1..=patterns.len())
            .map(|i| format!("unicode_lower(cat_path) LIKE ?{} ESCAPE '\\'", i))
            .collect();
        let sql = format!(
            "SELECT cat_id, cat_path FROM categories WHERE {}",
            clauses.join(" OR ")
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(patterns.iter()), |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Map external category id → row id
    pub fn category_row_id(&self, cat_id: &str) -> DatabaseResult<Option<i64>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM categories WHERE cat_id = ?1",
                [cat_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Books
    // ─────────────────────────────────────────────────────────────────────────────

    /// Insert a book. `category` is the categories row id.
    pub fn insert_book(&self, book: &BookItem, category: Option<i64>) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO books (id, title, author, category, isbn, cover_art)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                book.id.to_string(),
                book.title,
                book.author,
                category,
                book.isbn,
                book.cover_art,
            ],
        )?;
        Ok(())
    }

    /// Insert many books in a single transaction
    pub fn insert_books(&self, books: &[(BookItem, Option<i64>)]) -> DatabaseResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO books (id, title, author, category, isbn, cover_art)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            )?;
            for (book, category) in books {
                stmt.execute(params![
                    book.id.to_string(),
                    book.title,
                    book.author,
                    category,
                    book.isbn,
                    book.cover_art,
                ])?;
            }
        }
        tx.commit()?;
        Ok(books.len())
    }

    /// Overwrite every column of a book. Returns false if no such book exists.
    pub fn update_book(&self, book: &BookItem, category: Option<i64>) -> DatabaseResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"UPDATE books SET title = ?2, author = ?3, category = ?4, isbn = ?5, cover_art = ?6
               WHERE id = ?1"#,
            params![
                book.id.to_string(),
                book.title,
                book.author,
                category,
                book.isbn,
                book.cover_art,
            ],
        )?;
        Ok(changed > 0)
    }

    /// All books: categorized books first, then uncategorized ones
    pub fn fetch_books(&self, limit: Option<usize>) -> DatabaseResult<Vec<StoredBook>> {
        let sql = format!(
            r#"SELECT {} FROM books b LEFT JOIN categories c ON c.id = b.category
               ORDER BY (b.category IS NULL), b.rowid
               LIMIT ?1"#,
            BOOK_COLUMNS
        );
        self.query_books(&sql, limit)
    }

    /// Books with a category, ordered by category row, author, title
    pub fn fetch_books_by_category(&self, limit: Option<usize>) -> DatabaseResult<Vec<StoredBook>> {
        let sql = format!(
            r#"SELECT {} FROM books b JOIN categories c ON c.id = b.category
               ORDER BY c.id, b.author, b.title
               LIMIT ?1"#,
            BOOK_COLUMNS
        );
        self.query_books(&sql, limit)
    }

    pub fn fetch_book(&self, id: Uuid) -> DatabaseResult<Option<StoredBook>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM books b LEFT JOIN categories c ON c.id = b.category WHERE b.id = ?1",
            BOOK_COLUMNS
        );
        let row = conn
            .query_row(&sql, [id.to_string()], Self::row_to_book)
            .optional()?;
        row.transpose()
    }

    fn query_books(&self, sql: &str, limit: Option<usize>) -> DatabaseResult<Vec<StoredBook>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let rows = stmt
            .query_map([limit], Self::row_to_book)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().collect()
    }

    /// Convert a row selected with `BOOK_COLUMNS` to a StoredBook
    fn row_to_book(row: &rusqlite::Row) -> rusqlite::Result<DatabaseResult<StoredBook>> {
        let id: String = row.get(0)?;
        let id = match Uuid::parse_str(&id) {
            Ok(id) => id,
            Err(e) => return Ok(Err(DatabaseError::CorruptRow(format!("book id {:?}: {}", id, e)))),
        };
        Ok(Ok(StoredBook {
            id,
            title: row.get(1)?,
            author: row.get(2)?,
            category_id: row.get(3)?,
            category_path: row.get(4)?,
            isbn: row.get(5)?,
            cover_art: row.get(6)?,
        }))
    }
}

/// SQL functions every pooled connection needs
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    // SQLite's lower() and LIKE only fold ASCII
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: String = ctx.get(0)?;
            Ok(text.to_lowercase())
        },
    )
}

/// Escape LIKE wildcards so a term is matched literally
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
