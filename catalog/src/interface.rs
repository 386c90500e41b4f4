//! Catalog Service Interface Definition
//!
//! Public record types shared by the store, the HTTP layer and the CLI.
//! It acts as the source of truth for the wire shapes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// A ranked category search result.
///
/// Ordering is total: `rank_score` ascending, then `display_name` ascending.
/// See [`crate::ranking::compare_results`].
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub external_id: String,
    pub display_name: String,
    pub rank_score: f64,
}

/// Category entry as returned by the search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryHit {
    pub id: String,
    pub name: String,
}

impl From<RankedResult> for CategoryHit {
    fn from(r: RankedResult) -> Self {
        CategoryHit {
            id: r.external_id,
            name: r.display_name,
        }
    }
}

/// `{"result": ...}` envelope used by every catalog endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope<T> {
    pub result: T,
}

/// Book as listed to clients: category rendered as a display path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookView {
    pub unique_id: Uuid,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub cover_art: Option<String>,
    pub isbn: Option<String>,
}

/// Book with its category given as an external category id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookItem {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub cover_art: Option<String>,
}

/// Payload for creating or updating a book. A missing id gets a fresh v4 UUID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookCreate {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub cover_art: Option<String>,
}

impl BookCreate {
    pub fn into_book_item(self) -> BookItem {
        BookItem {
            id: self.id,
            title: self.title,
            author: self.author,
            category: self.category,
            isbn: self.isbn,
            cover_art: self.cover_art,
        }
    }
}

/// Error type for catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Upstream storage unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Malformed category path {id}: {path:?}")]
    MalformedCategoryPath { id: String, path: String },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Operation cancelled")]
    Cancelled,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERVICE INTERFACE
// ═══════════════════════════════════════════════════════════════════════════════

/// The primary interface of the catalog.
/// This matches the functionality exposed by the `CatalogStore` object.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Rank categories against a free-text query. `None` limit means unbounded.
    async fn search_categories(
        &self,
        query: String,
        limit: Option<usize>,
    ) -> Result<Vec<RankedResult>, CatalogError>;

    /// All books, with and without a category
    fn list_books(&self, limit: Option<usize>) -> Result<Vec<BookView>, CatalogError>;

    /// Books that have a category, ordered by category, author, title
    fn list_books_by_category(&self, limit: Option<usize>) -> Result<Vec<BookView>, CatalogError>;

    /// Fetch a single book
    fn get_book(&self, book_id: Uuid) -> Result<BookView, CatalogError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Write Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Insert a book. The category, if given, must exist.
    fn add_book(&self, book: BookCreate) -> Result<BookItem, CatalogError>;

    /// Replace every field of an existing book
    fn update_book(&self, book: BookCreate) -> Result<BookItem, CatalogError>;
}

impl From<crate::database::DatabaseError> for CatalogError {
    fn from(e: crate::database::DatabaseError) -> Self {
        CatalogError::UpstreamUnavailable(e.to_string())
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e.to_string())
    }
}

impl From<csv::Error> for CatalogError {
    fn from(e: csv::Error) -> Self {
        CatalogError::InvalidInput(e.to_string())
    }
}
