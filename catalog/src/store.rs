//! CatalogStore - Main API for the HTTP layer
//!
//! Category search runs tokenizer → candidate matcher → ranker → limit over a
//! per-request snapshot of the categories table. The SQL pre-filter only
//! narrows the rows; every returned path is re-checked and re-ranked here.
//!
//! Async Cancellation:
//! The blocking search runs on `spawn_blocking`. If the caller drops the
//! future, a DropGuard cancels the token and the blocking thread stops at its
//! next checkpoint.

use crate::config::CatalogConfig;
use crate::database::{CategoryRow, Database};
use crate::interface::{BookCreate, BookItem, BookView, CatalogApi, CatalogError, RankedResult};
use crate::models::{CategoryId, CategoryPath};
use crate::ranking::{rank_candidates, RankPattern};
use crate::search::{find_candidates, tokenize_query};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// RAII guard that cancels a token when dropped.
struct DropGuard {
    token: CancellationToken,
}

impl DropGuard {
    fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Rank an in-memory corpus against a raw query. Pure; never touches storage.
///
/// An empty term set (blank or connector-only query) yields no results.
pub fn search_corpus(
    raw_query: &str,
    limit: Option<usize>,
    corpus: impl IntoIterator<Item = CategoryPath>,
) -> Result<Vec<RankedResult>, CatalogError> {
    let terms = tokenize_query(raw_query);
    let pattern = RankPattern::new(&terms)?;
    let candidates = find_candidates(&terms, corpus);
    let mut ranked = rank_candidates(candidates, &pattern);
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    Ok(ranked)
}

/// Turn stored rows into paths, skipping rows that violate the path invariants.
fn valid_paths(rows: Vec<CategoryRow>) -> impl Iterator<Item = CategoryPath> {
    rows.into_iter().filter_map(|(id, path)| {
        match CategoryPath::from_stored(&id, &path) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed category row");
                None
            }
        }
    })
}

/// Thread-safe catalog store over SQLite
///
/// Concurrency Model:
/// - Database uses r2d2 connection pool (concurrent reads, no mutex blocking)
/// - Search holds no shared mutable state; each call works on its own snapshot
/// - Blocking work runs on tokio::spawn_blocking threads
pub struct CatalogStore {
    db: Arc<Database>,
    default_limit: usize,
}

impl CatalogStore {
    /// Open the database named by `config`, creating the schema if needed
    pub fn open(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let db = Database::open(&config.db_path, config.pool_size)?;
        tracing::info!(db = %config.db_path.display(), "catalog database opened");
        Ok(Self {
            db: Arc::new(db),
            default_limit: config.default_limit,
        })
    }

    /// Create a store with an in-memory database (for testing)
    #[cfg(test)]
    pub(crate) fn new_in_memory() -> Result<Self, CatalogError> {
        Ok(Self {
            db: Arc::new(Database::open_in_memory()?),
            default_limit: crate::search::DEFAULT_LIMIT,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Limit applied by the HTTP layer when the client sends none
    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    fn search_categories_sync(
        db: &Database,
        query: &str,
        limit: Option<usize>,
        token: &CancellationToken,
    ) -> Result<Vec<RankedResult>, CatalogError> {
        let started = Instant::now();
        let terms = tokenize_query(query);
        if terms.is_empty() {
            tracing::debug!(query, "no search terms after tokenizing");
            return Ok(Vec::new());
        }

        let pattern = RankPattern::new(&terms)?;
        let rows = db.find_category_candidates(&terms)?;
        let fetched = rows.len();

        if token.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }

        let candidates = find_candidates(&terms, valid_paths(rows));
        let mut ranked = rank_candidates(candidates, &pattern);
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }

        tracing::debug!(
            query,
            terms = terms.len(),
            fetched,
            returned = ranked.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "category search"
        );
        Ok(ranked)
    }

    /// Resolve an optional external category id to its row id.
    fn resolve_category(&self, category: Option<&str>) -> Result<Option<i64>, CatalogError> {
        let Some(raw) = category else {
            return Ok(None);
        };
        let cat_id = CategoryId::parse(raw)?;
        match self.db.category_row_id(cat_id.as_str())? {
            Some(row_id) => Ok(Some(row_id)),
            None => Err(CatalogError::InvalidInput(format!("unknown category {}", cat_id))),
        }
    }
}

#[async_trait]
impl CatalogApi for CatalogStore {
    // ─────────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────────

    async fn search_categories(
        &self,
        query: String,
        limit: Option<usize>,
    ) -> Result<Vec<RankedResult>, CatalogError> {
        let token = CancellationToken::new();
        let _guard = DropGuard::new(token.clone());

        let db = Arc::clone(&self.db);
        let token_clone = token.clone();
        let handle = tokio::task::spawn_blocking(move || {
            Self::search_categories_sync(&db, &query, limit, &token_clone)
        });

        match handle.await {
            Ok(result) => result,
            Err(_join_error) => Err(CatalogError::Cancelled),
        }
    }

    fn list_books(&self, limit: Option<usize>) -> Result<Vec<BookView>, CatalogError> {
        let books = self.db.fetch_books(limit)?;
        Ok(books.iter().map(|b| b.to_view()).collect())
    }

    fn list_books_by_category(&self, limit: Option<usize>) -> Result<Vec<BookView>, CatalogError> {
        let books = self.db.fetch_books_by_category(limit)?;
        Ok(books.iter().map(|b| b.to_view()).collect())
    }

    fn get_book(&self, book_id: Uuid) -> Result<BookView, CatalogError> {
        self.db
            .fetch_book(book_id)?
            .map(|b| b.to_view())
            .ok_or_else(|| CatalogError::NotFound(format!("book {}", book_id)))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Write Operations
    // ─────────────────────────────────────────────────────────────────────────────

    fn add_book(&self, book: BookCreate) -> Result<BookItem, CatalogError> {
        let category = self.resolve_category(book.category.as_deref())?;
        let item = book.into_book_item();
        match self.db.insert_book(&item, category) {
            Ok(()) => {
                tracing::info!(book = %item.id, "book added");
                Ok(item)
            }
            Err(e) if e.is_constraint_violation() => {
                Err(CatalogError::InvalidInput(format!("book {} already exists", item.id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update_book(&self, book: BookCreate) -> Result<BookItem, CatalogError> {
        let category = self.resolve_category(book.category.as_deref())?;
        let item = book.into_book_item();
        if self.db.update_book(&item, category)? {
            tracing::info!(book = %item.id, "book updated");
            Ok(item)
        } else {
            Err(CatalogError::NotFound(format!("book {}", item.id)))
        }
    }
}
