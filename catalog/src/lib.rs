//! Catalog Core - category search and book storage for the Home Book API
//!
//! Category search runs a word-prefix matcher over `|`-delimited category
//! paths and ranks the hits so that matches deep in the path (near the leaf)
//! outrank matches near the root. Books and categories live in SQLite.
//!
//! The HTTP surface lives in [`handlers`]; the `catalog` binary wires it to
//! configuration and logging.

pub(crate) mod candidate;
pub mod config;
pub mod database;
pub mod handlers;
pub mod ingest;
pub mod interface;
pub mod models;
pub mod ranking;
pub mod search;
mod store;

pub use config::CatalogConfig;
pub use interface::*;
pub use store::{search_corpus, CatalogStore};
