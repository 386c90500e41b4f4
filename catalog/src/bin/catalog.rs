//! Home Book API server and database management tool
//!
//! Usage:
//!     catalog serve [--bind 0.0.0.0:8530]
//!     catalog --db books.sqlite ingest data/categories.csv --type categories
//!     catalog dump backup/

use anyhow::{Context, Result};
use catalog::{handlers, ingest, CatalogConfig, CatalogStore};
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// SQLite database file (overrides CATALOG_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to bind (overrides CATALOG_BIND)
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Create the tables
    Init,
    /// Drop all tables and recreate them empty
    Drop,
    /// Import a CSV file
    Ingest {
        file: PathBuf,
        #[arg(short = 't', long = "type", value_enum)]
        kind: IngestKind,
    },
    /// Export categories, books and cover images into an empty directory
    Dump { dest: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum IngestKind {
    Categories,
    Books,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("catalog=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = CatalogConfig::from_env().context("loading configuration")?;
    if let Some(db) = args.db {
        config.db_path = db;
    }

    let store = CatalogStore::open(&config)
        .with_context(|| format!("opening {}", config.db_path.display()))?;

    match args.command {
        Command::Serve { bind } => {
            let addr = bind.unwrap_or(config.bind_addr);
            tracing::info!(
                db = %config.db_path.display(),
                addr = %addr,
                default_limit = config.default_limit,
                "configuration loaded"
            );
            handlers::serve(Arc::new(store), addr).await?;
        }
        Command::Init => {
            store.database().setup_schema()?;
            let categories = store.database().count_categories()?;
            tracing::info!(categories, "tables ready");
        }
        Command::Drop => {
            store.database().reset()?;
            tracing::info!("tables dropped and recreated");
        }
        Command::Ingest { file, kind } => {
            let report = match kind {
                IngestKind::Categories => ingest::ingest_categories(store.database(), &file)?,
                IngestKind::Books => ingest::ingest_books(store.database(), &file)?,
            };
            println!("Inserted {} rows from {}", report.inserted, file.display());
            if !report.skipped.is_empty() {
                println!("Skipped malformed entries: {}", report.skipped.join(", "));
            }
        }
        Command::Dump { dest } => {
            let report = ingest::dump(store.database(), &dest)?;
            println!(
                "Wrote {} categories, {} books and {} images to {}",
                report.categories,
                report.books,
                report.images,
                dest.display()
            );
        }
    }

    Ok(())
}
