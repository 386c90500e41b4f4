//! CSV import and export for categories and books.
//!
//! Category CSVs carry display-form paths (`A / B / C`); they are stored with
//! `|` between segments. Book cover art lives in the database as
//! `data:image/<ext>;base64,<data>` URLs and on disk as plain image files
//! next to the CSV.

use crate::database::{CategoryRow, Database};
use crate::interface::{BookItem, CatalogError};
use crate::models::{is_valid_category_id, render, to_stored_form};
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

static DATA_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:image/(?P<ext>[a-z]+);base64,(?P<encoding>.+)$").unwrap()
});

#[derive(Debug, Serialize, Deserialize)]
struct CategoryRecord {
    cat_id: String,
    cat_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct BookRecord {
    id: String,
    title: String,
    author: String,
    isbn: String,
    category: String,
    cover_art: String,
}

/// Outcome of an import
#[derive(Debug, Default, PartialEq)]
pub struct IngestReport {
    pub inserted: usize,
    /// Entries that were not imported (malformed category ids)
    pub skipped: Vec<String>,
}

/// Outcome of an export
#[derive(Debug, Default, PartialEq)]
pub struct DumpReport {
    pub categories: usize,
    pub books: usize,
    pub images: usize,
}

/// Import a `cat_id,cat_path` CSV. Rows with malformed ids are skipped and reported.
pub fn ingest_categories(db: &Database, csv_path: &Path) -> Result<IngestReport, CatalogError> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut rows: Vec<CategoryRow> = Vec::new();
    let mut skipped = Vec::new();

    for record in reader.deserialize::<CategoryRecord>() {
        let record = record?;
        let cat_id = record.cat_id.trim();
        if is_valid_category_id(cat_id) {
            rows.push((cat_id.to_string(), to_stored_form(record.cat_path.trim())));
        } else {
            skipped.push(record.cat_id);
        }
    }

    if !skipped.is_empty() {
        tracing::warn!(
            malformed = ?skipped,
            "The following entries are malformed and were not added"
        );
    }

    let inserted = db.insert_categories(&rows)?;
    let total = db.count_categories()?;
    tracing::info!(inserted, skipped = skipped.len(), total, "categories ingested");
    Ok(IngestReport { inserted, skipped })
}

/// Import an `id,title,author,isbn,category,cover_art` CSV.
///
/// Blank ids get a fresh UUID; cover art paths are relative to the CSV file.
pub fn ingest_books(db: &Database, csv_path: &Path) -> Result<IngestReport, CatalogError> {
    let base_dir = csv_path.parent().unwrap_or_else(|| Path::new("."));
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut category_rows: HashMap<String, i64> = HashMap::new();
    let mut books: Vec<(BookItem, Option<i64>)> = Vec::new();

    for record in reader.deserialize::<BookRecord>() {
        let record = record?;

        let id = match record.id.trim() {
            "" => Uuid::new_v4(),
            raw => Uuid::parse_str(raw)
                .map_err(|e| CatalogError::InvalidInput(format!("book id {:?}: {}", raw, e)))?,
        };

        let category_id = non_blank(&record.category);
        let category_row = match &category_id {
            None => None,
            Some(cat_id) => Some(match category_rows.get(cat_id) {
                Some(row) => *row,
                None => {
                    let row = db.category_row_id(cat_id)?.ok_or_else(|| {
                        CatalogError::InvalidInput(format!("unknown category {}", cat_id))
                    })?;
                    category_rows.insert(cat_id.clone(), row);
                    row
                }
            }),
        };

        let cover_art = match non_blank(&record.cover_art) {
            Some(file) => Some(image_to_data_url(&base_dir.join(file))?),
            None => None,
        };

        books.push((
            BookItem {
                id,
                title: record.title.trim().to_string(),
                author: record.author.trim().to_string(),
                category: category_id,
                isbn: non_blank(&record.isbn),
                cover_art,
            },
            category_row,
        ));
    }

    let inserted = db.insert_books(&books)?;
    tracing::info!(inserted, "books ingested");
    Ok(IngestReport { inserted, skipped: Vec::new() })
}

/// Export categories and books as CSV into `dest`, which must be empty or absent.
pub fn dump(db: &Database, dest: &Path) -> Result<DumpReport, CatalogError> {
    if !dest.exists() {
        std::fs::create_dir_all(dest)?;
    }
    if !dest.is_dir() {
        return Err(CatalogError::InvalidInput(format!(
            "{} is not a directory",
            dest.display()
        )));
    }
    if std::fs::read_dir(dest)?.next().is_some() {
        return Err(CatalogError::InvalidInput("Output directory must be empty".to_string()));
    }

    let mut report = DumpReport::default();

    let mut writer = csv::Writer::from_path(dest.join("categories.csv"))?;
    for (cat_id, cat_path) in db.fetch_all_categories()? {
        writer.serialize(CategoryRecord {
            cat_id,
            cat_path: render(&cat_path),
        })?;
        report.categories += 1;
    }
    writer.flush()?;

    let mut writer = csv::Writer::from_path(dest.join("books.csv"))?;
    for book in db.fetch_books(None)? {
        let cover_art = match &book.cover_art {
            Some(url) => {
                report.images += 1;
                data_url_to_image(url, dest)?
            }
            None => String::new(),
        };
        writer.serialize(BookRecord {
            id: book.id.to_string(),
            title: book.title,
            author: book.author,
            isbn: book.isbn.unwrap_or_default(),
            category: book.category_id.unwrap_or_default(),
            cover_art,
        })?;
        report.books += 1;
    }
    writer.flush()?;

    tracing::info!(
        categories = report.categories,
        books = report.books,
        images = report.images,
        dest = %dest.display(),
        "catalog dumped"
    );
    Ok(report)
}

/// Read an image file into a `data:image/<ext>;base64,...` URL
pub fn image_to_data_url(path: &Path) -> Result<String, CatalogError> {
    let bytes = std::fs::read(path)
        .map_err(|e| CatalogError::Io(format!("{}: {}", path.display(), e)))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:image/{};base64,{}", ext, encoded))
}

/// Decode a data URL into `<uuid>.<ext>` inside `dest_dir`. Returns the file name.
pub fn data_url_to_image(url: &str, dest_dir: &Path) -> Result<String, CatalogError> {
    let caps = DATA_URL_REGEX
        .captures(url)
        .ok_or_else(|| CatalogError::InvalidInput("cover art is not an image data URL".to_string()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&caps["encoding"])
        .map_err(|e| CatalogError::InvalidInput(format!("cover art: {}", e)))?;

    let file_name = format!("{}.{}", Uuid::new_v4(), &caps["ext"]);
    std::fs::write(dest_dir.join(&file_name), bytes)?;
    Ok(file_name)
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
