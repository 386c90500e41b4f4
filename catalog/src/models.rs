//! Core data models for the catalog
//!
//! Category paths are stored in an internal form (segments joined by `|`) and
//! rendered for clients with ` / ` between segments.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::interface::{BookItem, BookView, CatalogError};

/// Separator between segments in the stored path representation.
pub const SEGMENT_DELIMITER: char = '|';

/// Separator between segments in client-facing names.
pub const DISPLAY_SEPARATOR: &str = " / ";

static CATEGORY_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z]{3}[0-9]{6}$").unwrap()
});

// ─────────────────────────────────────────────────────────────────────────────
// CATEGORY ID
// ─────────────────────────────────────────────────────────────────────────────

/// External category identifier: three uppercase letters followed by six digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        if is_valid_category_id(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(CatalogError::InvalidInput(format!(
                "Category must be formatted as [A-Z]{{3}}[0-9]{{6}}. Given: {}",
                raw
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_valid_category_id(raw: &str) -> bool {
    CATEGORY_ID_REGEX.is_match(raw)
}

// ─────────────────────────────────────────────────────────────────────────────
// CATEGORY PATH
// ─────────────────────────────────────────────────────────────────────────────

/// A hierarchical category label, root-first.
///
/// Segments are never empty; construction rejects paths that would violate this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPath {
    id: CategoryId,
    segments: Vec<String>,
}

impl CategoryPath {
    /// Build a path from a row as stored in the `categories` table.
    pub fn from_stored(id: &str, stored_path: &str) -> Result<Self, CatalogError> {
        let malformed = || CatalogError::MalformedCategoryPath {
            id: id.to_string(),
            path: stored_path.to_string(),
        };

        if !is_valid_category_id(id) {
            return Err(malformed());
        }
        let segments = segments(stored_path);
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(malformed());
        }

        Ok(Self {
            id: CategoryId(id.to_string()),
            segments,
        })
    }

    pub fn id(&self) -> &CategoryId {
        &self.id
    }

    /// Root-first segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Segments joined by the storage delimiter (the form candidates are matched against).
    pub fn internal(&self) -> String {
        self.segments.join(&SEGMENT_DELIMITER.to_string())
    }

    /// Display name for clients, e.g. `Fiction / Romance / History`.
    pub fn render(&self) -> String {
        self.segments.join(DISPLAY_SEPARATOR)
    }
}

/// Split a stored path on the segment delimiter.
pub fn segments(stored_path: &str) -> Vec<String> {
    stored_path
        .split(SEGMENT_DELIMITER)
        .map(str::to_string)
        .collect()
}

/// Render a stored path for display without validating it.
pub fn render(stored_path: &str) -> String {
    segments(stored_path).join(DISPLAY_SEPARATOR)
}

/// Convert a display-form path (` / ` separated) to the stored form.
pub fn to_stored_form(display_path: &str) -> String {
    display_path.replace(DISPLAY_SEPARATOR, &SEGMENT_DELIMITER.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// BOOKS
// ─────────────────────────────────────────────────────────────────────────────

/// A row of the `books` table joined with its category.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBook {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    /// External id of the category, if any
    pub category_id: Option<String>,
    /// Stored (`|`-delimited) path of the category, if any
    pub category_path: Option<String>,
    pub isbn: Option<String>,
    pub cover_art: Option<String>,
}

impl StoredBook {
    pub fn to_view(&self) -> BookView {
        BookView {
            unique_id: self.id,
            title: self.title.clone(),
            author: self.author.clone(),
            category: self.category_path.as_deref().map(render),
            cover_art: self.cover_art.clone(),
            isbn: self.isbn.clone(),
        }
    }

    pub fn to_book_item(&self) -> BookItem {
        BookItem {
            id: self.id,
            title: self.title.clone(),
            author: self.author.clone(),
            category: self.category_id.clone(),
            isbn: self.isbn.clone(),
            cover_art: self.cover_art.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_id_format() {
        assert!(is_valid_category_id("FIC027150"));
        assert!(!is_valid_category_id("fic027150"));
        assert!(!is_valid_category_id("FI027150"));
        assert!(!is_valid_category_id("FIC02715"));
        assert!(!is_valid_category_id("FIC0271500"));
        assert!(!is_valid_category_id(" FIC027150"));
    }

    #[test]
    fn test_category_id_parse_error_names_input() {
        let err = CategoryId::parse("bad").unwrap_err();
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_segments_and_render() {
        let path = CategoryPath::from_stored("FIC027150", "Fiction|Romance|History|Medieval").unwrap();
        assert_eq!(path.segments(), ["Fiction", "Romance", "History", "Medieval"]);
        assert_eq!(path.render(), "Fiction / Romance / History / Medieval");
        assert_eq!(path.internal(), "Fiction|Romance|History|Medieval");
    }

    #[test]
    fn test_segment_labels_keep_punctuation() {
        let path = CategoryPath::from_stored("OCC028000", "Body, Mind & Spirit|Magick Studies").unwrap();
        assert_eq!(path.segments(), ["Body, Mind & Spirit", "Magick Studies"]);
        assert_eq!(path.render(), "Body, Mind & Spirit / Magick Studies");
    }

    #[test]
    fn test_single_segment_path() {
        let path = CategoryPath::from_stored("JUV037000", "Juvenile Fiction / Fantasy & Magic").unwrap();
        assert_eq!(path.segments().len(), 1);
        assert_eq!(path.render(), "Juvenile Fiction / Fantasy & Magic");
    }

    #[test]
    fn test_malformed_paths_rejected() {
        for bad in ["", "Fiction||Romance", "Fiction|", "|Fiction", "Fiction| |Romance"] {
            let err = CategoryPath::from_stored("FIC000000", bad).unwrap_err();
            assert!(
                matches!(err, CatalogError::MalformedCategoryPath { .. }),
                "expected malformed for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_malformed_id_rejected() {
        let err = CategoryPath::from_stored("FIC-1", "Fiction").unwrap_err();
        assert!(matches!(err, CatalogError::MalformedCategoryPath { .. }));
    }

    #[test]
    fn test_display_and_stored_forms() {
        assert_eq!(to_stored_form("Science / History"), "Science|History");
        assert_eq!(render("Science|History"), "Science / History");
    }
}
