//! Shared demo catalog for tests and benchmarks.
//!
//! Category paths are in stored form: segments joined by `|`. Books reference
//! categories by external id; a blank category means "uncategorized".

use once_cell::sync::Lazy;
use serde::Deserialize;

pub const CATEGORIES_CSV: &str = include_str!("../data/categories.csv");
pub const BOOKS_CSV: &str = include_str!("../data/books.csv");

#[derive(Debug, Clone, Deserialize)]
pub struct DemoCategory {
    pub cat_id: String,
    pub cat_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoBook {
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    /// Image file relative to the CSV; blank when the book has no cover.
    pub cover_art: String,
}

pub static DEMO_CATEGORIES: Lazy<Vec<DemoCategory>> = Lazy::new(|| parse(CATEGORIES_CSV));

pub static DEMO_BOOKS: Lazy<Vec<DemoBook>> = Lazy::new(|| parse(BOOKS_CSV));

// The embedded files are fixed at compile time; a parse failure is a bug in them.
fn parse<T: for<'de> Deserialize<'de>>(data: &str) -> Vec<T> {
    csv::Reader::from_reader(data.as_bytes())
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .expect("embedded demo CSV is well-formed")
}

/// Synthetic categories `SYN000000..` for load tests, each with `depth` segments.
pub fn synthetic_categories(count: usize, depth: usize) -> Vec<DemoCategory> {
    const WORDS: &[&str] = &[
        "History", "Science", "Fiction", "Romance", "Medieval", "Travel", "Poetry",
        "Cooking", "Music", "Design", "Law", "Nature", "Sports", "Magic", "Physics",
    ];
    (0..count)
        .map(|i| {
            let path = (0..depth.max(1))
                .map(|d| {
                    let word = WORDS[(i * 7 + d * 3) % WORDS.len()];
                    // the root segment carries the row index so paths stay unique
                    let n = if d == 0 { i } else { (i + d) % 97 };
                    format!("{} {}", word, n)
                })
                .collect::<Vec<_>>()
                .join("|");
            DemoCategory {
                cat_id: format!("SYN{:06}", i),
                cat_path: path,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_data_parses() {
        assert_eq!(DEMO_CATEGORIES.len(), 15);
        assert_eq!(DEMO_BOOKS.len(), 5);
        assert!(DEMO_BOOKS.iter().all(|b| b.cover_art.is_empty()));
        assert!(DEMO_CATEGORIES
            .iter()
            .any(|c| c.cat_id == "JUV037000" && c.cat_path.contains(" / ")));
    }

    #[test]
    fn test_synthetic_ids_are_unique() {
        let rows = synthetic_categories(500, 3);
        let mut ids: Vec<_> = rows.iter().map(|r| r.cat_id.clone()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 500);
        assert_eq!(rows[0].cat_path.split('|').count(), 3);
    }
}
