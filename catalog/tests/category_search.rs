//! End-to-end category search against a file-backed catalog.

use catalog::{CatalogApi, CatalogConfig, CatalogStore, RankedResult};
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> CatalogStore {
    CatalogStore::open(&CatalogConfig::with_db_path(dir.path().join("catalog.sqlite"))).unwrap()
}

fn seed(store: &CatalogStore, rows: &[(&str, &str)]) {
    let rows: Vec<(String, String)> = rows
        .iter()
        .map(|(id, path)| (id.to_string(), path.to_string()))
        .collect();
    store.database().insert_categories(&rows).unwrap();
}

fn seed_demo(store: &CatalogStore) {
    let rows: Vec<(String, String)> = demo_data::DEMO_CATEGORIES
        .iter()
        .map(|c| (c.cat_id.clone(), c.cat_path.clone()))
        .collect();
    store.database().insert_categories(&rows).unwrap();
}

fn ids(results: &[RankedResult]) -> Vec<&str> {
    results.iter().map(|r| r.external_id.as_str()).collect()
}

#[tokio::test]
async fn history_ranks_leaf_matches_first() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed(
        &store,
        &[
            ("SCI034000", "Science|History"),
            ("ARC005030", "Architecture|History|Medieval"),
            ("FIC027150", "Fiction|Romance|History|Medieval"),
            ("FIC027170", "Fiction|Romance|History|Victorian"),
            ("HIS002020", "History|Ancient|Rome"),
        ],
    );

    let results = store.search_categories("his".to_string(), Some(10)).await.unwrap();
    assert_eq!(
        ids(&results),
        vec!["SCI034000", "ARC005030", "FIC027150", "FIC027170", "HIS002020"]
    );
    let scores: Vec<f64> = results.iter().map(|r| r.rank_score).collect();
    assert_eq!(scores, vec![3.0, 9.0, 17.0, 17.0, 19.0]);
    assert_eq!(results[2].display_name, "Fiction / Romance / History / Medieval");
}

#[tokio::test]
async fn percent_encoded_multi_term_query() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed(
        &store,
        &[
            ("OCC028000", "Body, Mind & Spirit|Magick Studies"),
            ("JUV037000", "Juvenile Fiction / Fantasy & Magic"),
        ],
    );

    let results = store.search_categories("magi%20fant".to_string(), None).await.unwrap();
    assert_eq!(ids(&results), vec!["JUV037000", "OCC028000"]);
    assert_eq!(results[0].rank_score, 1.0);
    assert_eq!(results[1].rank_score, 3.0);
    assert_eq!(results[0].display_name, "Juvenile Fiction / Fantasy & Magic");
}

#[tokio::test]
async fn repeated_searches_are_identical() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed_demo(&store);

    let first = store.search_categories("fic his".to_string(), None).await.unwrap();
    assert!(!first.is_empty());
    for _ in 0..5 {
        let again = store.search_categories("fic his".to_string(), None).await.unwrap();
        assert_eq!(first, again);
    }
}

#[tokio::test]
async fn limit_returns_prefix_of_unlimited() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed_demo(&store);

    let all = store.search_categories("his".to_string(), None).await.unwrap();
    assert!(all.len() > 3);
    let limited = store.search_categories("his".to_string(), Some(3)).await.unwrap();
    assert_eq!(limited.as_slice(), &all[..3]);
}

#[tokio::test]
async fn connector_is_never_a_term() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed_demo(&store);

    let with_connector = store
        .search_categories("fantasy%20%26%20magic".to_string(), None)
        .await
        .unwrap();
    let without = store.search_categories("fantasy magic".to_string(), None).await.unwrap();
    assert_eq!(with_connector, without);

    let only = store.search_categories("%26".to_string(), None).await.unwrap();
    assert!(only.is_empty());
}

#[tokio::test]
async fn terms_are_ored() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed_demo(&store);

    let rome = ids(&store.search_categories("rome".to_string(), None).await.unwrap())
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let japan = ids(&store.search_categories("japan".to_string(), None).await.unwrap())
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let both = store.search_categories("rome japan".to_string(), None).await.unwrap();

    for id in rome.iter().chain(japan.iter()) {
        assert!(both.iter().any(|r| &r.external_id == id), "{} missing", id);
    }
    assert_eq!(both.len(), rome.len() + japan.len());
}

#[tokio::test]
async fn matches_only_at_word_starts() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed_demo(&store);

    // "story" sits inside "History" but never starts a word
    let results = store.search_categories("story".to_string(), None).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn search_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = open_store(&dir);
        seed_demo(&store);
    }
    let store = open_store(&dir);
    let results = store.search_categories("nuclear".to_string(), None).await.unwrap();
    assert_eq!(ids(&results), vec!["SCI051000"]);
}
