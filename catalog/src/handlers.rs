//! HTTP handlers for the Axum web server.
//!
//! Every catalog endpoint answers `{"result": ...}`. Storage failures surface
//! as 400 `{"detail": "unknown error"}`.

use crate::interface::{
    BookCreate, BookItem, BookView, CatalogApi, CatalogError, CategoryHit, ResultEnvelope,
};
use crate::store::CatalogStore;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct BookIdParams {
    pub book_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HomeMessage {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

/// CatalogError mapped to an HTTP response
pub struct ApiError(CatalogError);

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            CatalogError::UpstreamUnavailable(reason) => {
                tracing::warn!(%reason, "storage request failed");
                (StatusCode::BAD_REQUEST, "unknown error".to_string())
            }
            CatalogError::InvalidInput(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            CatalogError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            other => {
                tracing::error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };
        (status, Json(ErrorDetail { detail })).into_response()
    }
}

type ApiResult<T> = Result<Json<ResultEnvelope<T>>, ApiError>;

fn envelope<T>(result: T) -> ApiResult<T> {
    Ok(Json(ResultEnvelope { result }))
}

pub async fn handle_home() -> Json<HomeMessage> {
    Json(HomeMessage {
        message: "Welcome to the Home Book API".to_string(),
    })
}

pub async fn handle_root() -> Redirect {
    Redirect::temporary("/api/v1")
}

pub async fn handle_search(
    Query(params): Query<SearchParams>,
    Extension(store): Extension<Arc<CatalogStore>>,
) -> ApiResult<Vec<CategoryHit>> {
    let limit = params.limit.unwrap_or(store.default_limit());
    let results = store.search_categories(params.query, Some(limit)).await?;
    envelope(results.into_iter().map(CategoryHit::from).collect())
}

/// Run a synchronous store call on the blocking pool
async fn run_blocking<T, F>(store: Arc<CatalogStore>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&CatalogStore) -> Result<T, CatalogError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || f(&store)).await {
        Ok(result) => Ok(result?),
        Err(_join_error) => Err(ApiError(CatalogError::Cancelled)),
    }
}

pub async fn handle_list_books(
    Query(params): Query<LimitParams>,
    Extension(store): Extension<Arc<CatalogStore>>,
) -> ApiResult<Vec<BookView>> {
    envelope(run_blocking(store, move |s| s.list_books(params.limit)).await?)
}

pub async fn handle_list_books_by_category(
    Query(params): Query<LimitParams>,
    Extension(store): Extension<Arc<CatalogStore>>,
) -> ApiResult<Vec<BookView>> {
    envelope(run_blocking(store, move |s| s.list_books_by_category(params.limit)).await?)
}

pub async fn handle_get_book(
    Query(params): Query<BookIdParams>,
    Extension(store): Extension<Arc<CatalogStore>>,
) -> ApiResult<BookView> {
    envelope(run_blocking(store, move |s| s.get_book(params.book_id)).await?)
}

pub async fn handle_add_book(
    Extension(store): Extension<Arc<CatalogStore>>,
    Json(req): Json<BookCreate>,
) -> Result<Json<BookItem>, ApiError> {
    Ok(Json(run_blocking(store, move |s| s.add_book(req)).await?))
}

pub async fn handle_update_book(
    Extension(store): Extension<Arc<CatalogStore>>,
    Json(req): Json<BookCreate>,
) -> Result<Json<BookItem>, ApiError> {
    Ok(Json(run_blocking(store, move |s| s.update_book(req)).await?))
}

/// All catalog routes with the store attached
pub fn router(store: Arc<CatalogStore>) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/api/v1", get(handle_home))
        .route("/api/v1/categories/search", get(handle_search))
        .route("/api/v1/books/list", get(handle_list_books))
        .route("/api/v1/books/list-by-category", get(handle_list_books_by_category))
        .route("/api/v1/books/add", post(handle_add_book))
        .route("/api/v1/books/", get(handle_get_book).put(handle_update_book))
        .layer(Extension(store))
}

/// Bind `addr` and serve until Ctrl+C
pub async fn serve(store: Arc<CatalogStore>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upstream_error_maps_to_400_unknown_error() {
        let response = ApiError(CatalogError::UpstreamUnavailable("disk I/O".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, serde_json::json!({"detail": "unknown error"}));
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let response = ApiError(CatalogError::NotFound("book x".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["detail"], "book x");
    }

    #[tokio::test]
    async fn test_invalid_input_maps_to_422() {
        let response = ApiError(CatalogError::InvalidInput("bad".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_book_handlers_run_off_the_runtime() {
        let store = Arc::new(CatalogStore::new_in_memory().unwrap());
        store.database().insert_category("HIS002020", "History|Ancient|Rome").unwrap();

        let req = BookCreate {
            id: Uuid::new_v4(),
            title: "SPQR".to_string(),
            author: "Mary Beard".to_string(),
            category: Some("HIS002020".to_string()),
            isbn: None,
            cover_art: None,
        };
        let Json(added) = handle_add_book(Extension(store.clone()), Json(req)).await.ok().unwrap();

        let Json(body) = handle_get_book(
            Query(BookIdParams { book_id: added.id }),
            Extension(store.clone()),
        )
        .await
        .ok()
        .unwrap();
        assert_eq!(body.result.category.as_deref(), Some("History / Ancient / Rome"));

        let missing = handle_get_book(
            Query(BookIdParams { book_id: Uuid::new_v4() }),
            Extension(store),
        )
        .await;
        let response = missing.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_handler_uses_default_limit() {
        let store = Arc::new(CatalogStore::new_in_memory().unwrap());
        for i in 0..15 {
            store
                .database()
                .insert_category(&format!("HIS{:06}", i), &format!("History|Topic {}", i))
                .unwrap();
        }
        let Json(body) = handle_search(
            Query(SearchParams { query: "his".to_string(), limit: None }),
            Extension(store.clone()),
        )
        .await
        .ok()
        .unwrap();
        assert_eq!(body.result.len(), 10);

        let Json(body) = handle_search(
            Query(SearchParams { query: "his".to_string(), limit: Some(3) }),
            Extension(store),
        )
        .await
        .ok()
        .unwrap();
        assert_eq!(body.result.len(), 3);
    }
}
