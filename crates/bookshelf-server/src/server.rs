use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::SharedState;

/// How long browsers may cache a preflight answer.
const CORS_MAX_AGE: Duration = Duration::from_secs(86400);

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(CORS_MAX_AGE)
}

/// All API routes over the given state.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(
            "/books",
            get(handlers::list_books)
                .post(handlers::create_book)
                .put(handlers::update_book)
                .delete(handlers::delete_book),
        )
        .route("/stats", get(handlers::get_statistics))
        .route("/authors", get(handlers::list_authors))
        .route("/book-search", get(handlers::search_catalog))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

/// Handle to a running server. Dropping it stops the server.
pub struct ServerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: SocketAddr,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Base URL clients should use, e.g. `http://127.0.0.1:8080`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Stops accepting connections and waits for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub struct BookshelfServer {
    state: SharedState,
}

impl BookshelfServer {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Binds `addr` and serves in a background task. Port 0 picks a free port.
    pub async fn start(&self, addr: SocketAddr) -> std::io::Result<ServerHandle> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let app = router(self.state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let graceful = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = graceful.await {
                tracing::error!(error = %e, "server error");
            }
        });

        tracing::info!(%local_addr, "bookshelf server listening");
        Ok(ServerHandle {
            shutdown_tx: Some(shutdown_tx),
            local_addr,
            task: Some(task),
        })
    }

    /// Serves on `addr` until Ctrl-C.
    pub async fn serve_until_ctrl_c(&self, addr: SocketAddr) -> std::io::Result<()> {
        let handle = self.start(addr).await?;
        tokio::signal::ctrl_c().await?;
        tracing::info!("shutting down");
        handle.shutdown().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use bookshelf_core::{
        AppConfig, AuthorSummary, Book, BookStatus, CatalogBook, CatalogSearchResponse, Database,
        Statistics,
    };
    use bookshelf_lookup::{CatalogSource, LookupError};
    use reqwest::StatusCode;
    use serde_json::{json, Value};

    use super::*;
    use crate::state::AppState;

    struct StubCatalog;

    #[async_trait]
    impl CatalogSource for StubCatalog {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn search(&self, query: &str, limit: usize) -> bookshelf_lookup::Result<Vec<CatalogBook>> {
            if query == "offline" {
                return Err(LookupError::ApiError("stub".into(), "HTTP 503".into()));
            }
            Ok((1..=limit.min(3))
                .map(|n| CatalogBook {
                    title: format!("{query} vol. {n}"),
                    author: "Stub Author".into(),
                    ..CatalogBook::default()
                })
                .collect())
        }
    }

    async fn spawn() -> (ServerHandle, reqwest::Client) {
        let config = AppConfig::default();
        let state = AppState::new(
            Database::open_in_memory().unwrap(),
            Arc::new(StubCatalog),
            &config,
        );
        let server = BookshelfServer::new(Arc::new(state));
        let handle = server.start("127.0.0.1:0".parse().unwrap()).await.unwrap();
        (handle, reqwest::Client::new())
    }

    async fn create(client: &reqwest::Client, base: &str, body: Value) -> Book {
        let resp = client.post(format!("{base}/books")).json(&body).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        resp.json().await.unwrap()
    }

    #[tokio::test]
    async fn books_crud_round_trip() {
        let (handle, client) = spawn().await;
        let base = handle.base_url();

        let created = create(
            &client,
            &base,
            json!({"title": "Dune", "author": "Frank Herbert", "pages": 612}),
        )
        .await;
        assert_eq!(created.status, BookStatus::Wishlist);
        assert_eq!(created.cover_url, AppConfig::default().library.default_cover_url);

        let mut edited = created.clone();
        edited.status = BookStatus::Read;
        edited.rating = Some(5.0);
        let resp = client.put(format!("{base}/books")).json(&edited).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: Book = resp.json().await.unwrap();
        assert_eq!(updated.status, BookStatus::Read);
        assert_eq!(updated.created_at, created.created_at);

        let read: Vec<Book> = client
            .get(format!("{base}/books?status=read"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(read.len(), 1);
        let wishlist: Vec<Book> = client
            .get(format!("{base}/books?status=wishlist"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(wishlist.is_empty());

        let resp = client
            .delete(format!("{base}/books?id={}", created.id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let all: Vec<Book> = client.get(format!("{base}/books")).send().await.unwrap().json().await.unwrap();
        assert!(all.is_empty());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn rejects_bad_requests() {
        let (handle, client) = spawn().await;
        let base = handle.base_url();
        assert_ne!(handle.port(), 0);

        let resp = client.get(format!("{base}/books?status=reading")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("reading"));

        let resp = client
            .post(format!("{base}/books"))
            .json(&json!({"title": "", "author": "Nobody"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = client
            .post(format!("{base}/books"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = client.delete(format!("{base}/books")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = client.delete(format!("{base}/books?id=abc")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = client.delete(format!("{base}/books?id=404")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = client
            .put(format!("{base}/books"))
            .json(&json!({"id": 77, "title": "Ghost", "author": "Nobody", "status": "read"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = client.patch(format!("{base}/books")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn partial_update_is_rejected_and_keeps_book() {
        let (handle, client) = spawn().await;
        let base = handle.base_url();

        let created = create(
            &client,
            &base,
            json!({"title": "Dune", "author": "Herbert", "status": "read", "cover_url": "c"}),
        )
        .await;

        let resp = client
            .put(format!("{base}/books"))
            .json(&json!({"id": created.id, "title": "Dune", "author": "Herbert"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("status"));

        let books: Vec<Book> = client.get(format!("{base}/books")).send().await.unwrap().json().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].status, BookStatus::Read);
        assert_eq!(books[0].cover_url, "c");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn stats_and_authors() {
        let (handle, client) = spawn().await;
        let base = handle.base_url();

        create(&client, &base, json!({"title": "A", "author": "Lem", "status": "read", "pages": 200, "rating": 4})).await;
        create(&client, &base, json!({"title": "B", "author": "Lem", "status": "read", "pages": 100, "rating": 2})).await;
        create(&client, &base, json!({"title": "C", "author": "Dick", "pages": 300})).await;

        let stats: Statistics = client.get(format!("{base}/stats")).send().await.unwrap().json().await.unwrap();
        assert_eq!(stats.overall.total_read, 2);
        assert_eq!(stats.overall.total_wishlist, 1);
        assert_eq!(stats.overall.total_pages, 300);
        assert!((stats.overall.avg_rating - 3.0).abs() < 1e-9);
        assert_eq!(stats.monthly.len(), 1);
        assert_eq!(stats.monthly[0].books_count, 2);
        assert_eq!(stats.monthly[0].pages_count, 300);

        let authors: Vec<AuthorSummary> =
            client.get(format!("{base}/authors")).send().await.unwrap().json().await.unwrap();
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].name, "Lem");
        assert_eq!(authors[0].books, vec!["B", "A"]);
        assert_eq!(authors[1].pages_read, 300);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn catalog_search() {
        let (handle, client) = spawn().await;
        let base = handle.base_url();

        let found: CatalogSearchResponse = client
            .get(format!("{base}/book-search?q=Hobbit"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(found.total, 3);
        assert_eq!(found.books[0].title, "Hobbit vol. 1");

        let resp = client.get(format!("{base}/book-search?q=%20")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = client.get(format!("{base}/book-search?q=offline")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn health_reports_book_count() {
        let (handle, client) = spawn().await;
        let base = handle.base_url();

        create(&client, &base, json!({"title": "Solaris", "author": "Lem"})).await;

        let health: Value = client.get(format!("{base}/health")).send().await.unwrap().json().await.unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["books"], 1);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn answers_cors_preflight() {
        let (handle, client) = spawn().await;
        let base = handle.base_url();

        let resp = client
            .request(reqwest::Method::OPTIONS, format!("{base}/books"))
            .header("origin", "https://shelf.example.com")
            .header("access-control-request-method", "PUT")
            .header("access-control-request-headers", "content-type")
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert_eq!(resp.headers()["access-control-max-age"], "86400");

        handle.shutdown().await;
    }
}
