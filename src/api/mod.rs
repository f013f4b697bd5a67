//! Thin HTTP surface: decode, validate, hand off to a component on the
//! blocking pool, encode. Status codes come from [`LibraryError::status_code`].

mod books;
mod borrowers;
mod circulation;
pub mod dto;
mod error;
mod extract;

use std::sync::Arc;

use anyhow::anyhow;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::debug;

use crate::catalog::Catalog;
use crate::circulation::Circulation;
use crate::clock::Clock;
use crate::db::Store;
use crate::error::{AppResult, LibraryError};
use crate::membership::Membership;

/// Components shared by every handler. Each one owns a clone of the same
/// store handle.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub membership: Membership,
    pub circulation: Circulation,
}

impl AppState {
    pub fn new(store: Store, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog: Catalog::new(store.clone()),
            membership: Membership::new(store.clone()),
            circulation: Circulation::new(store, clock),
        }
    }
}

/// The complete HTTP surface: `/health` plus the `/api` resources.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/books", books::routes())
        .nest("/api/borrowers", borrowers::routes())
        .nest("/api/borrow", circulation::routes())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Store access is synchronous SQLite; keep it off the async workers.
/// Logs the handler's `operation` and how it ended.
async fn blocking<T, F>(operation: &'static str, f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| LibraryError::Unexpected(anyhow!("request task failed: {err}")))
        .and_then(|result| result);

    match &result {
        Ok(_) => debug!(operation, "request handled"),
        Err(err) => debug!(operation, kind = err.kind(), error = %err, "request failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn handler_work_logs_operation_and_outcome() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        assert_eq!(blocking("get_book", || Ok(7)).await.unwrap(), 7);
        let err = blocking::<(), _>("delete_book", || {
            Err(LibraryError::Conflict("book is on loan".to_string()))
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "conflict");

        let text = logs.text();
        assert!(text.contains("get_book") && text.contains("request handled"));
        assert!(text.contains("delete_book") && text.contains("request failed"));
        assert!(text.contains("book is on loan"));
    }
}
