//! REST API server for pairview.
//!
//! Provides HTTP endpoints for:
//! - Code documents (read, write, run, WebSocket sync session)
//! - Assistant actions (descriptors, invocation)
//! - Interview and user records
//! - The supported language table

pub mod error;
pub mod routes;

use crate::assistant::ActionRegistry;
use crate::config::Config;
use crate::db::Database;
use crate::execution::ExecutionClient;
use crate::languages;
use crate::store::DocumentStore;
use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tracing::info;

pub use routes::documents::DocumentState;

pub struct ApiServer {
    port: u16,
    documents: DocumentState,
    assistant: routes::assistant::AssistantState,
    records: routes::interviews::RecordsState,
}

impl ApiServer {
    pub fn new(
        store: DocumentStore,
        executor: ExecutionClient,
        registry: ActionRegistry,
        db: Database,
        config: &Config,
    ) -> Self {
        Self {
            port: config.server.port,
            documents: DocumentState {
                store,
                executor,
                debounce: Duration::from_millis(config.sync.debounce_ms),
            },
            assistant: routes::assistant::AssistantState {
                registry: Arc::new(registry),
            },
            records: routes::interviews::RecordsState { db },
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            .route("/", get(status))
            .route("/version", get(version))
            .route("/languages", get(list_languages))
            .nest("/documents", routes::documents::router(self.documents))
            .nest("/assistant", routes::assistant::router(self.assistant))
            .nest("/interviews", routes::interviews::router(self.records.clone()))
            .nest("/users", routes::users::router(self.records))
            .layer(ServiceBuilder::new());

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("API server listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET  /                          - Service info");
        info!("  GET  /version                   - Version info");
        info!("  GET  /languages                 - Supported language table");
        info!("  GET  /documents/:id             - Full code document");
        info!("  PUT  /documents/:id/code        - Write code buffer");
        info!("  PUT  /documents/:id/language    - Write language selection");
        info!("  PUT  /documents/:id/output      - Write execution output");
        info!("  POST /documents/:id/run         - Execute the buffer");
        info!("  GET  /documents/:id/session     - WebSocket sync session");
        info!("  GET  /assistant/actions         - Assistant action descriptors");
        info!("  POST /assistant/actions/:name   - Invoke an assistant action");
        info!("  GET  /interviews                - List interviews");
        info!("  POST /interviews                - Create an interview");
        info!("  PUT  /interviews/:id/status     - Update interview status");
        info!("  GET  /users                     - List users");
        info!("  POST /users                     - Create a user");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "pairview",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "pairview"
    }))
}

async fn list_languages() -> Json<Value> {
    Json(json!({ "languages": languages::LANGUAGES }))
}
