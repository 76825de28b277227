use crate::api::ApiServer;
use crate::assistant::ActionRegistry;
use crate::config::Config;
use crate::db::Database;
use crate::execution::ExecutionClient;
use crate::store::DocumentStore;
use anyhow::Result;
use tracing::info;

pub async fn run_service() -> Result<()> {
    info!("Starting pairview service");

    let config = Config::load()?;

    let db = Database::open()?;
    let store = DocumentStore::new(db.clone());
    let executor = ExecutionClient::new(config.execution.endpoint.clone());
    let registry = ActionRegistry::new(db.clone());

    let api_server = ApiServer::new(store, executor, registry, db, &config);

    info!("pairview is ready!");

    api_server.start().await
}
