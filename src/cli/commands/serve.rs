use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;

use crate::config::{config, AppConfig};
use crate::database::{DataStore, DatabaseManager, InMemoryStore, PgStore};
use crate::state::AppState;

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (overrides PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Address to bind (overrides BOOKING_API_BIND)")]
    pub bind: Option<String>,

    #[arg(long, help = "JSON fixtures for the in-memory store, used when DATABASE_URL is unset")]
    pub fixtures: Option<PathBuf>,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let mut app_config = config().clone();
    if let Some(port) = args.port {
        app_config.server.port = port;
    }
    if let Some(bind) = args.bind {
        app_config.server.bind = bind;
    }

    tracing::info!("Starting booking access API in {:?} mode", app_config.environment);
    if app_config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; every protected request will be rejected");
    }

    let store = open_store(&app_config, args.fixtures.as_deref()).await?;

    let addr: SocketAddr = format!("{}:{}", app_config.server.bind, app_config.server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", app_config.server.bind, app_config.server.port))?;

    let app = crate::app(AppState::from_config(app_config, store));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Booking access API listening on http://{}", addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn open_store(app_config: &AppConfig, fixtures: Option<&Path>) -> anyhow::Result<Arc<dyn DataStore>> {
    if app_config.database.url.is_some() {
        if fixtures.is_some() {
            tracing::warn!("DATABASE_URL is set; ignoring --fixtures");
        }
        let pool = DatabaseManager::connect(&app_config.database).await?;
        return Ok(Arc::new(PgStore::new(pool, app_config.database.enable_query_logging)));
    }

    let store = match fixtures {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read fixtures {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("fixtures {} are not valid JSON", path.display()))?;
            InMemoryStore::from_fixtures(value)?
        }
        None => InMemoryStore::new(),
    };
    store.create_collection(&app_config.schema.bookings_table).await;
    store.create_collection(&app_config.schema.properties_table).await;

    tracing::info!("DATABASE_URL not set; serving from the in-memory store");
    Ok(Arc::new(store))
}
