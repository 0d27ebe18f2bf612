//! Mood companion web server
//!
//! (c) Softlandia 2025

use moodmoji_api::api;
use moodmoji_api::config::{GatewayConfig, ServerConfig};
use moodmoji_api::core::proxy::GatewayChatProxy;
use moodmoji_api::core::services::{
    CompanionAvatarService, CompanionChatService, CompanionJournalService, CompanionMoodService,
};
use moodmoji_api::infrastructure::database::DatabaseConnection;
use moodmoji_api::infrastructure::repositories::{
    DbJournalRepository, DbMessageRepository, DbMoodLogRepository, DbProfileRepository,
};

use anyhow::anyhow;
use di::{Injectable, ServiceCollection};
use di_axum::RouterServiceProviderExtensions;
use log::{info, warn};
use tokio::runtime::{Builder, Runtime};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(web_server_task(ServerConfig::from_env()))
}

async fn web_server_task(config: ServerConfig) -> anyhow::Result<()> {
    let provider = ServiceCollection::new()
        .add(DatabaseConnection::singleton())
        .add(GatewayConfig::singleton())
        .add(GatewayChatProxy::singleton())
        .add(DbMessageRepository::scoped())
        .add(DbMoodLogRepository::scoped())
        .add(DbJournalRepository::scoped())
        .add(DbProfileRepository::scoped())
        .add(CompanionChatService::scoped())
        .add(CompanionMoodService::scoped())
        .add(CompanionJournalService::scoped())
        .add(CompanionAvatarService::scoped())
        .build_provider()
        .map_err(|e| anyhow!("invalid service registrations: {e:?}"))?;

    info!("using database {}", moodmoji_api::config::database_url());
    provider
        .get_required::<DatabaseConnection>()
        .migrate()
        .await
        .map_err(|e| anyhow!("failed to run migrations: {e}"))?;

    if provider.get_required::<GatewayConfig>().api_key.is_none() {
        warn!("LLM_GATEWAY_API_KEY is not set, chat requests will fail");
    }

    // browser clients call from any origin, including preflight requests
    let app = api::router()
        .layer(
            ServiceBuilder::new().layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_provider(provider);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    info!("Shutting down...");

    Ok(())
}
