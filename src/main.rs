mod activity;
mod api;
mod case;
mod config;
mod dashboard;
mod directory;
mod ids;
mod persistence;
mod project;
mod suggestion;
mod suite;
mod validation;
mod wizard;

use crate::api::{build_api, AppState};
use crate::config::Config;
use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "testdeck=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    info!(?config, "Loaded configuration");

    let app_state = AppState::from_config(&config)
        .await
        .context("failed to initialise application state")?;
    let router = build_api(app_state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!("Listening on {}", address);
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
