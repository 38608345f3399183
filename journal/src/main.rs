// Campaign journal backend
// Entry point: logging, configuration and database bootstrap

use anyhow::Context;
use campaign_journal::app;
use campaign_journal::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = AppConfig::default_location();
    let config = AppConfig::load(&config_path)
        .await
        .with_context(|| format!("loading config from {:?}", config_path))?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting campaign journal");
    tracing::info!("Config loaded from {:?}", config_path);

    let state = app::setup(config).await.context("initializing application")?;

    let info = campaign_journal::commands::get_app_info();
    tracing::info!(
        "{} {} ready, database pool size {}",
        info.name,
        info.version,
        state.repo.pool().size()
    );

    // `register <username>` creates a player and prints its access key
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [command, username] = args.as_slice() {
        if command == "register" {
            let player = state
                .players_service
                .register(username)
                .await
                .context("registering player")?;
            println!(
                "{}",
                serde_json::json!({ "id": player.id, "username": player.username, "accesskey": player.access_key })
            );
        } else {
            anyhow::bail!("unknown command {}", command);
        }
    }

    state.repo.pool().close().await;
    Ok(())
}
