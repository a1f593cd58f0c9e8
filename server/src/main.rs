use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gemchat_server::config::{self, KeySource};
use gemchat_server::gateway::Gateway;
use gemchat_server::gemini::GeminiClient;
use gemchat_server::{app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemchat_server=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path =
        std::env::var("GEMCHAT_CONFIG").unwrap_or_else(|_| config::DEFAULT_CONFIG_FILE.to_string());
    let config = config::load_config(&config_path).await?;

    if std::env::var(&config.api_key_env).is_err() {
        tracing::warn!(
            "{} is not set; chat requests will fail until it is",
            config.api_key_env
        );
    }

    let gateway = Gateway::new(
        GeminiClient::new(&config.base_url, &config.model),
        KeySource::Env(config.api_key_env.clone()),
    );
    let app_state = Arc::new(AppState { gateway });
    let router = app(app_state, config.max_body_bytes);

    tracing::info!("model {} via {}", config.model, config.base_url);
    tracing::info!("listening on {}", config.bind);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    axum::serve(listener, router).await?;

    Ok(())
}
