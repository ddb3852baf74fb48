/// API сервер калькулятора стоимости

use anyhow::Context;

use transit_cost::{api, Config, ModelContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    // Артефакты загружаются один раз и дальше только читаются
    let context = ModelContext::load(&config.artifacts_dir).with_context(|| {
        format!("failed to load artifacts from {}", config.artifacts_dir.display())
    })?;
    context
        .currencies()
        .rate(&config.default_currency)
        .context("default currency is not in the rate table")?;

    let state = api::AppState::new(context, config.default_currency.clone());
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!("Server listening on http://{}", config.addr);
    axum::serve(listener, app).await?;

    Ok(())
}
