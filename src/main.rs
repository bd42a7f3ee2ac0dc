/// Marketplace Admin Service
///
/// Entry point: logging, configuration, application context, HTTP server.
use anyhow::Context;
use marketplace_admin::{config::DEFAULT_LOG_FILTER, server, AppContext, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so the log format can follow it
    let config = ServerConfig::from_env().context("failed to load configuration")?;

    init_tracing(&config.logging.level, config.logging.json);

    // Print banner
    print_banner();

    // Create application context
    let ctx = AppContext::new(config)
        .await
        .context("failed to initialize application context")?;

    // Start server
    server::serve(ctx).await.context("server terminated")?;

    Ok(())
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn print_banner() {
    println!(
        r#"
    __  ___         __        __        __                    __          _
   /  |/  /__ _____/ /_____  / /____   / /__    ___ ____  ___/ /_ _  (_)__
  / /|_/ / _ `/ __/  '_/ -_)/ __/ _ \ / / _ \  / _ `/ _ \/ _  /  ' \/ / _ \
 /_/  /_/\_,_/_/ /_/\_\\__/ \__/ .__//_/\___/  \_,_/\___/\_,_/_/_/_/_/_//_/
                              /_/
        Marketplace Admin Service v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
