//! # drawsync
//!
//! Command line entry point.

use anyhow::Context;
use clap::Parser;
use drawsync_cli::{output, push, AppConfig, CliArgs, Command, FORMAT_REFERENCE};
use drawsync_client::{CanvasApi, CanvasClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing on stderr, with JSON output when `RUST_LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,drawsync_cli=info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from(CliArgs::parse());
    let options = config.push_options();
    let connect = || {
        CanvasClient::new(config.client.clone())
            .with_context(|| format!("cannot use canvas server URL {}", config.client.base_url))
    };

    match &config.command {
        Command::Push { file, .. } => {
            let client = connect()?;
            let report = push(&client, file, &options.unwrap_or_default())
                .await
                .with_context(|| format!("push of {} failed", file.display()))?;
            println!("{report}");
        }
        Command::Health => {
            let client = connect()?;
            let health = client
                .health()
                .await
                .with_context(|| format!("canvas server at {} is not reachable", client.base_url()))?;
            println!("{}", output::health_text(client.base_url().as_str(), &health));
        }
        Command::Query { format } => {
            let client = connect()?;
            let elements = client.list_elements().await.context("listing elements failed")?;
            println!("{}", output::elements(*format, &elements)?);
        }
        Command::Clear => {
            let client = connect()?;
            let removed = client.clear().await.context("clearing the canvas failed")?;
            println!("{}", output::cleared_text(removed));
        }
        Command::Format => println!("{FORMAT_REFERENCE}"),
    }

    Ok(())
}
