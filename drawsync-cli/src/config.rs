//! Command-line arguments and the configuration derived from them.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use drawsync_client::{ClientConfig, RetryConfig, DEFAULT_BASE_URL};

use crate::output::QueryFormat;
use crate::push::{PushOptions, UpdateStrategy};

/// Command-line arguments for drawsync.
#[derive(Debug, Clone, Parser)]
#[command(name = "drawsync")]
#[command(about = "Push declarative YAML diagrams to an Excalidraw canvas server")]
#[command(version)]
pub struct CliArgs {
    /// Canvas server URL
    #[arg(long, global = true, env = "DRAWSYNC_URL", default_value = DEFAULT_BASE_URL)]
    pub url: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "DRAWSYNC_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Retries for transient failures (0 disables retrying)
    #[arg(long, global = true, env = "DRAWSYNC_RETRIES", default_value_t = 2)]
    pub retries: u32,

    /// Delay before the first retry in milliseconds; doubles on each retry
    #[arg(long, global = true, env = "DRAWSYNC_RETRY_DELAY_MS", default_value_t = 200)]
    pub retry_delay_ms: u64,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// drawsync subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Push a diagram, touching only what changed since the last push
    Push {
        /// Diagram YAML file
        file: PathBuf,

        /// Clear the canvas and recreate every element
        #[arg(long)]
        clear: bool,

        /// How changed elements are applied
        #[arg(long, value_enum, default_value_t = UpdateStrategy::Recreate)]
        update_strategy: UpdateStrategy,
    },

    /// Check that the canvas server is up
    Health,

    /// List the elements on the canvas
    Query {
        /// Output format
        #[arg(long, value_enum, default_value_t = QueryFormat::Text)]
        format: QueryFormat,
    },

    /// Remove every element from the canvas
    Clear,

    /// Print the diagram file format reference
    Format,
}

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Canvas client settings.
    pub client: ClientConfig,
    /// Command to run.
    pub command: Command,
}

impl AppConfig {
    /// Push options, if the command is a push.
    #[must_use]
    pub fn push_options(&self) -> Option<PushOptions> {
        match &self.command {
            Command::Push {
                clear,
                update_strategy,
                ..
            } => Some(PushOptions {
                full: *clear,
                strategy: *update_strategy,
            }),
            _ => None,
        }
    }
}

impl From<CliArgs> for AppConfig {
    fn from(args: CliArgs) -> Self {
        let defaults = RetryConfig::default();
        let retry = RetryConfig::new(
            args.retries.saturating_add(1),
            args.retry_delay_ms,
            defaults.max_delay_ms.max(args.retry_delay_ms),
            defaults.multiplier,
        );

        Self {
            client: ClientConfig::new(args.url)
                .with_timeout(Duration::from_secs(args.timeout_secs))
                .with_retry(retry),
            command: args.command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_push_arguments() {
        let args = CliArgs::try_parse_from([
            "drawsync",
            "--url",
            "http://canvas:4000",
            "push",
            "arch.yaml",
            "--clear",
            "--update-strategy",
            "in-place",
        ])
        .expect("parse");
        let config = AppConfig::from(args);

        assert_eq!(config.client.base_url, "http://canvas:4000");
        assert_eq!(
            config.push_options(),
            Some(PushOptions {
                full: true,
                strategy: UpdateStrategy::InPlace,
            })
        );
        match config.command {
            Command::Push { file, .. } => assert_eq!(file, PathBuf::from("arch.yaml")),
            other => panic!("expected push, got {other:?}"),
        }
    }

    #[test]
    fn test_retry_flags_become_policy() {
        let args = CliArgs::try_parse_from([
            "drawsync",
            "health",
            "--retries",
            "4",
            "--retry-delay-ms",
            "50",
            "--timeout-secs",
            "3",
        ])
        .expect("parse");
        let config = AppConfig::from(args);

        assert_eq!(config.client.retry.max_attempts, 5);
        assert_eq!(config.client.retry.initial_delay_ms, 50);
        assert_eq!(config.client.timeout, Duration::from_secs(3));
        assert_eq!(config.push_options(), None);
    }

    #[test]
    fn test_query_format_defaults_to_text() {
        let args = CliArgs::try_parse_from(["drawsync", "query"]).expect("parse");
        assert_eq!(
            args.command,
            Command::Query {
                format: QueryFormat::Text
            }
        );
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let result = CliArgs::try_parse_from([
            "drawsync",
            "push",
            "a.yaml",
            "--update-strategy",
            "merge",
        ]);
        assert!(result.is_err());
    }
}
