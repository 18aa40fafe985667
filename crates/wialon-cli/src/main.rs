//! wialon-query - Command-line tool for the Wialon Remote API
//!
//! Opens a session with an access token, runs one command and logs out.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wialon_client::{Session, SessionBuilder, Timestamp};

use crate::config::{ArgOverrides, Config, MergedConfig};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "wialon-query")]
#[command(author, version, about = "Wialon Remote API query tool")]
#[command(propagate_version = true)]
struct Cli {
    /// Access token
    #[arg(short, long, env = "WIALON_ACCESS_TOKEN", hide_env_values = true)]
    token: String,

    /// API host, e.g. https://hst-api.wialon.com
    #[arg(long, env = "WIALON_HOST")]
    host: Option<String>,

    /// API path
    #[arg(long)]
    path: Option<String>,

    /// Per-call timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Configuration file path
    #[arg(short, long, env = "WIALON_QUERY_CONFIG")]
    config: Option<PathBuf>,

    /// Store every request/response pair as JSON in this directory
    #[arg(long, env = "STORE_WIALON_RESPONSES")]
    dump_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the service described in a YAML file ({svc, params})
    Query {
        /// YAML request file
        file: PathBuf,
    },

    /// List units
    Units,

    /// List geofences
    Areas {
        /// Fetch full records including geometry
        #[arg(long)]
        detail: bool,
    },

    /// Count the messages of a unit in an interval
    Count {
        /// Unit ID
        item: i64,

        /// Interval start (seconds, RFC 3339 or "YYYY-MM-DD HH:MM:SS" UTC)
        #[arg(long, value_parser = commands::parse_time)]
        from: Timestamp,

        /// Interval end
        #[arg(long, value_parser = commands::parse_time)]
        to: Timestamp,
    },

    /// Show the messages of a unit in an interval
    Messages {
        /// Unit ID
        item: i64,

        /// Interval start (seconds, RFC 3339 or "YYYY-MM-DD HH:MM:SS" UTC)
        #[arg(long, value_parser = commands::parse_time)]
        from: Timestamp,

        /// Interval end
        #[arg(long, value_parser = commands::parse_time)]
        to: Timestamp,

        /// Calculate sensor values for each message
        #[arg(long)]
        sensors: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(
        ArgOverrides {
            host: cli.host.as_deref(),
            path: cli.path.as_deref(),
            timeout_ms: cli.timeout_ms,
            dump_dir: cli.dump_dir.as_deref(),
        },
        cli.no_color,
    );

    let format = cli
        .output
        .or_else(|| merged.output.as_deref().and_then(OutputFormat::parse))
        .unwrap_or_default();
    let ctx = OutputContext::new(format, merged.no_color, cli.quiet);

    let builder = create_builder(&cli.token, &merged)?;

    // Execute command
    match &cli.command {
        Commands::Query { file } => commands::query(builder, file, &ctx).await,
        Commands::Units => commands::units(builder, &ctx).await,
        Commands::Areas { detail } => commands::areas(builder, *detail, &ctx).await,
        Commands::Count { item, from, to } => {
            commands::count(builder, *item, *from, *to, &ctx).await
        }
        Commands::Messages {
            item,
            from,
            to,
            sensors,
        } => commands::messages(builder, *item, *from, *to, *sensors, &ctx).await,
    }
}

/// Create a session builder from the merged configuration
fn create_builder(token: &str, merged: &MergedConfig) -> Result<SessionBuilder> {
    if let Some(dir) = &merged.session.dump_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create dump directory: {}", dir.display()))?;
    }
    debug!("Using endpoint {}", merged.session.endpoint());
    Ok(Session::builder(token).config(merged.session.clone()))
}
