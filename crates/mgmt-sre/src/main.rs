//! mgmt-sre - command-line access to the management SRE API.
//!
//! Main entry point for the CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{get, token, validate};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// mgmt-sre - Backup and recovery management SRE API client
#[derive(Parser)]
#[command(name = "mgmt-sre")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// TOML file with api_key or username/password/auth_url
    #[arg(long, global = true, env = "MGMT_SRE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Service name used to derive environment variable names
    #[arg(long, global = true, default_value = mgmt_sre_auth::DEFAULT_SERVICE_NAME)]
    pub service_name: String,

    /// Service URL (default: https://management-sre-api.cloud.ibm.com/v2)
    #[arg(long, global = true, env = "MGMT_SRE_URL")]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that credentials are complete
    Validate(validate::ValidateArgs),

    /// Fetch a bearer token and show its lifetime
    Token(token::TokenArgs),

    /// Send an authenticated GET request
    Get(get::GetArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "mgmt_sre=debug,mgmt_sre_auth=debug,mgmt_sre_client=debug,info"
    } else {
        "mgmt_sre=info,mgmt_sre_auth=info,mgmt_sre_client=info,warn"
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
                ),
        )
        .init();

    let ctx = commands::Context {
        service_name: cli.service_name,
        config_path: cli.config,
        url: cli.url,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Validate(args) => validate::run(args, &ctx).await,
        Commands::Token(args) => token::run(args, &ctx).await,
        Commands::Get(args) => get::run(args, &ctx).await,
    }
}
