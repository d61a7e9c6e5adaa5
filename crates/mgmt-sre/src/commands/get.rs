//! Get command - authenticated GET against the service.

use anyhow::{Result, anyhow};
use clap::Args;

use super::Context;

/// Arguments for the get command.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Path relative to the service URL (e.g. "alerts")
    pub path: String,

    /// Query parameters as key=value
    #[arg(short, long = "query", value_parser = parse_query)]
    pub query: Vec<(String, String)>,
}

fn parse_query(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{}'", s))?;
    Ok((key.to_string(), value.to_string()))
}

/// Run the get command.
pub async fn run(args: GetArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    if ctx.verbose {
        eprintln!("GET {}", client.url(&args.path)?);
    }

    let body: serde_json::Value = client.get_with_query(&args.path, &args.query).await?;
    if ctx.json_output {
        println!("{}", serde_json::to_string(&body)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&body)?);
    }
    Ok(())
}
