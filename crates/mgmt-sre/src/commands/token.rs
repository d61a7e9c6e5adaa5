//! Token command - fetches a bearer token and shows its lifetime.

use anyhow::{Result, bail};
use clap::Args;
use mgmt_sre_auth::TokenInfo;
use serde::Serialize;

use super::Context;

/// Arguments for the token command.
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Print the token value itself
    #[arg(long)]
    pub show_token: bool,
}

#[derive(Debug, Serialize)]
struct TokenOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    issued_at: String,
    refresh_at: String,
    expires_at: String,
    expires_in_secs: u64,
}

/// Run the token command.
pub async fn run(args: TokenArgs, ctx: &Context) -> Result<()> {
    let authenticator = ctx.authenticator()?;
    let Some(bearer) = authenticator.as_bearer() else {
        bail!("the token command needs username, password and auth_url credentials");
    };

    let token = bearer.token().await?;
    let Some(info) = bearer.token_info() else {
        bail!("no token was cached after a successful fetch");
    };

    let output = TokenOutput {
        token: args.show_token.then_some(token),
        issued_at: TokenInfo::format_timestamp(info.issued_at),
        refresh_at: TokenInfo::format_timestamp(info.refresh_at),
        expires_at: TokenInfo::format_timestamp(info.expires_at),
        expires_in_secs: info.expires_in_secs,
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Bearer token issued");
    if let Some(token) = &output.token {
        println!("  Token:   {}", token);
    }
    println!("  Issued:  {}", output.issued_at);
    println!("  Refresh: {}", output.refresh_at);
    println!("  Expires: {} ({})", output.expires_at, info.expires_in_display());
    Ok(())
}
