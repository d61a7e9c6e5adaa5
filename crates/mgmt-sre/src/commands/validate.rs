//! Validate command - checks credentials without touching the network.

use anyhow::Result;
use clap::Args;
use mgmt_sre_auth::Authenticate;
use serde::Serialize;

use super::Context;

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {}

#[derive(Debug, Serialize)]
struct ValidateOutput<'a> {
    valid: bool,
    mode: &'a str,
    authentication_type: &'a str,
}

/// Run the validate command.
pub async fn run(_args: ValidateArgs, ctx: &Context) -> Result<()> {
    let authenticator = ctx.authenticator()?;
    authenticator.validate()?;

    if ctx.json_output {
        let output = ValidateOutput {
            valid: true,
            mode: authenticator.mode(),
            authentication_type: authenticator.authentication_type(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Credentials valid ({})", authenticator.mode());
    }
    Ok(())
}
