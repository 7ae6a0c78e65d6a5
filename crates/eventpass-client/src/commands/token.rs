//! Access token commands.

use chrono::{Local, Utc};
use eventpass_core::AccessToken;
use serde::Serialize;

use super::{Context, print_json};
use crate::error::ClientResult;

#[derive(Serialize)]
struct TokenCheck<'a> {
    valid: bool,
    token: &'a str,
}

/// Checks the format of a token, link or QR payload.
pub fn check(code: &str, json: bool) -> ClientResult<()> {
    let token = AccessToken::from_code(code)?;
    if json {
        return print_json(&TokenCheck {
            valid: true,
            token: token.as_str(),
        });
    }
    println!("Token format is valid: {}", token.as_str());
    Ok(())
}

/// Verifies a token against the event's fast pass and shows the status.
pub async fn redeem(ctx: &Context, code: &str) -> ClientResult<()> {
    let token = AccessToken::from_code(code)?;
    let mut service = ctx.service()?;
    let status = service.redeem_token(token.as_str()).await?;

    if ctx.json {
        return print_json(&status);
    }
    println!("Token accepted.");
    print!("{}", ctx.renderer.status_tty(&status, Utc::now(), &Local));
    println!();
    println!("The token is not saved. Pass it with --token or EVENTPASS_TOKEN, or");
    println!("set [event] token to a pass:: or env:: reference in config.toml.");
    Ok(())
}
