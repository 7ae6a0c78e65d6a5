//! Fast-pass and announcement commands.

use chrono::{Local, Utc};

use super::{Context, print_json};
use crate::error::ClientResult;

/// Shows the attendee's fast-pass status.
pub async fn status(ctx: &Context) -> ClientResult<()> {
    let status = ctx.service()?.load_scenario_status().await?;
    if ctx.json {
        return print_json(&status);
    }
    print!("{}", ctx.renderer.status_tty(&status, Utc::now(), &Local));
    Ok(())
}

/// Redeems a scenario.
pub async fn use_scenario(ctx: &Context, scenario: &str) -> ClientResult<()> {
    let status = ctx.service()?.use_scenario(scenario).await?;
    if ctx.json {
        return print_json(&status);
    }
    println!("Redeemed {}.", scenario);
    print!("{}", ctx.renderer.status_tty(&status, Utc::now(), &Local));
    Ok(())
}

/// Shows announcements, newest first.
pub async fn announcements(ctx: &Context) -> ClientResult<()> {
    let announcements = ctx.service()?.load_announcements().await?;
    if ctx.json {
        return print_json(&announcements);
    }
    print!("{}", ctx.renderer.announcements_tty(&announcements, &Local));
    Ok(())
}
