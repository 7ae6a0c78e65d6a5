//! Event discovery commands.

use super::{Context, print_json};
use crate::error::ClientResult;

/// Lists the features of the selected event.
pub async fn features(ctx: &Context) -> ClientResult<()> {
    let mut service = ctx.service()?;
    let settings = service.load_settings().await?;

    if ctx.json {
        return print_json(settings);
    }
    print!("{}", ctx.renderer.features_tty(settings));
    Ok(())
}

/// Lists the events published on the portal.
pub async fn events(ctx: &Context) -> ClientResult<()> {
    let events = ctx.source().fetch_events().await?;

    if ctx.json {
        return print_json(&events);
    }
    print!("{}", ctx.renderer.events_tty(&events));
    Ok(())
}
