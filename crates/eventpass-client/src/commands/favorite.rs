//! Favorite session commands.

use tracing::warn;

use super::{Context, print_json};
use crate::error::ClientResult;

/// Adds a session to the favorites of the selected event.
pub fn add(ctx: &Context, id: &str) -> ClientResult<()> {
    let mut favorites = ctx.favorites()?;
    if favorites.add(id) {
        favorites.save()?;
        println!("Added {} to favorites.", id);
    } else {
        println!("{} is already a favorite.", id);
    }
    Ok(())
}

/// Removes a session from the favorites of the selected event.
pub fn remove(ctx: &Context, id: &str) -> ClientResult<()> {
    let mut favorites = ctx.favorites()?;
    if favorites.remove(id) {
        favorites.save()?;
        println!("Removed {} from favorites.", id);
    } else {
        println!("{} is not a favorite.", id);
    }
    Ok(())
}

/// Lists favorites, with titles when the schedule can be loaded.
pub async fn list(ctx: &Context) -> ClientResult<()> {
    let favorites = ctx.favorites()?;
    if ctx.json {
        return print_json(&favorites.iter().collect::<Vec<_>>());
    }
    if favorites.is_empty() {
        println!("No favorites.");
        return Ok(());
    }

    let schedule = match ctx.service()?.load_schedule().await {
        Ok(schedule) => Some(schedule),
        Err(e) => {
            warn!(error = %e, "listing favorites without titles");
            None
        }
    };
    let language = ctx.renderer.options().language;

    for id in favorites.iter() {
        match schedule.as_ref().and_then(|schedule| schedule.session(id)) {
            Some(session) => println!(
                "{:<16} {} {}  {}",
                id,
                session.start.date(),
                session.start.clock(),
                session.title(language)
            ),
            None => println!("{}", id),
        }
    }
    Ok(())
}
