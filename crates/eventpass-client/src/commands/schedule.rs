//! Schedule commands.

use chrono::{Local, Utc};
use eventpass_core::{ScheduleFilter, apply, search};
use tracing::debug;

use super::{Context, print_json};
use crate::error::ClientResult;

/// Shows one filtered day, or search results across all days.
pub async fn show(
    ctx: &Context,
    day: Option<u32>,
    filter: &ScheduleFilter,
    query: Option<&str>,
) -> ClientResult<()> {
    let mut service = ctx.service()?;
    let schedule = service.load_schedule().await?;
    let favorites = ctx.favorites()?;
    let now = Utc::now();

    if let Some(query) = query {
        let hits = search(&schedule, query, ctx.renderer.options().language);
        debug!(query, hits = hits.len(), "searched schedule");
        if ctx.json {
            let sessions: Vec<_> = hits
                .iter()
                .map(|session| ctx.renderer.session_json(&schedule, session, &favorites, now))
                .collect();
            return print_json(&sessions);
        }
        print!("{}", ctx.renderer.search_tty(&schedule, query, &hits, &favorites, now));
        return Ok(());
    }

    if schedule.is_empty() {
        if ctx.json {
            return print_json(&Vec::<()>::new());
        }
        println!("The schedule has no sessions.");
        return Ok(());
    }

    let day_index = match day {
        Some(number) => (number as usize).saturating_sub(1),
        None => schedule.default_day_index(Local::now().date_naive()),
    };
    let slots = apply(&schedule, day_index, filter, &favorites)?;

    if ctx.json {
        let view = ctx
            .renderer
            .schedule_json(&schedule, day_index, filter, &slots, &favorites, now);
        return print_json(&view);
    }
    print!(
        "{}",
        ctx.renderer
            .schedule_tty(&schedule, day_index, filter, &slots, &favorites, now)
    );
    Ok(())
}

/// Lists the days of the schedule.
pub async fn days(ctx: &Context) -> ClientResult<()> {
    let mut service = ctx.service()?;
    let schedule = service.load_schedule().await?;
    let today = Local::now().date_naive();

    if ctx.json {
        return print_json(&ctx.renderer.days_json(&schedule, today));
    }
    print!("{}", ctx.renderer.days_tty(&schedule, today));
    Ok(())
}
