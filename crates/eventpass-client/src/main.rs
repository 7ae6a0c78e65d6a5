//! eventpass CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use eventpass_client::cli::{Cli, Command, ConfigAction, FavoriteAction, TokenAction};
use eventpass_client::commands::{self, Context};
use eventpass_client::config::{ClientConfig, LoggingSettings};
use eventpass_client::error::ClientResult;
use eventpass_core::{ScheduleFilter, TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = if cli.config.is_some() {
        ClientConfig::load_from(&config_path)?
    } else {
        ClientConfig::load()?
    };
    init_logging(cli.debug, &config.logging);

    // Only built for commands that talk to an event.
    let event = |config: ClientConfig| Context::from_cli(&cli, config);

    match &cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
        Some(Command::Token {
            action: TokenAction::Check { code },
        }) => commands::token::check(code, cli.json),
        Some(Command::Token {
            action: TokenAction::Redeem { code },
        }) => commands::token::redeem(&event(config)?, code).await,
        Some(Command::Schedule {
            day,
            filter,
            search,
        }) => commands::schedule::show(&event(config)?, *day, filter, search.as_deref()).await,
        None => commands::schedule::show(&event(config)?, None, &ScheduleFilter::All, None).await,
        Some(Command::Days) => commands::schedule::days(&event(config)?).await,
        Some(Command::Features) => commands::event::features(&event(config)?).await,
        Some(Command::Events) => commands::event::events(&event(config)?).await,
        Some(Command::Favorite { action }) => {
            let ctx = event(config)?;
            match action {
                FavoriteAction::Add { id } => commands::favorite::add(&ctx, id),
                FavoriteAction::Remove { id } => commands::favorite::remove(&ctx, id),
                FavoriteAction::List => commands::favorite::list(&ctx).await,
            }
        }
        Some(Command::Status) => commands::fastpass::status(&event(config)?).await,
        Some(Command::Use { scenario }) => commands::fastpass::use_scenario(&event(config)?, scenario).await,
        Some(Command::Announcements) => commands::fastpass::announcements(&event(config)?).await,
    }
}

fn init_logging(debug: bool, logging: &LoggingSettings) {
    let mut tracing = if debug {
        TracingConfig::verbose()
    } else {
        TracingConfig::quiet()
    }
    .with_format(logging.format);
    if let (false, Some(directive)) = (debug, logging.directive.as_deref()) {
        tracing = tracing.with_directive(directive);
    }
    if let Err(e) = init_tracing(tracing) {
        eprintln!("warning: logging disabled: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use eventpass_client::error::ClientError;

    fn parse(config: &std::path::Path, args: &[&str]) -> Cli {
        let mut argv = vec!["eventpass", "--config", config.to_str().unwrap()];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    fn empty_config() -> tempfile::NamedTempFile {
        tempfile::NamedTempFile::new().unwrap()
    }

    mod dispatch {
        use super::*;

        #[tokio::test]
        async fn local_commands_need_no_event() {
            let config = empty_config();
            assert!(run(parse(config.path(), &["config", "path"])).await.is_ok());
            assert!(run(parse(config.path(), &["config", "validate"])).await.is_ok());
            assert!(run(parse(config.path(), &["token", "check", "abc123"])).await.is_ok());
        }

        #[tokio::test]
        async fn event_commands_require_an_event() {
            let config = empty_config();
            let err = run(parse(config.path(), &["days"])).await.unwrap_err();
            assert!(matches!(err, ClientError::Config(_)));
        }
    }
}
