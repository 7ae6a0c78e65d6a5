//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eventpass_core::ScheduleFilter;

/// eventpass - conference schedule and fast pass in the terminal
#[derive(Debug, Parser)]
#[command(name = "eventpass")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "EVENTPASS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Event identifier (overrides `[event] id`)
    #[arg(long, short, global = true)]
    pub event: Option<String>,

    /// Access token for fast pass and announcements
    #[arg(long, global = true, env = "EVENTPASS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    // --- Offline sources ---
    /// Read the schedule feed from a local file
    #[arg(long, global = true)]
    pub feed: Option<PathBuf>,

    /// Read event settings from a local file
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Read fast-pass status from a local file
    #[arg(long, global = true)]
    pub status_file: Option<PathBuf>,

    /// Read announcements from a local file
    #[arg(long, global = true)]
    pub announcements_file: Option<PathBuf>,

    /// Display language (zh or en, overrides `[display] language`)
    #[arg(long, global = true)]
    pub language: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Returns true if any local file replaces the portal.
    pub fn uses_local_files(&self) -> bool {
        self.feed.is_some()
            || self.settings.is_some()
            || self.status_file.is_some()
            || self.announcements_file.is_some()
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show one day of the schedule
    Schedule {
        /// Day number, starting at 1 (default: today, else the first day)
        #[arg(long, short, value_parser = clap::value_parser!(u32).range(1..))]
        day: Option<u32>,

        /// all, favorites, tag:ID, type:ID, room:ID or speaker:ID
        #[arg(long, short, default_value = "all")]
        filter: ScheduleFilter,

        /// Search titles, speakers and descriptions across all days
        #[arg(long, short, conflicts_with_all = ["day", "filter"])]
        search: Option<String>,
    },

    /// List the days of the schedule
    Days,

    /// List the features of the event
    Features,

    /// List the events published on the portal
    Events,

    /// Access token commands
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Manage favorite sessions
    Favorite {
        #[command(subcommand)]
        action: FavoriteAction,
    },

    /// Show fast-pass status
    Status,

    /// Redeem a fast-pass scenario
    Use {
        /// Scenario identifier (see `eventpass status`)
        scenario: String,
    },

    /// Show announcements
    Announcements,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Access token actions.
#[derive(Debug, Subcommand)]
pub enum TokenAction {
    /// Check a token's format without contacting the event
    Check {
        /// Token, or a link or QR payload carrying one
        code: String,
    },

    /// Verify a token against the event's fast pass
    Redeem {
        /// Token, or a link or QR payload carrying one
        code: String,
    },
}

/// Favorite actions.
#[derive(Debug, Subcommand)]
pub enum FavoriteAction {
    /// Add a session to favorites
    Add { id: String },

    /// Remove a session from favorites
    Remove { id: String },

    /// List favorite sessions
    List,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
