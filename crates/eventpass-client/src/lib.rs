//! CLI, feed sources, schedule store, favorites, rendering
//!
//! This crate provides the `eventpass` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod favorites;
pub mod http;
pub mod render;
pub mod secret;
pub mod service;
pub mod source;
pub mod store;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
pub use favorites::Favorites;
pub use http::HttpSource;
pub use service::EventService;
pub use source::{BoxFuture, FeedSource, FileSource};
pub use store::{FetchTicket, ScheduleStore, SharedStore};
