//! Favorite sessions, persisted per event as a JSON list of session ids.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use eventpass_core::FavoriteSet;
use tracing::{debug, warn};

use crate::error::ClientResult;

/// The attendee's favorite session ids for one event.
#[derive(Debug)]
pub struct Favorites {
    ids: BTreeSet<String>,
    path: PathBuf,
}

impl Favorites {
    /// Loads favorites from `path`, falling back to an empty set when the
    /// file is missing or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<String>>(&content) {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring corrupt favorites file");
                    BTreeSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read favorites file");
                BTreeSet::new()
            }
        };
        debug!(path = %path.display(), count = ids.len(), "loaded favorites");
        Self { ids, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists the current set to disk.
    pub fn save(&self) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let ids: Vec<&String> = self.ids.iter().collect();
        let json = serde_json::to_string_pretty(&ids).map_err(std::io::Error::other)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Adds a session id. Returns false if it was already a favorite.
    pub fn add(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    /// Removes a session id. Returns false if it was not a favorite.
    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    /// Flips membership of a session id; returns the new membership.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FavoriteSet for Favorites {
    fn contains_session(&self, id: &str) -> bool {
        self.contains(id)
    }
}
