//! Fixture loading: canned JSON response bodies stored on disk.

use crate::result::{DesviarError, DesviarResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;

/// Loader for fixture documents.
///
/// The directory is passed in explicitly at construction; nothing is derived
/// from the crate's own location and there is no process-wide state. Fixtures
/// are read fresh on every call; a test that rewrites a fixture file between
/// requests sees the new contents on the next match.
#[derive(Debug, Clone)]
pub struct FixtureDir {
    root: PathBuf,
}

impl FixtureDir {
    /// Create a loader rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a fixture name to its path
    #[must_use]
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Read a fixture's raw bytes.
    ///
    /// # Errors
    ///
    /// `FixtureNotFound` if the file is missing; `Io` for any other read
    /// failure. Neither is recovered from; a missing fixture fails the test.
    pub fn read_raw(&self, name: &str) -> DesviarResult<Vec<u8>> {
        let path = self.path_of(name);
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DesviarError::FixtureNotFound {
                    name: name.to_string(),
                    path,
                }
            } else {
                DesviarError::Io(e)
            }
        })
    }

    /// Read and parse a fixture as JSON.
    ///
    /// # Errors
    ///
    /// `FixtureNotFound` for a missing file, `FixtureParse` for malformed
    /// JSON; both propagate uncaught to the caller.
    pub fn load(&self, name: &str) -> DesviarResult<Value> {
        let bytes = self.read_raw(name)?;
        serde_json::from_slice(&bytes).map_err(|source| DesviarError::FixtureParse {
            name: name.to_string(),
            source,
        })
    }

    /// Read and deserialize a fixture into a concrete type
    pub fn load_as<T: DeserializeOwned>(&self, name: &str) -> DesviarResult<T> {
        let bytes = self.read_raw(name)?;
        serde_json::from_slice(&bytes).map_err(|source| DesviarError::FixtureParse {
            name: name.to_string(),
            source,
        })
    }
}
