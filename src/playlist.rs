//! Ordered, duplicate-free list of track paths.
//!
//! A track's identity is its path; its position here is its index. The
//! playlist never touches playback state.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{PlayerError, Result};

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    paths: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every path not already present, in arrival order.
    ///
    /// Returns how many paths were added. Empty input is rejected.
    pub fn merge<I, P>(&mut self, paths: I) -> Result<usize>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut offered = 0usize;
        let mut added = 0usize;
        for p in paths {
            offered += 1;
            let p = p.into();
            if self.seen.insert(p.clone()) {
                self.paths.push(p);
                added += 1;
            }
        }
        if offered == 0 {
            return Err(PlayerError::validation("empty playlist"));
        }
        Ok(added)
    }

    pub fn get(&self, index: usize) -> Result<&Path> {
        self.paths
            .get(index)
            .map(PathBuf::as_path)
            .ok_or(PlayerError::Index {
                index,
                len: self.paths.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Position of `path`, or `None` when it is not in the playlist.
    pub fn index_of(&self, path: &Path) -> Option<usize> {
        if !self.seen.contains(path) {
            return None;
        }
        self.paths.iter().position(|p| p == path)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}
