//! Grouping finished waybills into bundles.
//!
//! The pool of ready documents is sorted by key (stably, so equal keys keep
//! their enumeration order) and cut into chunks of at most `chunk_size`
//! members. Each chunk becomes one bundle named after its keys (see
//! [`naming`]); a member leaves the pool only once its bundle is written.

pub mod merger;
pub mod naming;

use serde::Serialize;
use std::path::PathBuf;

use crate::key::{Key, key_of_path};

pub use merger::concatenate;
pub use naming::{bundle_file_name, format_key_ranges};

/// A keyed document waiting to be bundled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolMember {
    /// Key extracted from the file name.
    pub key: Key,
    /// Path of the ready document.
    pub path: PathBuf,
}

/// One planned bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeChunk {
    /// Members in bundle order (ascending key).
    pub members: Vec<PoolMember>,
}

impl MergeChunk {
    /// Keys of the members, in order.
    pub fn keys(&self) -> Vec<Key> {
        self.members.iter().map(|m| m.key).collect()
    }

    /// Paths of the members, in order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.members.iter().map(|m| m.path.clone()).collect()
    }

    /// File name of the bundle.
    pub fn file_name(&self, legacy_suffix: bool) -> String {
        bundle_file_name(&self.keys(), legacy_suffix)
    }
}

/// Settled set of keyed documents to bundle.
#[derive(Debug, Clone, Default)]
pub struct MergePool {
    members: Vec<PoolMember>,
}

impl MergePool {
    /// Build a pool from candidate paths.
    ///
    /// Returns the pool, sorted by key, and the paths that carry no key and
    /// therefore cannot be bundled.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> (Self, Vec<PathBuf>) {
        let mut members = Vec::new();
        let mut unkeyed = Vec::new();
        for path in paths {
            match key_of_path(&path) {
                Some(key) => members.push(PoolMember { key, path }),
                None => unkeyed.push(path),
            }
        }
        members.sort_by_key(|m| m.key);
        (Self { members }, unkeyed)
    }

    /// Members still in the pool, sorted by key.
    pub fn members(&self) -> &[PoolMember] {
        &self.members
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Cut the pool into consecutive chunks of at most `chunk_size` members.
    ///
    /// The last chunk may be shorter. An empty pool plans no chunks.
    pub fn plan(&self, chunk_size: usize) -> Vec<MergeChunk> {
        self.members
            .chunks(chunk_size.max(1))
            .map(|members| MergeChunk {
                members: members.to_vec(),
            })
            .collect()
    }

    /// Remove the members of a written bundle from the pool.
    pub fn consume(&mut self, chunk: &MergeChunk) {
        self.members.retain(|m| !chunk.members.contains(m));
    }
}
