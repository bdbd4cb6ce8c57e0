//! Classify document entries against persisted state.

use std::collections::HashSet;

use crate::fingerprint::Fingerprinted;
use crate::state::SyncState;

/// An entry whose fingerprint changed since the last push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    /// Document identifier.
    pub id: String,
    /// Remote identifier of the stale object.
    pub old_remote_id: String,
    /// New fingerprint.
    pub fingerprint: String,
}

/// A mapped entry whose remote object is left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unchanged {
    /// Document identifier.
    pub id: String,
    /// Remote identifier recorded in state.
    pub remote_id: String,
    /// Fingerprint, identical to the recorded one.
    pub fingerprint: String,
}

/// A mapped entry that is no longer in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// Document identifier.
    pub id: String,
    /// Remote identifier to delete.
    pub remote_id: String,
}

/// Result of diffing the current document against state.
///
/// `create`, `update` and `unchanged` keep the order of the fingerprinted
/// input; `delete` is ordered by document identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    /// Entries with no mapping.
    pub create: Vec<Fingerprinted>,
    /// Entries whose fingerprint changed.
    pub update: Vec<Update>,
    /// Entries whose fingerprint matches.
    pub unchanged: Vec<Unchanged>,
    /// Mappings with no document entry.
    pub delete: Vec<Removal>,
}

impl Diff {
    /// Whether the push would not touch the canvas.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// Diff fingerprinted entries against persisted state.
#[must_use]
pub fn compute_diff(current: &[Fingerprinted], state: &SyncState) -> Diff {
    let mut diff = Diff::default();

    for entry in current {
        match state.get(&entry.id) {
            None => diff.create.push(entry.clone()),
            Some(mapping) if mapping.fingerprint == entry.fingerprint => {
                diff.unchanged.push(Unchanged {
                    id: entry.id.clone(),
                    remote_id: mapping.remote_id.clone(),
                    fingerprint: entry.fingerprint.clone(),
                });
            }
            Some(mapping) => diff.update.push(Update {
                id: entry.id.clone(),
                old_remote_id: mapping.remote_id.clone(),
                fingerprint: entry.fingerprint.clone(),
            }),
        }
    }

    let present: HashSet<&str> = current.iter().map(|e| e.id.as_str()).collect();
    diff.delete = state
        .mappings
        .iter()
        .filter(|(id, _)| !present.contains(id.as_str()))
        .map(|(id, mapping)| Removal {
            id: id.clone(),
            remote_id: mapping.remote_id.clone(),
        })
        .collect();

    diff
}
