//! The reconciliation driver.
//!
//! A push runs validate → compile → (staleness check) → diff → apply →
//! persist. Remote calls are strictly sequential: deletes first, then
//! in-place updates, then a single batch create. The state file is only
//! rewritten once every remote call has succeeded, so a failed push can be
//! retried from the last known-good mapping.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use drawsync_client::{CanvasApi, ClientError, RemoteElement};
use drawsync_core::{
    compute_diff, fingerprint_diagram, validate, CompiledElement, DocumentError, Fingerprinted,
    RawDocument, SkeletonCompiler, StateError, StateFile, SyncState, Unchanged, ValidationError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// How entries whose fingerprint changed reach the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum UpdateStrategy {
    /// Delete the old remote element and create a new one.
    #[default]
    Recreate,
    /// Overwrite the remote element in place, keeping its identifier.
    InPlace,
}

/// Options for a single push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOptions {
    /// Clear the canvas and recreate everything instead of diffing.
    pub full: bool,
    /// Update strategy for changed entries.
    pub strategy: UpdateStrategy,
}

/// Which path a push took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    /// Only changed entries were touched.
    Incremental,
    /// The canvas was cleared and everything recreated.
    Full,
}

/// Outcome of a successful push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReport {
    /// Path taken.
    pub mode: PushMode,
    /// Entries created for the first time.
    pub created: usize,
    /// Entries replaced or updated because they changed.
    pub updated: usize,
    /// Entries removed because they left the document.
    pub deleted: usize,
    /// Entries left alone.
    pub unchanged: usize,
    /// Elements removed by clearing the canvas in full mode.
    pub cleared: usize,
    /// Whether stale state forced a full recreation.
    pub stale_recovered: bool,
    /// Where the new state was written.
    pub state_path: PathBuf,
}

impl fmt::Display for PushReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stale_recovered {
            writeln!(f, "State was stale; recreated the diagram from scratch.")?;
        }
        match self.mode {
            PushMode::Full => write!(
                f,
                "Cleared {} and created {} elements",
                self.cleared, self.created
            )?,
            PushMode::Incremental => write!(
                f,
                "Created {}, updated {}, deleted {}, unchanged {}",
                self.created, self.updated, self.deleted, self.unchanged
            )?,
        }
        write!(f, " (state: {})", self.state_path.display())
    }
}

/// Remote step a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Listing canvas elements for the staleness check.
    List,
    /// Clearing the canvas.
    Clear,
    /// Batch creation.
    Create,
    /// In-place update.
    Update,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::List => "listing canvas elements",
            Self::Clear => "clearing the canvas",
            Self::Create => "creating elements",
            Self::Update => "updating elements",
        })
    }
}

/// Errors that abort a push. None of them leave a rewritten state file.
#[derive(Debug, Error)]
pub enum PushError {
    /// The document could not be read or parsed.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The document is invalid; nothing was sent.
    #[error("invalid diagram: {0}")]
    Validation(#[from] ValidationError),

    /// A remote call failed.
    #[error("{phase} failed: {source}")]
    Remote {
        /// Step that failed.
        phase: Phase,
        /// Underlying client error.
        #[source]
        source: ClientError,
    },

    /// The batch response cannot be matched to the request.
    #[error("batch create returned {got} elements for {expected} requested")]
    BatchMismatch {
        /// Elements sent.
        expected: usize,
        /// Elements returned.
        got: usize,
    },

    /// The state file could not be read or written.
    #[error(transparent)]
    State(#[from] StateError),
}

impl PushError {
    fn remote(phase: Phase) -> impl FnOnce(ClientError) -> Self {
        move |source| Self::Remote { phase, source }
    }
}

/// Mapped entries whose remote element is gone.
#[derive(Debug, Error)]
#[error("{} mapped element(s) missing from the canvas: {}", missing.len(), missing.join(", "))]
struct StaleState {
    missing: Vec<String>,
}

/// Check that every unchanged entry still exists remotely.
fn check_fresh(unchanged: &[Unchanged], remote: &[RemoteElement]) -> Result<(), StaleState> {
    let live: HashSet<&str> = remote.iter().map(|e| e.id.as_str()).collect();
    let missing: Vec<String> = unchanged
        .iter()
        .filter(|u| !live.contains(u.remote_id.as_str()))
        .map(|u| u.id.clone())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(StaleState { missing })
    }
}

/// Compiled skeletons plus fingerprints for one document.
struct Plan {
    compiled: Vec<CompiledElement>,
    fingerprints: Vec<Fingerprinted>,
    by_id: HashMap<String, String>,
}

impl Plan {
    fn build(raw: &RawDocument) -> Result<Self, ValidationError> {
        let diagram = validate(raw)?;
        let compiled = SkeletonCompiler::default().compile(&diagram)?;
        let fingerprints = fingerprint_diagram(&diagram)?;
        let by_id = fingerprints
            .iter()
            .map(|f| (f.id.clone(), f.fingerprint.clone()))
            .collect();
        Ok(Self {
            compiled,
            fingerprints,
            by_id,
        })
    }

    fn fingerprint(&self, id: &str) -> &str {
        self.by_id.get(id).map_or("", String::as_str)
    }

    fn compiled(&self, id: &str) -> Option<&CompiledElement> {
        self.compiled.iter().find(|c| c.id == id)
    }
}

/// Push a diagram file, keeping its state file next to it.
///
/// # Errors
///
/// See [`PushError`]. On error the previous state file is left untouched.
#[tracing::instrument(skip_all, fields(document = %document.display(), full = options.full))]
pub async fn push<A>(api: &A, document: &Path, options: &PushOptions) -> Result<PushReport, PushError>
where
    A: CanvasApi + ?Sized,
{
    let raw = RawDocument::load(document)?;
    let state_file = StateFile::for_document(document);
    let report = push_document(api, &raw, &state_file, options).await?;
    info!(
        created = report.created,
        updated = report.updated,
        deleted = report.deleted,
        unchanged = report.unchanged,
        stale_recovered = report.stale_recovered,
        "push complete"
    );
    Ok(report)
}

/// Push an already parsed document against an explicit state file.
///
/// # Errors
///
/// See [`PushError`]. On error the state file is left untouched.
pub async fn push_document<A>(
    api: &A,
    raw: &RawDocument,
    state_file: &StateFile,
    options: &PushOptions,
) -> Result<PushReport, PushError>
where
    A: CanvasApi + ?Sized,
{
    let plan = Plan::build(raw)?;

    if options.full {
        return recreate(api, &plan, state_file).await;
    }

    let state = state_file.load()?;
    let diff = compute_diff(&plan.fingerprints, &state);
    debug!(
        create = diff.create.len(),
        update = diff.update.len(),
        delete = diff.delete.len(),
        unchanged = diff.unchanged.len(),
        "computed diff"
    );
    if diff.is_noop() {
        debug!("no document changes since the last push");
    }

    if !diff.unchanged.is_empty() {
        let remote = api
            .list_elements()
            .await
            .map_err(PushError::remote(Phase::List))?;
        if let Err(stale) = check_fresh(&diff.unchanged, &remote) {
            warn!("{stale}; falling back to full recreation");
            let mut report = recreate(api, &plan, state_file).await?;
            report.stale_recovered = true;
            return Ok(report);
        }
    }

    for removal in &diff.delete {
        delete_quietly(api, &removal.id, &removal.remote_id).await;
    }

    let mut pending: HashSet<&str> = diff.create.iter().map(|c| c.id.as_str()).collect();
    let mut next = SyncState::default();

    for update in &diff.update {
        match options.strategy {
            UpdateStrategy::Recreate => {
                delete_quietly(api, &update.id, &update.old_remote_id).await;
                pending.insert(&update.id);
            }
            UpdateStrategy::InPlace => {
                let Some(compiled) = plan.compiled(&update.id) else {
                    continue;
                };
                let patch = compiled.skeleton.merge_patch().map_err(|e| {
                    ValidationError::Unencodable {
                        id: update.id.clone(),
                        reason: e.to_string(),
                    }
                })?;
                match api.update_element(&update.old_remote_id, &patch).await {
                    Ok(()) => next.insert(&update.id, &update.old_remote_id, &update.fingerprint),
                    Err(e) if e.is_not_found() => {
                        warn!(
                            "{} ({}) is gone from the canvas, creating it again",
                            update.id, update.old_remote_id
                        );
                        pending.insert(&update.id);
                    }
                    Err(e) => return Err(PushError::remote(Phase::Update)(e)),
                }
            }
        }
    }

    let batch: Vec<&CompiledElement> = plan
        .compiled
        .iter()
        .filter(|c| pending.contains(c.id.as_str()))
        .collect();
    create_batch(api, &plan, &batch, &mut next).await?;

    for unchanged in &diff.unchanged {
        next.insert(&unchanged.id, &unchanged.remote_id, &unchanged.fingerprint);
    }
    state_file.save(&mut next)?;

    Ok(PushReport {
        mode: PushMode::Incremental,
        created: diff.create.len(),
        updated: diff.update.len(),
        deleted: diff.delete.len(),
        unchanged: diff.unchanged.len(),
        cleared: 0,
        stale_recovered: false,
        state_path: state_file.path().to_path_buf(),
    })
}

/// Clear the canvas and create every entry.
async fn recreate<A>(api: &A, plan: &Plan, state_file: &StateFile) -> Result<PushReport, PushError>
where
    A: CanvasApi + ?Sized,
{
    let cleared = api.clear().await.map_err(PushError::remote(Phase::Clear))?;
    debug!("cleared {cleared} elements");

    let batch: Vec<&CompiledElement> = plan.compiled.iter().collect();
    let mut next = SyncState::default();
    create_batch(api, plan, &batch, &mut next).await?;
    state_file.save(&mut next)?;

    Ok(PushReport {
        mode: PushMode::Full,
        created: batch.len(),
        updated: 0,
        deleted: 0,
        unchanged: 0,
        cleared,
        stale_recovered: false,
        state_path: state_file.path().to_path_buf(),
    })
}

/// Create `batch` in one call and record the new mappings, matched by position.
async fn create_batch<A>(
    api: &A,
    plan: &Plan,
    batch: &[&CompiledElement],
    state: &mut SyncState,
) -> Result<(), PushError>
where
    A: CanvasApi + ?Sized,
{
    if batch.is_empty() {
        return Ok(());
    }

    let skeletons: Vec<_> = batch.iter().map(|c| c.skeleton.clone()).collect();
    let created = api
        .create_elements(&skeletons)
        .await
        .map_err(PushError::remote(Phase::Create))?;

    if created.len() != batch.len() {
        return Err(PushError::BatchMismatch {
            expected: batch.len(),
            got: created.len(),
        });
    }

    for (compiled, remote) in batch.iter().zip(created) {
        state.insert(&compiled.id, remote.id, plan.fingerprint(&compiled.id));
    }
    Ok(())
}

/// Delete a remote element; any failure counts as already deleted.
async fn delete_quietly<A>(api: &A, id: &str, remote_id: &str)
where
    A: CanvasApi + ?Sized,
{
    match api.delete_element(remote_id).await {
        Ok(()) => debug!("deleted {id} ({remote_id})"),
        Err(e) if e.is_not_found() => debug!("{id} ({remote_id}) was already gone"),
        Err(e) => warn!("failed to delete {id} ({remote_id}), continuing: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unchanged(id: &str, remote_id: &str) -> Unchanged {
        Unchanged {
            id: id.into(),
            remote_id: remote_id.into(),
            fingerprint: "0000000000000000".into(),
        }
    }

    fn remote(id: &str) -> RemoteElement {
        serde_json::from_value(serde_json::json!({ "id": id })).expect("element")
    }

    #[test]
    fn test_check_fresh() {
        let live = [remote("r1"), remote("r2"), remote("other")];
        assert!(check_fresh(&[unchanged("a", "r1"), unchanged("b", "r2")], &live).is_ok());

        let stale = check_fresh(&[unchanged("a", "r1"), unchanged("c", "r3")], &live).unwrap_err();
        assert_eq!(stale.missing, ["c"]);
        assert_eq!(
            stale.to_string(),
            "1 mapped element(s) missing from the canvas: c"
        );
    }

    #[test]
    fn test_report_display() {
        let report = PushReport {
            mode: PushMode::Incremental,
            created: 1,
            updated: 2,
            deleted: 0,
            unchanged: 5,
            cleared: 0,
            stale_recovered: false,
            state_path: PathBuf::from("arch.state.json"),
        };
        assert_eq!(
            report.to_string(),
            "Created 1, updated 2, deleted 0, unchanged 5 (state: arch.state.json)"
        );

        let full = PushReport {
            mode: PushMode::Full,
            created: 3,
            cleared: 7,
            stale_recovered: true,
            ..report
        };
        assert_eq!(
            full.to_string(),
            "State was stale; recreated the diagram from scratch.\nCleared 7 and created 3 elements (state: arch.state.json)"
        );
    }

    #[test]
    fn test_phase_named_in_error() {
        let err = PushError::remote(Phase::Create)(ClientError::Status {
            status: 502,
            body: "bad gateway".into(),
        });
        assert_eq!(
            err.to_string(),
            "creating elements failed: canvas server returned 502: bad gateway"
        );
    }
}
