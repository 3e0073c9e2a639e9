//! Rewrite coordinator
//!
//! Runs one independent rewrite task per candidate document on a bounded
//! pool and collects a manifest of per-file outcomes:
//! - Enumerate allow-listed documents under the duplicate root
//! - Rewrite each on a `JoinSet`, with a semaphore bounding concurrency
//! - Report progress after every finished task, whatever its outcome

use crate::config::DuplicatorConfig;
use crate::error::{ConfigError, DuplicateError, Result, RewriteError};
use crate::identifier::IdentifierMap;
use crate::progress::{CancellationFlag, Progress, ProgressSink, ProgressTracker};
use crate::tree;
use dirdup_document::{DocumentCodec, DocumentError, DocumentTreeWalker, FormatArranger, YamlCodec};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// Why a file was not processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No file at the same relative path in the origin tree
    NoOriginCounterpart,
    /// Cancellation was requested before the task started
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOriginCounterpart => f.write_str("no origin counterpart"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Result of one rewrite task
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// References were replaced and the file was written
    Rewritten {
        /// Number of replaced reference values
        replaced: usize,
    },
    /// Nothing matched; the file was not touched
    Unchanged,
    /// The file was not processed
    Skipped {
        /// Why
        reason: SkipReason,
    },
    /// The task failed; the file was not written
    Failed {
        /// What went wrong
        #[serde(serialize_with = "serialize_display")]
        error: Arc<RewriteError>,
    },
}

impl OutcomeStatus {
    fn failed(error: RewriteError) -> Self {
        Self::Failed {
            error: Arc::new(error),
        }
    }

    /// True for `Failed`
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

fn serialize_display<S: Serializer>(
    error: &Arc<RewriteError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Outcome for one document, keyed by its path relative to the duplicate root
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    /// Relative document path
    pub path: PathBuf,
    /// What happened
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

/// Aggregate counts of a manifest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ManifestSummary {
    /// Files written with new references
    pub rewritten: usize,
    /// Files left untouched
    pub unchanged: usize,
    /// Files not processed
    pub skipped: usize,
    /// Files whose task failed
    pub failed: usize,
    /// Reference values replaced across all files
    pub references_replaced: usize,
}

/// Per-file outcomes of a batch, sorted by path
#[derive(Debug, Clone, Default, Serialize)]
pub struct RewriteManifest {
    /// Aggregate counts
    pub summary: ManifestSummary,
    /// Final progress value
    pub progress: Progress,
    /// One entry per scheduled document
    pub outcomes: Vec<FileOutcome>,
}

impl RewriteManifest {
    /// Build manifest from outcomes
    #[must_use]
    pub fn new(mut outcomes: Vec<FileOutcome>, progress: Progress) -> Self {
        outcomes.sort_by(|a, b| a.path.cmp(&b.path));
        let mut summary = ManifestSummary::default();
        for outcome in &outcomes {
            match &outcome.status {
                OutcomeStatus::Rewritten { replaced } => {
                    summary.rewritten += 1;
                    summary.references_replaced += replaced;
                }
                OutcomeStatus::Unchanged => summary.unchanged += 1,
                OutcomeStatus::Skipped { .. } => summary.skipped += 1,
                OutcomeStatus::Failed { .. } => summary.failed += 1,
            }
        }
        Self {
            summary,
            progress,
            outcomes,
        }
    }

    /// True when any task failed
    #[inline]
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }

    /// Failed outcomes
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_failure())
    }

    /// Outcome for a relative path
    #[must_use]
    pub fn outcome(&self, path: impl AsRef<Path>) -> Option<&OutcomeStatus> {
        let path = path.as_ref();
        self.outcomes
            .iter()
            .find(|o| o.path == path)
            .map(|o| &o.status)
    }
}

/// State shared read-only by every task of one batch
struct RewriteContext {
    codec: Arc<dyn DocumentCodec>,
    walker: DocumentTreeWalker,
    arranger: FormatArranger,
    map: Arc<IdentifierMap>,
    cancellation: Option<CancellationFlag>,
}

impl RewriteContext {
    #[tracing::instrument(level = "debug", skip_all, fields(file = %target.display()))]
    async fn run(&self, target: &Path, origin: &Path) -> OutcomeStatus {
        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
        {
            return OutcomeStatus::Skipped {
                reason: SkipReason::Cancelled,
            };
        }

        let has_origin = tokio::fs::metadata(origin)
            .await
            .is_ok_and(|meta| meta.is_file());
        if !has_origin {
            tracing::warn!("Skipping {}: no origin counterpart", target.display());
            return OutcomeStatus::Skipped {
                reason: SkipReason::NoOriginCounterpart,
            };
        }

        match self.rewrite(target, origin).await {
            Ok(0) => {
                tracing::debug!("No references to replace");
                OutcomeStatus::Unchanged
            }
            Ok(replaced) => {
                tracing::debug!("Replaced {} references", replaced);
                OutcomeStatus::Rewritten { replaced }
            }
            Err(error) => {
                tracing::error!("Rewrite of {} failed: {}", target.display(), error);
                OutcomeStatus::failed(error)
            }
        }
    }

    async fn rewrite(&self, target: &Path, origin: &Path) -> std::result::Result<usize, RewriteError> {
        let text = tokio::fs::read_to_string(target)
            .await
            .map_err(|e| RewriteError::io_error(target, e))?;

        let mut documents = self.codec.parse(&text).map_err(DocumentError::from)?;
        let replaced = self.walker.rewrite_set(&mut documents, self.map.as_ref());
        if replaced == 0 {
            return Ok(0);
        }

        let serialized = self.codec.serialize(&documents).map_err(DocumentError::from)?;
        let original = tokio::fs::read_to_string(origin)
            .await
            .map_err(|e| RewriteError::io_error(origin, e))?;
        let arranged = self
            .arranger
            .arrange(&original, &serialized)
            .map_err(DocumentError::from)?;

        tokio::fs::write(target, arranged)
            .await
            .map_err(|e| RewriteError::io_error(target, e))?;
        Ok(replaced)
    }
}

/// Dispatches document rewrites across a bounded worker pool
#[derive(Clone)]
pub struct RewriteCoordinator {
    config: DuplicatorConfig,
    codec: Arc<dyn DocumentCodec>,
    walker: DocumentTreeWalker,
    arranger: FormatArranger,
    cancellation: Option<CancellationFlag>,
}

impl fmt::Debug for RewriteCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteCoordinator")
            .field("codec", &self.codec.name())
            .field("reference_key", &self.walker.reference_key())
            .field("max_concurrency", &self.config.max_concurrency)
            .field("cancellable", &self.cancellation.is_some())
            .finish()
    }
}

impl RewriteCoordinator {
    /// Create coordinator with the YAML codec
    ///
    /// # Errors
    /// - `ConfigError::InvalidValue` if the configuration does not validate
    pub fn new(config: DuplicatorConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let arranger = FormatArranger::new(config.format.clone())
            .map_err(|e| ConfigError::invalid("format", e.to_string()))?;
        Ok(Self {
            walker: DocumentTreeWalker::new(config.reference_key.clone()),
            codec: Arc::new(YamlCodec::new()),
            arranger,
            cancellation: None,
            config,
        })
    }

    /// With document codec
    #[inline]
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn DocumentCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// With cancellation flag checked before each task starts
    #[inline]
    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DuplicatorConfig {
        &self.config
    }

    /// Allow-listed, non-sidecar documents under `root`, in file-name order
    ///
    /// # Errors
    /// - `DuplicateError::Enumeration` if `root` cannot be traversed
    pub fn candidates(&self, root: &Path) -> Result<Vec<PathBuf>> {
        tree::collect_files(root, |path| {
            !self.config.is_sidecar(path) && self.config.is_document(path)
        })
        .map_err(|e| DuplicateError::enumeration(root, e.to_string()))
    }

    /// Rewrite every candidate document under `duplicate_root`
    ///
    /// `on_progress` is called once per finished task with strictly
    /// increasing `completed` values. Individual failures are reported in
    /// the manifest and never abort the batch.
    ///
    /// # Errors
    /// - `DuplicateError::Enumeration` if `duplicate_root` cannot be traversed
    pub async fn rewrite_all(
        &self,
        duplicate_root: &Path,
        origin_root: &Path,
        map: Arc<IdentifierMap>,
        on_progress: Option<ProgressSink>,
    ) -> Result<RewriteManifest> {
        let files = self.candidates(duplicate_root)?;
        let total = files.len();
        tracing::info!(
            "Rewriting {} documents with {} workers",
            total,
            self.config.max_concurrency
        );

        let context = Arc::new(RewriteContext {
            codec: Arc::clone(&self.codec),
            walker: self.walker.clone(),
            arranger: self.arranger.clone(),
            map,
            cancellation: self.cancellation.clone(),
        });
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let tracker = ProgressTracker::new(total, on_progress);

        let mut tasks = JoinSet::new();
        let mut paths = HashMap::with_capacity(total);
        for target in files {
            let relative = target
                .strip_prefix(duplicate_root)
                .map_or_else(|_| target.clone(), Path::to_path_buf);
            let origin = origin_root.join(&relative);
            let context = Arc::clone(&context);
            let semaphore = Arc::clone(&semaphore);

            let handle = tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return OutcomeStatus::failed(RewriteError::TaskAborted(
                        "worker pool closed".to_string(),
                    ));
                };
                context.run(&target, &origin).await
            });
            paths.insert(handle.id(), relative);
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, status) = match joined {
                Ok((id, status)) => (id, status),
                Err(err) => {
                    let id = err.id();
                    let message = describe_join_error(err);
                    tracing::error!("Rewrite task aborted: {}", message);
                    (id, OutcomeStatus::failed(RewriteError::TaskAborted(message)))
                }
            };
            let path = paths.remove(&id).unwrap_or_default();
            let progress = tracker.advance();
            tracing::debug!("[{}] {}", progress, path.display());
            outcomes.push(FileOutcome { path, status });
        }

        let manifest = RewriteManifest::new(outcomes, tracker.snapshot());
        tracing::info!(
            "Rewrite finished: {} rewritten, {} unchanged, {} skipped, {} failed",
            manifest.summary.rewritten,
            manifest.summary.unchanged,
            manifest.summary.skipped,
            manifest.summary.failed
        );
        Ok(manifest)
    }
}

fn describe_join_error(err: JoinError) -> String {
    if !err.is_panic() {
        return "task cancelled".to_string();
    }
    let payload = err.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .map_or_else(|| "task panicked".to_string(), |m| format!("task panicked: {m}"))
}
