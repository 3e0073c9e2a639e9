//! Duplicator
//!
//! The complete "duplicate directory with dependencies" operation:
//!
//! 1. Validate origin and target
//! 2. Copy content files (host)
//! 3. Assign identifiers to the copies (host)
//! 4. Build the old → new identifier map
//! 5. Rewrite references in every duplicated document

use crate::config::DuplicatorConfig;
use crate::coordinator::{RewriteCoordinator, RewriteManifest};
use crate::error::{DuplicateError, Result};
use crate::host::{AssetHost, CopySummary};
use crate::identifier::{BuildReport, IdentifierMapBuilder};
use crate::progress::{CancellationFlag, ProgressSink};
use crate::tree;
use serde::Serialize;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// First free sibling name for a copy of `origin`
///
/// Tries `<name>(<label>)`, then `<name>(<label>1)`, `<name>(<label>2)`, …
#[must_use]
pub fn next_copy_destination(origin: &Path, label: &str) -> PathBuf {
    let candidate = |counter: Option<u32>| {
        let mut name = OsString::from(origin.as_os_str());
        match counter {
            None => name.push(format!("({label})")),
            Some(n) => name.push(format!("({label}{n})")),
        }
        PathBuf::from(name)
    };

    let first = candidate(None);
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| candidate(Some(n)))
        .find(|path| !path.exists())
        .unwrap_or(first)
}

/// Report of a map + rewrite pass
#[derive(Debug, Clone, Serialize)]
pub struct RemapReport {
    /// Identifier map counters
    pub build: BuildReport,
    /// Per-file rewrite outcomes
    pub manifest: RewriteManifest,
}

/// Report of a full duplication
#[derive(Debug, Clone, Serialize)]
pub struct DuplicationReport {
    /// Directory that was copied
    pub origin: PathBuf,
    /// Directory that was created
    pub target: PathBuf,
    /// What the copy step did
    pub copy: CopySummary,
    /// Identifiers the host assigned to the copies
    pub identifiers_assigned: usize,
    /// Identifier map counters
    pub build: BuildReport,
    /// Per-file rewrite outcomes
    pub manifest: RewriteManifest,
}

impl DuplicationReport {
    /// True when any document failed to rewrite
    #[inline]
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.manifest.has_failures()
    }
}

/// Orchestrates copy, identifier refresh, map building and rewrite
#[derive(Clone)]
pub struct Duplicator {
    config: DuplicatorConfig,
    host: Arc<dyn AssetHost>,
    coordinator: RewriteCoordinator,
}

impl fmt::Debug for Duplicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Duplicator")
            .field("config", &self.config)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

impl Duplicator {
    /// Create duplicator
    ///
    /// # Errors
    /// - `DuplicateError::Config` if the configuration does not validate
    pub fn new(config: DuplicatorConfig, host: Arc<dyn AssetHost>) -> Result<Self> {
        let coordinator = RewriteCoordinator::new(config.clone())?;
        Ok(Self {
            config,
            host,
            coordinator,
        })
    }

    /// With cancellation flag for the rewrite phase
    #[inline]
    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.coordinator = self.coordinator.with_cancellation(flag);
        self
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DuplicatorConfig {
        &self.config
    }

    /// Default destination for a copy of `origin`
    #[must_use]
    pub fn default_destination(&self, origin: &Path) -> PathBuf {
        next_copy_destination(origin, &self.config.copy_suffix)
    }

    /// Duplicate `origin` into `target` and remap every reference
    ///
    /// # Errors
    /// - `DuplicateError::OriginMissing` / `OriginNotDirectory` for a bad origin
    /// - `DuplicateError::TargetExists` if `target` is already present
    /// - `DuplicateError::TargetInsideOrigin` if `target` lies under `origin`
    /// - `DuplicateError::Host` if copying or identifier refresh fails
    /// - `DuplicateError::Enumeration` if a tree cannot be traversed
    pub async fn duplicate(
        &self,
        origin: &Path,
        target: &Path,
        excludes: &[PathBuf],
        on_progress: Option<ProgressSink>,
    ) -> Result<DuplicationReport> {
        let origin = validate_origin(origin).await?;
        let target = validate_target(&origin, target).await?;
        tracing::info!("Duplicating {} -> {}", origin.display(), target.display());

        let copy = self.host.copy_tree(&origin, &target, excludes).await?;
        let identifiers_assigned = self.host.refresh(&origin, &target).await?;

        let RemapReport { build, manifest } = self.remap(&origin, &target, on_progress).await?;

        tracing::info!(
            "Duplicated {} files; {} references replaced",
            copy.files_copied,
            manifest.summary.references_replaced
        );
        Ok(DuplicationReport {
            origin,
            target,
            copy,
            identifiers_assigned,
            build,
            manifest,
        })
    }

    /// Remap references of an already copied and refreshed tree
    ///
    /// # Errors
    /// - `DuplicateError::Enumeration` if a tree cannot be traversed
    pub async fn remap(
        &self,
        origin: &Path,
        duplicate: &Path,
        on_progress: Option<ProgressSink>,
    ) -> Result<RemapReport> {
        let builder = IdentifierMapBuilder::new(Arc::clone(&self.host))
            .with_sidecar_extension(self.config.sidecar_extension.clone());
        let (map, build) = builder.build_with_report(origin, duplicate).await?;
        if build.overwritten > 0 {
            tracing::warn!(
                "{} identifiers were mapped more than once; the last pair was kept",
                build.overwritten
            );
        }

        let manifest = self
            .coordinator
            .rewrite_all(duplicate, origin, Arc::new(map), on_progress)
            .await?;
        Ok(RemapReport { build, manifest })
    }
}

async fn validate_origin(origin: &Path) -> Result<PathBuf> {
    let meta = tokio::fs::metadata(origin)
        .await
        .map_err(|_| DuplicateError::OriginMissing(origin.to_path_buf()))?;
    if !meta.is_dir() {
        return Err(DuplicateError::OriginNotDirectory(origin.to_path_buf()));
    }
    tokio::fs::canonicalize(origin)
        .await
        .map_err(|e| DuplicateError::enumeration(origin, e.to_string()))
}

async fn validate_target(origin: &Path, target: &Path) -> Result<PathBuf> {
    if tokio::fs::try_exists(target).await.unwrap_or(true) {
        return Err(DuplicateError::TargetExists(target.to_path_buf()));
    }

    let absolute = absolute_target(target).await;
    if tree::is_within(&absolute, origin) {
        return Err(DuplicateError::TargetInsideOrigin {
            origin: origin.to_path_buf(),
            target: target.to_path_buf(),
        });
    }
    Ok(absolute)
}

/// Absolute form of a path that does not exist yet
///
/// The deepest existing ancestor is canonicalized so the result is
/// comparable with a canonical origin.
async fn absolute_target(target: &Path) -> PathBuf {
    let joined = if target.is_absolute() {
        target.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(target))
            .unwrap_or_else(|_| target.to_path_buf())
    };

    let mut missing = Vec::new();
    let mut existing = joined.as_path();
    loop {
        if let Ok(canonical) = tokio::fs::canonicalize(existing).await {
            let mut resolved = canonical;
            for component in missing.iter().rev() {
                resolved.push(component);
            }
            return resolved;
        }
        let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
            break;
        };
        missing.push(name.to_os_string());
        existing = parent;
    }
    joined
}
