//! Asset identifiers and the old → new identifier map
//!
//! The map is built once per operation by pairing every file and folder of
//! the duplicate tree with the entry of the same kind at the same relative
//! path in the origin tree, then shared read-only by every rewrite task.

use crate::error::{DuplicateError, Result};
use crate::host::AssetHost;
use crate::tree::{self, EntryKind};
use dirdup_document::ReferenceLookup;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Stable identifier the host assigned to one file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetIdentifier(String);

impl AssetIdentifier {
    /// Wrap an identifier; blank input yields `None`
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.len() == value.len() {
            Some(Self(value))
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AssetIdentifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Immutable map from origin identifier to duplicate identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierMap {
    entries: HashMap<AssetIdentifier, AssetIdentifier>,
}

impl IdentifierMap {
    /// Create empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replacement for an origin identifier
    #[inline]
    #[must_use]
    pub fn get(&self, old: &str) -> Option<&AssetIdentifier> {
        self.entries.get(old)
    }

    /// True when `old` has a replacement
    #[inline]
    #[must_use]
    pub fn contains_key(&self, old: &str) -> bool {
        self.entries.contains_key(old)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(old, new)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&AssetIdentifier, &AssetIdentifier)> {
        self.entries.iter()
    }

    /// Insert a pair; returns the replacement it displaced
    fn insert(&mut self, old: AssetIdentifier, new: AssetIdentifier) -> Option<AssetIdentifier> {
        self.entries.insert(old, new)
    }
}

impl FromIterator<(AssetIdentifier, AssetIdentifier)> for IdentifierMap {
    fn from_iter<I: IntoIterator<Item = (AssetIdentifier, AssetIdentifier)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (old, new) in iter {
            map.insert(old, new);
        }
        map
    }
}

impl ReferenceLookup for IdentifierMap {
    fn lookup(&self, old: &str) -> Option<&str> {
        self.get(old).map(AssetIdentifier::as_str)
    }
}

/// Counters collected while building a map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Duplicate files and folders examined
    pub pairs_considered: usize,
    /// Duplicate entries with no entry of the same kind at the same relative
    /// path in the origin
    pub skipped_missing_origin: usize,
    /// Pairs where either identifier could not be resolved
    pub skipped_unresolved: usize,
    /// Pairs whose origin identifier was already mapped; the later pair won
    pub overwritten: usize,
    /// Entries in the finished map
    pub mapped: usize,
}

/// Builds an [`IdentifierMap`] by pairing two trees on relative path
///
/// Folders are paired too, since documents may reference a folder asset.
/// The roots themselves are not.
#[derive(Clone)]
pub struct IdentifierMapBuilder {
    host: Arc<dyn AssetHost>,
    sidecar_extension: String,
}

impl fmt::Debug for IdentifierMapBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierMapBuilder")
            .field("sidecar_extension", &self.sidecar_extension)
            .finish_non_exhaustive()
    }
}

impl IdentifierMapBuilder {
    /// Create builder resolving identifiers through `host`
    #[inline]
    #[must_use]
    pub fn new(host: Arc<dyn AssetHost>) -> Self {
        Self {
            host,
            sidecar_extension: crate::config::DEFAULT_SIDECAR_EXTENSION.to_string(),
        }
    }

    /// With sidecar extension excluded from enumeration
    #[inline]
    #[must_use]
    pub fn with_sidecar_extension(mut self, extension: impl Into<String>) -> Self {
        self.sidecar_extension = extension.into();
        self
    }

    /// Build the map
    ///
    /// # Errors
    /// - `DuplicateError::Enumeration` if either root cannot be enumerated
    pub async fn build(&self, origin_root: &Path, duplicate_root: &Path) -> Result<IdentifierMap> {
        self.build_with_report(origin_root, duplicate_root)
            .await
            .map(|(map, _)| map)
    }

    /// Build the map and report what was skipped or overwritten
    ///
    /// # Errors
    /// - `DuplicateError::Enumeration` if either root cannot be enumerated
    pub async fn build_with_report(
        &self,
        origin_root: &Path,
        duplicate_root: &Path,
    ) -> Result<(IdentifierMap, BuildReport)> {
        ensure_directory(origin_root).await?;
        ensure_directory(duplicate_root).await?;

        let sidecar = self.sidecar_extension.as_str();
        let entries = tree::collect_entries(duplicate_root, |path| {
            !path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(sidecar))
        })
        .map_err(|e| DuplicateError::enumeration(duplicate_root, e.to_string()))?;

        let mut map = IdentifierMap::new();
        let mut report = BuildReport::default();

        for (duplicate, kind) in entries {
            report.pairs_considered += 1;

            let Ok(relative) = duplicate.strip_prefix(duplicate_root) else {
                continue;
            };
            let origin = origin_root.join(relative);
            if entry_kind(&origin).await != Some(kind) {
                tracing::debug!("No origin counterpart for {}", relative.display());
                report.skipped_missing_origin += 1;
                continue;
            }

            let old = self.host.identifier_of(&origin).await;
            let new = self.host.identifier_of(&duplicate).await;
            let (Some(old), Some(new)) = (old, new) else {
                tracing::debug!("Unresolved identifier pair for {}", relative.display());
                report.skipped_unresolved += 1;
                continue;
            };

            if let Some(previous) = map.insert(old.clone(), new.clone()) {
                tracing::warn!(
                    "Identifier {} mapped twice; {} replaces {} ({})",
                    old,
                    new,
                    previous,
                    relative.display()
                );
                report.overwritten += 1;
            }
        }

        report.mapped = map.len();
        tracing::info!(
            "Identifier map built: {} entries from {} files and folders",
            report.mapped,
            report.pairs_considered
        );
        Ok((map, report))
    }
}

async fn ensure_directory(root: &Path) -> Result<()> {
    match tokio::fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(DuplicateError::enumeration(root, "not a directory")),
        Err(e) => Err(DuplicateError::enumeration(root, e.to_string())),
    }
}

async fn entry_kind(path: &Path) -> Option<EntryKind> {
    let meta = tokio::fs::metadata(path).await.ok()?;
    EntryKind::of(meta.file_type())
}
