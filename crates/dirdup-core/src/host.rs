//! Host collaborators
//!
//! The core never copies files or assigns identifiers itself. It asks an
//! [`AssetHost`] to do so. [`FsAssetHost`] is a plain-filesystem host that
//! keeps identifiers in `<file>.meta` sidecars the way a Unity project does.

use crate::config::DEFAULT_SIDECAR_EXTENSION;
use crate::error::HostError;
use crate::identifier::AssetIdentifier;
use crate::tree;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Sidecar format version written for freshly created sidecars
const SIDECAR_FORMAT_VERSION: u32 = 2;

/// What a copy step did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CopySummary {
    /// Content files copied
    pub files_copied: usize,
    /// Directories created under the target
    pub directories_created: usize,
    /// Sidecars left behind for the host to regenerate
    pub sidecars_skipped: usize,
    /// Entries inside excluded subtrees
    pub excluded: usize,
    /// Bytes written
    pub bytes_copied: u64,
}

/// Host capabilities the duplicator depends on
#[async_trait]
pub trait AssetHost: Send + Sync {
    /// Identifier of the file at `path`, if the host knows one
    async fn identifier_of(&self, path: &Path) -> Option<AssetIdentifier>;

    /// Copy content files of `origin` to `target`, never sidecars
    ///
    /// `excludes` are subtrees relative to `origin` that are not copied.
    async fn copy_tree(
        &self,
        origin: &Path,
        target: &Path,
        excludes: &[PathBuf],
    ) -> Result<CopySummary, HostError>;

    /// Assign identifiers to every copied entry under `target`
    ///
    /// Returns how many identifiers were assigned.
    async fn refresh(&self, origin: &Path, target: &Path) -> Result<usize, HostError>;
}

/// Shape of the part of a sidecar we read
#[derive(Debug, Deserialize)]
struct SidecarHeader {
    guid: Option<String>,
}

/// Filesystem host keeping identifiers in sidecar files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsAssetHost {
    sidecar_extension: String,
}

impl Default for FsAssetHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FsAssetHost {
    /// Create host using `.meta` sidecars
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            sidecar_extension: DEFAULT_SIDECAR_EXTENSION.to_string(),
        }
    }

    /// With sidecar extension
    #[inline]
    #[must_use]
    pub fn with_sidecar_extension(mut self, extension: impl Into<String>) -> Self {
        self.sidecar_extension = extension.into();
        self
    }

    /// Sidecar path for a content path
    #[inline]
    #[must_use]
    pub fn sidecar_of(&self, path: &Path) -> PathBuf {
        tree::sidecar_path(path, &self.sidecar_extension)
    }

    fn is_sidecar(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.sidecar_extension))
    }

    /// Sidecar text for a copied entry
    ///
    /// Reuses the origin sidecar with its identifier line replaced, so
    /// importer settings carry over.
    async fn sidecar_text(&self, origin_entry: &Path, identifier: &str) -> String {
        match tokio::fs::read_to_string(self.sidecar_of(origin_entry)).await {
            Ok(text) => replace_identifier(&text, identifier),
            Err(_) => format!("fileFormatVersion: {SIDECAR_FORMAT_VERSION}\nguid: {identifier}\n"),
        }
    }
}

/// Fresh identifier: 32 lowercase hex digits
fn mint_identifier() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Replace the top-level `guid:` line of a sidecar, appending one if absent
fn replace_identifier(sidecar: &str, identifier: &str) -> String {
    let mut out = String::with_capacity(sidecar.len() + 40);
    let mut replaced = false;
    for line in sidecar.lines() {
        if !replaced && line.starts_with("guid:") {
            out.push_str("guid: ");
            out.push_str(identifier);
            replaced = true;
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    if !replaced {
        out.push_str("guid: ");
        out.push_str(identifier);
        out.push('\n');
    }
    out
}

fn relative_exclude(origin: &Path, exclude: &Path) -> PathBuf {
    if exclude.is_absolute() {
        exclude
            .strip_prefix(origin)
            .map_or_else(|_| exclude.to_path_buf(), Path::to_path_buf)
    } else {
        exclude.to_path_buf()
    }
}

#[async_trait]
impl AssetHost for FsAssetHost {
    async fn identifier_of(&self, path: &Path) -> Option<AssetIdentifier> {
        let sidecar = self.sidecar_of(path);
        let text = match tokio::fs::read_to_string(&sidecar).await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("No sidecar at {}: {}", sidecar.display(), e);
                return None;
            }
        };
        match serde_yaml::from_str::<SidecarHeader>(&text) {
            Ok(header) => header.guid.and_then(AssetIdentifier::new),
            Err(e) => {
                tracing::debug!("Unreadable sidecar {}: {}", sidecar.display(), e);
                None
            }
        }
    }

    async fn copy_tree(
        &self,
        origin: &Path,
        target: &Path,
        excludes: &[PathBuf],
    ) -> Result<CopySummary, HostError> {
        let excludes: Vec<PathBuf> = excludes
            .iter()
            .map(|exclude| relative_exclude(origin, exclude))
            .collect();
        let mut summary = CopySummary::default();

        tokio::fs::create_dir_all(target)
            .await
            .map_err(|e| HostError::io_error(target, e))?;

        let mut walker = WalkDir::new(origin).min_depth(1).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = entry?;
            let Ok(relative) = entry.path().strip_prefix(origin) else {
                continue;
            };
            if excludes.iter().any(|exclude| tree::is_within(relative, exclude)) {
                tracing::debug!("Excluded {}", relative.display());
                summary.excluded += 1;
                if entry.file_type().is_dir() {
                    walker.skip_current_dir();
                }
                continue;
            }

            let destination = target.join(relative);
            if entry.file_type().is_dir() {
                tokio::fs::create_dir_all(&destination)
                    .await
                    .map_err(|e| HostError::io_error(&destination, e))?;
                summary.directories_created += 1;
            } else if self.is_sidecar(entry.path()) {
                summary.sidecars_skipped += 1;
            } else {
                if let Some(parent) = destination.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| HostError::io_error(parent, e))?;
                }
                let bytes = tokio::fs::copy(entry.path(), &destination)
                    .await
                    .map_err(|e| HostError::io_error(&destination, e))?;
                summary.files_copied += 1;
                summary.bytes_copied += bytes;
            }
        }

        tracing::info!(
            "Copied {} files into {} ({} sidecars skipped, {} excluded)",
            summary.files_copied,
            target.display(),
            summary.sidecars_skipped,
            summary.excluded
        );
        Ok(summary)
    }

    async fn refresh(&self, origin: &Path, target: &Path) -> Result<usize, HostError> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(target).sort_by_file_name() {
            let entry = entry?;
            if !self.is_sidecar(entry.path()) {
                entries.push(entry.into_path());
            }
        }

        let mut minted = 0;
        for entry in entries {
            let sidecar = self.sidecar_of(&entry);
            if tokio::fs::try_exists(&sidecar).await.unwrap_or(false) {
                continue;
            }
            let origin_entry = match entry.strip_prefix(target) {
                Ok(relative) if relative.as_os_str().is_empty() => origin.to_path_buf(),
                Ok(relative) => origin.join(relative),
                Err(_) => continue,
            };
            let text = self.sidecar_text(&origin_entry, &mint_identifier()).await;
            tokio::fs::write(&sidecar, text)
                .await
                .map_err(|e| HostError::io_error(&sidecar, e))?;
            minted += 1;
        }

        tracing::info!("Assigned {} identifiers under {}", minted, target.display());
        Ok(minted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn minted_identifiers_are_lowercase_hex() {
        let minted = mint_identifier();
        assert_eq!(minted.len(), 32);
        assert!(minted.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(minted, mint_identifier());
    }

    #[test]
    fn replace_identifier_keeps_importer_settings() {
        let origin = "fileFormatVersion: 2\nguid: 9f1c0b5e3d4a4b7f8e2a1c3d5e7f9a0b\nPrefabImporter:\n  externalObjects: {}\n  guid: nested\n";
        assert_eq!(
            replace_identifier(origin, "n1"),
            "fileFormatVersion: 2\nguid: n1\nPrefabImporter:\n  externalObjects: {}\n  guid: nested\n"
        );
    }

    #[test]
    fn replace_identifier_appends_when_missing() {
        assert_eq!(
            replace_identifier("fileFormatVersion: 2\n", "n1"),
            "fileFormatVersion: 2\nguid: n1\n"
        );
    }

    #[test]
    fn absolute_excludes_become_relative() {
        assert_eq!(
            relative_exclude(Path::new("/p/A"), Path::new("/p/A/Textures")),
            PathBuf::from("Textures")
        );
        assert_eq!(
            relative_exclude(Path::new("/p/A"), Path::new("Textures")),
            PathBuf::from("Textures")
        );
    }

    #[tokio::test]
    async fn identifier_of_reads_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("A.asset");
        std::fs::write(&file, "").unwrap();
        std::fs::write(
            dir.path().join("A.asset.meta"),
            "fileFormatVersion: 2\nguid: 0a1b2c\nNativeFormatImporter:\n  mainObjectFileID: 0\n",
        )
        .unwrap();

        let host = FsAssetHost::new();
        assert_eq!(
            host.identifier_of(&file).await,
            AssetIdentifier::new("0a1b2c")
        );
    }

    #[tokio::test]
    async fn identifier_of_fails_soft() {
        let dir = tempfile::tempdir().unwrap();
        let host = FsAssetHost::new();

        let missing = dir.path().join("Missing.asset");
        assert_eq!(host.identifier_of(&missing).await, None);

        let blank = dir.path().join("Blank.asset");
        std::fs::write(dir.path().join("Blank.asset.meta"), "fileFormatVersion: 2\nguid: \n").unwrap();
        assert_eq!(host.identifier_of(&blank).await, None);

        let broken = dir.path().join("Broken.asset");
        std::fs::write(dir.path().join("Broken.asset.meta"), "guid: [unclosed\n").unwrap();
        assert_eq!(host.identifier_of(&broken).await, None);
    }

    #[tokio::test]
    async fn copy_tree_skips_sidecars_and_excludes() {
        let origin = tempfile::tempdir().unwrap();
        let target_parent = tempfile::tempdir().unwrap();
        let target = target_parent.path().join("A(copy)");

        std::fs::create_dir_all(origin.path().join("Sub/Deep")).unwrap();
        std::fs::create_dir_all(origin.path().join("Skip")).unwrap();
        std::fs::write(origin.path().join("A.asset"), "a").unwrap();
        std::fs::write(origin.path().join("A.asset.meta"), "guid: g1\n").unwrap();
        std::fs::write(origin.path().join("Sub/Deep/B.prefab"), "bb").unwrap();
        std::fs::write(origin.path().join("Skip/C.asset"), "c").unwrap();

        let summary = FsAssetHost::new()
            .copy_tree(origin.path(), &target, &[PathBuf::from("Skip")])
            .await
            .unwrap();

        assert_eq!(summary.files_copied, 2);
        assert_eq!(summary.sidecars_skipped, 1);
        assert_eq!(summary.excluded, 1);
        assert_eq!(summary.bytes_copied, 3);
        assert!(target.join("Sub/Deep/B.prefab").is_file());
        assert!(!target.join("A.asset.meta").exists());
        assert!(!target.join("Skip").exists());
    }

    #[tokio::test]
    async fn refresh_mints_sidecars_for_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let origin = dir.path().join("A");
        let target = dir.path().join("A(copy)");

        std::fs::create_dir_all(&origin).unwrap();
        std::fs::write(origin.join("A.asset.meta"), "fileFormatVersion: 2\nguid: g1\nNativeFormatImporter:\n  mainObjectFileID: 11400000\n").unwrap();
        std::fs::write(dir.path().join("A.meta"), "fileFormatVersion: 2\nguid: g0\nfolderAsset: yes\n").unwrap();
        std::fs::create_dir_all(target.join("Sub")).unwrap();
        std::fs::write(target.join("A.asset"), "").unwrap();
        std::fs::write(target.join("Sub/B.asset"), "").unwrap();

        let host = FsAssetHost::new();
        let minted = host.refresh(&origin, &target).await.unwrap();
        // root, A.asset, Sub, Sub/B.asset
        assert_eq!(minted, 4);

        let root_meta = std::fs::read_to_string(dir.path().join("A(copy).meta")).unwrap();
        assert!(root_meta.contains("folderAsset: yes"));
        assert!(!root_meta.contains("guid: g0\n"));

        let a_meta = std::fs::read_to_string(target.join("A.asset.meta")).unwrap();
        assert!(a_meta.contains("mainObjectFileID: 11400000"));
        assert!(!a_meta.contains("guid: g1\n"));

        let b_meta = std::fs::read_to_string(target.join("Sub/B.asset.meta")).unwrap();
        assert!(b_meta.starts_with("fileFormatVersion: 2\nguid: "));

        let a = host.identifier_of(&target.join("A.asset")).await.unwrap();
        let b = host.identifier_of(&target.join("Sub/B.asset")).await.unwrap();
        assert_ne!(a, b);

        // Second refresh assigns nothing new
        assert_eq!(host.refresh(&origin, &target).await.unwrap(), 0);
    }
}
