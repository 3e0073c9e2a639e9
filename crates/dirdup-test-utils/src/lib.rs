//! Testing utilities for dirdup workspace
//!
//! Builders for Unity-style asset trees in temporary directories.

#![allow(missing_docs)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const UNITY_HEADER: &str = "%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n";

/// Sidecar text carrying `guid`
pub fn meta_text(guid: &str) -> String {
    format!("fileFormatVersion: 2\nguid: {guid}\nNativeFormatImporter:\n  externalObjects: {{}}\n  mainObjectFileID: 11400000\n")
}

/// Single-object asset whose script reference points at `guid`
pub fn asset_referencing(name: &str, guid: &str) -> String {
    format!(
        "{UNITY_HEADER}--- !u!114 &11400000\nMonoBehaviour:\n  m_ObjectHideFlags: 0\n  m_Script: {{fileID: 11500000, guid: {guid}, type: 3}}\n  m_Name: {name}\n"
    )
}

/// Prefab with one material slot per referenced guid
pub fn prefab_referencing(name: &str, guids: &[&str]) -> String {
    let mut text = format!(
        "{UNITY_HEADER}--- !u!1 &100000\nGameObject:\n  m_Component:\n  - component: {{fileID: 2300000}}\n  m_Name: {name}\n--- !u!23 &2300000 stripped\nMeshRenderer:\n  m_Materials:\n"
    );
    for guid in guids {
        let _ = writeln!(text, "  - {{fileID: 2100000, guid: {guid}, type: 2}}");
    }
    text
}

/// Document the YAML codec rejects
pub fn malformed_asset() -> String {
    format!("{UNITY_HEADER}--- !u!114 &11400000\nMonoBehaviour:\n  m_Script: {{fileID: 11500000, guid: [unclosed\n")
}

/// Temporary directory holding one or more asset trees
#[derive(Debug)]
pub struct AssetTree {
    dir: TempDir,
}

impl AssetTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Temporary directory root
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Create a directory with a sidecar
    pub fn folder(&self, relative: impl AsRef<Path>, guid: &str) -> PathBuf {
        let path = self.path(relative);
        std::fs::create_dir_all(&path).expect("create folder");
        std::fs::write(sidecar(&path), format!("fileFormatVersion: 2\nguid: {guid}\nfolderAsset: yes\n"))
            .expect("write folder sidecar");
        path
    }

    /// Write a content file without a sidecar
    pub fn file(&self, relative: impl AsRef<Path>, contents: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(&path, contents).expect("write file");
        path
    }

    /// Write a content file and its sidecar
    pub fn asset(&self, relative: impl AsRef<Path>, contents: &str, guid: &str) -> PathBuf {
        let path = self.file(relative, contents);
        std::fs::write(sidecar(&path), meta_text(guid)).expect("write sidecar");
        path
    }

    pub fn read(&self, relative: impl AsRef<Path>) -> String {
        std::fs::read_to_string(self.path(relative)).expect("read file")
    }

    /// Identifier stored in the sidecar of `relative`
    pub fn guid_of(&self, relative: impl AsRef<Path>) -> Option<String> {
        let text = std::fs::read_to_string(sidecar(&self.path(relative))).ok()?;
        text.lines()
            .find_map(|line| line.strip_prefix("guid: "))
            .map(|guid| guid.trim().to_string())
    }
}

impl Default for AssetTree {
    fn default() -> Self {
        Self::new()
    }
}

fn sidecar(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".meta");
    PathBuf::from(name)
}
