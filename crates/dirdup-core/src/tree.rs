//! Directory tree helpers shared by the builder, coordinator and host

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Sidecar path of `path`: `<path>.<extension>`
pub(crate) fn sidecar_path(path: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Regular files under `root` accepted by `keep`, in file-name order
pub(crate) fn collect_files<F>(root: &Path, mut keep: F) -> Result<Vec<PathBuf>, walkdir::Error>
where
    F: FnMut(&Path) -> bool,
{
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && keep(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// What a walked entry is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub(crate) fn of(file_type: std::fs::FileType) -> Option<Self> {
        if file_type.is_file() {
            Some(Self::File)
        } else if file_type.is_dir() {
            Some(Self::Directory)
        } else {
            None
        }
    }
}

/// Files and directories below `root` accepted by `keep`, in file-name order
///
/// `root` itself is not listed.
pub(crate) fn collect_entries<F>(
    root: &Path,
    mut keep: F,
) -> Result<Vec<(PathBuf, EntryKind)>, walkdir::Error>
where
    F: FnMut(&Path) -> bool,
{
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let Some(kind) = EntryKind::of(entry.file_type()) else {
            continue;
        };
        if keep(entry.path()) {
            entries.push((entry.into_path(), kind));
        }
    }
    Ok(entries)
}

/// True when `path` is `root` itself or lies below it
pub(crate) fn is_within(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}
