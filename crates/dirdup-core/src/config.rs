//! Duplicator configuration
//!
//! Defaults match a Unity project. A YAML file may override any subset of
//! fields; missing fields keep their defaults.

use crate::error::ConfigError;
use dirdup_document::{FormatSpec, DEFAULT_REFERENCE_KEY};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;

/// Extensions of documents that may carry identifier references
pub const DEFAULT_EXTENSIONS: [&str; 21] = [
    "asset",
    "prefab",
    "unity",
    "mat",
    "controller",
    "overrideController",
    "anim",
    "mask",
    "playable",
    "mixer",
    "renderTexture",
    "spriteatlas",
    "lighting",
    "physicMaterial",
    "physicsMaterial2D",
    "guiskin",
    "fontsettings",
    "flare",
    "terrainlayer",
    "brush",
    "signal",
];

/// Extension of the metadata sidecar next to every content file
pub const DEFAULT_SIDECAR_EXTENSION: &str = "meta";

/// Label used when naming a copy destination
pub const DEFAULT_COPY_SUFFIX: &str = "copy";

/// Duplicator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DuplicatorConfig {
    /// Mapping key whose scalar values are identifier references
    pub reference_key: String,
    /// Allow-listed document extensions, without the dot
    pub extensions: Vec<String>,
    /// Sidecar extension, without the dot
    pub sidecar_extension: String,
    /// Maximum number of documents rewritten at once
    pub max_concurrency: usize,
    /// Header and separator conventions of the document format
    pub format: FormatSpec,
    /// Label used in destination names, `<name>(<label>)`
    pub copy_suffix: String,
}

impl DuplicatorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// - `ConfigError::Read` if the file cannot be read
    /// - `ConfigError::Parse` if it is not a valid configuration document
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// With reference key
    #[inline]
    #[must_use]
    pub fn with_reference_key(mut self, key: impl Into<String>) -> Self {
        self.reference_key = key.into();
        self
    }

    /// With allow-listed extensions
    #[inline]
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// With sidecar extension
    #[inline]
    #[must_use]
    pub fn with_sidecar_extension(mut self, extension: impl Into<String>) -> Self {
        self.sidecar_extension = extension.into();
        self
    }

    /// With max concurrency
    #[inline]
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// With document format
    #[inline]
    #[must_use]
    pub fn with_format(mut self, format: FormatSpec) -> Self {
        self.format = format;
        self
    }

    /// With copy label
    #[inline]
    #[must_use]
    pub fn with_copy_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.copy_suffix = suffix.into();
        self
    }

    /// Check field values
    ///
    /// # Errors
    /// - `ConfigError::InvalidValue` naming the first rejected field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reference_key.trim().is_empty() {
            return Err(ConfigError::invalid("reference_key", "must not be empty"));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::invalid("extensions", "at least one extension is required"));
        }
        if let Some(bad) = self
            .extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(ConfigError::invalid(
                "extensions",
                format!("{bad:?} must be a bare extension without a leading dot"),
            ));
        }
        if self.sidecar_extension.is_empty() {
            return Err(ConfigError::invalid("sidecar_extension", "must not be empty"));
        }
        if self
            .extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(&self.sidecar_extension))
        {
            return Err(ConfigError::invalid(
                "extensions",
                "sidecar extension cannot also be a document extension",
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::invalid("max_concurrency", "must be at least 1"));
        }
        if self.copy_suffix.trim().is_empty() {
            return Err(ConfigError::invalid("copy_suffix", "must not be empty"));
        }
        Ok(())
    }

    /// True when `path` is a metadata sidecar
    #[must_use]
    pub fn is_sidecar(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.sidecar_extension))
    }

    /// True when `path` has an allow-listed document extension
    #[must_use]
    pub fn is_document(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

impl Default for DuplicatorConfig {
    fn default() -> Self {
        Self {
            reference_key: DEFAULT_REFERENCE_KEY.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| (*ext).to_string()).collect(),
            sidecar_extension: DEFAULT_SIDECAR_EXTENSION.to_string(),
            max_concurrency: std::thread::available_parallelism().map_or(4, NonZeroUsize::get),
            format: FormatSpec::default(),
            copy_suffix: DEFAULT_COPY_SUFFIX.to_string(),
        }
    }
}
