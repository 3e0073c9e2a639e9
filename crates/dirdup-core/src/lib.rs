//! dirdup Core - Duplication with identifier remapping
//!
//! Duplicates a tree of content files and metadata sidecars, then rewrites
//! every reference to an origin identifier inside the duplicated documents
//! so the copy refers to itself instead of the origin:
//!
//! - Pairs both trees by relative path into an [`IdentifierMap`]
//! - Rewrites documents concurrently on a bounded pool
//! - Reports progress and per-file outcomes in a [`RewriteManifest`]
//!
//! Copying files and assigning identifiers are host concerns, behind the
//! [`AssetHost`] trait. [`FsAssetHost`] implements them on a plain
//! filesystem with `.meta` sidecars.
//!
//! # Example
//!
//! ```rust,no_run
//! use dirdup_core::prelude::*;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), DuplicateError> {
//! let duplicator = Duplicator::new(DuplicatorConfig::new(), Arc::new(FsAssetHost::new()))?;
//!
//! let origin = Path::new("Assets/Level");
//! let target = duplicator.default_destination(origin);
//! let progress: ProgressSink = Arc::new(|p| println!("{p}"));
//!
//! let report = duplicator.duplicate(origin, &target, &[], Some(progress)).await?;
//! println!("{} references replaced", report.manifest.summary.references_replaced);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

// Core modules
pub mod config;
pub mod coordinator;
pub mod duplicator;
pub mod error;
pub mod host;
pub mod identifier;
pub mod progress;

mod tree;

// Re-exports for convenience
pub use config::DuplicatorConfig;
pub use coordinator::{
    FileOutcome, ManifestSummary, OutcomeStatus, RewriteCoordinator, RewriteManifest, SkipReason,
};
pub use duplicator::{next_copy_destination, DuplicationReport, Duplicator, RemapReport};
pub use error::{ConfigError, DuplicateError, HostError, Result, RewriteError};
pub use host::{AssetHost, CopySummary, FsAssetHost};
pub use identifier::{AssetIdentifier, BuildReport, IdentifierMap, IdentifierMapBuilder};
pub use progress::{CancellationFlag, Progress, ProgressSink, ProgressTracker};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with dirdup core
    pub use crate::{
        AssetHost, AssetIdentifier, CancellationFlag, DuplicateError, DuplicationReport,
        Duplicator, DuplicatorConfig, FsAssetHost, IdentifierMap, IdentifierMapBuilder,
        OutcomeStatus, Progress, ProgressSink, RewriteCoordinator, RewriteManifest,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
