//! dirdup Document Layer
//!
//! Everything that happens to a single document file during a duplication:
//!
//! # Core Operations
//!
//! - **Parse**: Text → [`DocumentSet`] via a [`DocumentCodec`]
//! - **Walk**: Substitute identifiers behind the reference key ([`DocumentTreeWalker`])
//! - **Serialize**: [`DocumentSet`] → text
//! - **Arrange**: Restore header and separator lines from the original ([`FormatArranger`])
//!
//! # Architecture
//!
//! ```text
//! original text ─→ Codec::parse ─→ DocumentSet ─→ Walker ─→ Codec::serialize ─→ Arranger ─→ final text
//!       └──────────────────────────────────────────────────────────────────────────↑
//! ```
//!
//! # Example
//!
//! ```rust
//! use dirdup_document::prelude::*;
//! use std::collections::HashMap;
//!
//! # fn example() -> Result<(), DocumentError> {
//! let original = "%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n--- !u!21 &2100000\nMaterial:\n  m_Shader:\n    guid: old\n";
//! let map = HashMap::from([("old".to_string(), "new".to_string())]);
//!
//! let codec = YamlCodec::new();
//! let mut documents = codec.parse(original)?;
//! DocumentTreeWalker::default().rewrite_set(&mut documents, &map);
//! let text = FormatArranger::default().arrange(original, &codec.serialize(&documents)?)?;
//!
//! assert!(text.contains("--- !u!21 &2100000\n"));
//! assert!(text.contains("guid: new"));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod arranger;
pub mod codec;
pub mod error;
pub mod node;
pub mod walker;

// Re-exports for convenience
pub use arranger::{FormatArranger, FormatSpec};
pub use codec::{DocumentCodec, YamlCodec};
pub use error::{ArrangeError, DocumentError, DocumentResult, ParseError, SerializeError};
pub use node::{CollectionStyle, Document, DocumentNode, DocumentSet, Scalar, ScalarStyle};
pub use walker::{DocumentTreeWalker, ReferenceLookup, DEFAULT_REFERENCE_KEY};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with documents
    pub use crate::arranger::{FormatArranger, FormatSpec};
    pub use crate::codec::{DocumentCodec, YamlCodec};
    pub use crate::error::{ArrangeError, DocumentError, ParseError, SerializeError};
    pub use crate::node::{Document, DocumentNode, DocumentSet};
    pub use crate::walker::{DocumentTreeWalker, ReferenceLookup};
}
