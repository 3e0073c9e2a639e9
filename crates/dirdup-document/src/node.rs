//! Mutable document tree
//!
//! A parsed file is a [`DocumentSet`]: an ordered list of [`Document`]s,
//! one per separator in the source text. Each document owns its
//! [`DocumentNode`] tree exclusively.

/// How a scalar was written in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScalarStyle {
    /// Unquoted
    #[default]
    Plain,
    /// `'single quoted'`
    SingleQuoted,
    /// `"double quoted"`
    DoubleQuoted,
    /// `|` or `>` block scalar
    Block,
}

/// Leaf value of the tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Scalar {
    /// Raw scalar text, never type-resolved
    pub value: String,
    /// Source presentation
    pub style: ScalarStyle,
}

impl Scalar {
    /// Create a plain scalar
    #[inline]
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            style: ScalarStyle::Plain,
        }
    }

    /// Create a scalar with an explicit style
    #[inline]
    #[must_use]
    pub fn with_style(value: impl Into<String>, style: ScalarStyle) -> Self {
        Self {
            value: value.into(),
            style,
        }
    }
}

/// How a mapping or sequence was written in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CollectionStyle {
    /// One entry per line
    #[default]
    Block,
    /// Inline `{k: v, ..}` or `[a, ..]`
    Flow,
}

/// Node of a document tree
///
/// Mapping keys may repeat in malformed input; they are kept in source order
/// and never merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentNode {
    /// Ordered key → child pairs
    Mapping {
        /// Entries in source order
        entries: Vec<(String, DocumentNode)>,
        /// Source presentation
        style: CollectionStyle,
    },
    /// Ordered children
    Sequence {
        /// Items in source order
        items: Vec<DocumentNode>,
        /// Source presentation
        style: CollectionStyle,
    },
    /// Leaf string value
    Scalar(Scalar),
}

impl DocumentNode {
    /// Plain scalar node
    #[inline]
    #[must_use]
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::plain(value))
    }

    /// Block mapping node from `(key, child)` pairs
    #[must_use]
    pub fn mapping<K: Into<String>>(entries: impl IntoIterator<Item = (K, DocumentNode)>) -> Self {
        Self::Mapping {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            style: CollectionStyle::Block,
        }
    }

    /// Flow mapping node from `(key, child)` pairs
    #[must_use]
    pub fn flow_mapping<K: Into<String>>(
        entries: impl IntoIterator<Item = (K, DocumentNode)>,
    ) -> Self {
        Self::Mapping {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            style: CollectionStyle::Flow,
        }
    }

    /// Block sequence node
    #[inline]
    #[must_use]
    pub fn sequence(items: impl IntoIterator<Item = DocumentNode>) -> Self {
        Self::Sequence {
            items: items.into_iter().collect(),
            style: CollectionStyle::Block,
        }
    }

    /// Flow sequence node
    #[inline]
    #[must_use]
    pub fn flow_sequence(items: impl IntoIterator<Item = DocumentNode>) -> Self {
        Self::Sequence {
            items: items.into_iter().collect(),
            style: CollectionStyle::Flow,
        }
    }

    /// First child under `key` when this is a mapping
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DocumentNode> {
        match self {
            Self::Mapping { entries, .. } => {
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            Self::Sequence { .. } | Self::Scalar(_) => None,
        }
    }

    /// Follow a dotted path of mapping keys
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&DocumentNode> {
        path.split('.').try_fold(self, |node, segment| node.get(segment))
    }

    /// Scalar text when this is a scalar
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(scalar) => Some(&scalar.value),
            Self::Mapping { .. } | Self::Sequence { .. } => None,
        }
    }

    /// Total number of nodes in this subtree, including `self`
    #[must_use]
    pub fn node_count(&self) -> usize {
        match self {
            Self::Mapping { entries, .. } => {
                1 + entries.iter().map(|(_, v)| v.node_count()).sum::<usize>()
            }
            Self::Sequence { items, .. } => {
                1 + items.iter().map(DocumentNode::node_count).sum::<usize>()
            }
            Self::Scalar(_) => 1,
        }
    }
}

/// One top-level document of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Root tag as written on the separator line (e.g. `!u!114`)
    pub tag: Option<String>,
    /// Root node
    pub root: DocumentNode,
}

impl Document {
    /// Create a document
    #[inline]
    #[must_use]
    pub fn new(tag: Option<String>, root: DocumentNode) -> Self {
        Self { tag, root }
    }
}

/// All documents of one file, in source order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentSet {
    /// Documents in separator order
    pub documents: Vec<Document>,
}

impl DocumentSet {
    /// Create from documents
    #[inline]
    #[must_use]
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Number of documents
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when no documents were found
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterate over document roots
    pub fn roots(&self) -> impl Iterator<Item = &DocumentNode> {
        self.documents.iter().map(|d| &d.root)
    }
}
