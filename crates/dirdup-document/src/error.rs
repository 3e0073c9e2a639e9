//! Error types for the document layer
//!
//! Provides error handling for:
//! - Parse operations (text → DocumentSet)
//! - Serialize operations (DocumentSet → text)
//! - Arrange operations (restoring source formatting)

/// Errors while parsing document text into a tree
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Syntax error reported by the YAML event parser
    #[error("syntax error in document {document} (line {line}): {message}")]
    SyntaxError {
        /// Zero-based index of the document inside the file
        document: usize,
        /// One-based line number in the source text
        line: usize,
        /// Parser message
        message: String,
    },

    /// Construct the tree model cannot represent
    #[error("unsupported construct in document {document}: {construct}")]
    Unsupported {
        /// Zero-based index of the document inside the file
        document: usize,
        /// What was found
        construct: String,
    },

    /// Event stream ended in the middle of a node
    #[error("unexpected end of document {0}")]
    UnexpectedEnd(usize),
}

impl ParseError {
    /// Create syntax error for a document
    pub fn syntax_error(document: usize, line: usize, message: impl Into<String>) -> Self {
        Self::SyntaxError {
            document,
            line,
            message: message.into(),
        }
    }

    /// Create unsupported-construct error for a document
    pub fn unsupported(document: usize, construct: impl Into<String>) -> Self {
        Self::Unsupported {
            document,
            construct: construct.into(),
        }
    }
}

/// Errors while serializing a tree back to text
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// Formatting failure from the underlying writer
    #[error("format error: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Errors while restoring original formatting
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ArrangeError {
    /// Round-tripped text has more tagged separators than the original
    #[error("separator underflow at output line {line}: original has only {available} tagged separators")]
    SeparatorUnderflow {
        /// One-based line in the round-tripped text
        line: usize,
        /// Number of separators recorded from the original
        available: usize,
    },

    /// Original separators left over after the round-tripped text was consumed
    #[error("separator surplus: {remaining} original separators were not consumed")]
    SeparatorSurplus {
        /// Number of unconsumed original separators
        remaining: usize,
    },

    /// Separator recognizer failed to compile
    #[error("invalid separator pattern {pattern:?}: {message}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Regex compiler message
        message: String,
    },
}

/// Combined document layer error
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Text could not be parsed
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Tree could not be written
    #[error("serialize error: {0}")]
    Serialize(#[from] SerializeError),

    /// Original formatting could not be restored
    #[error("arrange error: {0}")]
    Arrange(#[from] ArrangeError),
}

/// Result type alias for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;
