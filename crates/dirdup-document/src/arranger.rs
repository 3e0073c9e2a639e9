//! Format arranger
//!
//! Restores what a generic parse → serialize round trip loses:
//! - the fixed format header (`%YAML` / `%TAG` directives)
//! - each separator line exactly as the original wrote it, including the
//!   object anchor (`--- !u!4 &400000 stripped`)
//! - no explicit end-of-stream marker
//! - the original's line terminator (`\n` or `\r\n`) and whether the
//!   last line ends with one
//!
//! Separators are matched by position: the n-th tagged separator of the
//! round-tripped text becomes the n-th tagged separator of the original.

use crate::error::ArrangeError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Unity YAML header lines
pub const UNITY_HEADER: [&str; 2] = ["%YAML 1.1", "%TAG !u! tag:unity3d.com,2011:"];

/// Recognizer for a separator carrying a numeric object tag
pub const UNITY_SEPARATOR_PATTERN: &str = r"^--- !u!\d+";

/// Explicit end-of-stream marker line
pub const END_OF_STREAM_MARKER: &str = "...";

static UNITY_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(UNITY_SEPARATOR_PATTERN).expect("built-in separator pattern is valid")
});

/// Format constants the arranger reproduces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatSpec {
    /// Header lines prepended to every output
    pub header: Vec<String>,
    /// Regex recognizing a tagged separator line
    pub separator_pattern: String,
    /// End-of-stream marker line dropped from the output
    pub end_of_stream: String,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            header: UNITY_HEADER.iter().map(|line| (*line).to_string()).collect(),
            separator_pattern: UNITY_SEPARATOR_PATTERN.to_string(),
            end_of_stream: END_OF_STREAM_MARKER.to_string(),
        }
    }
}

/// Restores source formatting after a round trip
#[derive(Debug, Clone)]
pub struct FormatArranger {
    spec: FormatSpec,
    separator: Regex,
}

impl Default for FormatArranger {
    fn default() -> Self {
        Self {
            spec: FormatSpec::default(),
            separator: UNITY_SEPARATOR.clone(),
        }
    }
}

impl FormatArranger {
    /// Create arranger for a format
    ///
    /// # Errors
    /// - `ArrangeError::InvalidPattern` if the separator regex does not compile
    pub fn new(spec: FormatSpec) -> Result<Self, ArrangeError> {
        let separator =
            Regex::new(&spec.separator_pattern).map_err(|e| ArrangeError::InvalidPattern {
                pattern: spec.separator_pattern.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { spec, separator })
    }

    /// Format constants in use
    #[inline]
    #[must_use]
    pub fn spec(&self) -> &FormatSpec {
        &self.spec
    }

    /// True when `line` is a tagged separator
    #[inline]
    #[must_use]
    pub fn is_separator(&self, line: &str) -> bool {
        self.separator.is_match(line)
    }

    /// Number of tagged separator lines in `text`
    #[must_use]
    pub fn count_separators(&self, text: &str) -> usize {
        text.lines().filter(|line| self.is_separator(line)).count()
    }

    /// Rebuild `round_tripped` with the header and separators of `original`
    ///
    /// # Errors
    /// - `ArrangeError::SeparatorUnderflow` if `round_tripped` has more tagged
    ///   separators than `original`
    /// - `ArrangeError::SeparatorSurplus` if it has fewer
    pub fn arrange(&self, original: &str, round_tripped: &str) -> Result<String, ArrangeError> {
        let mut separators: VecDeque<&str> = original
            .lines()
            .filter(|line| self.is_separator(line))
            .collect();
        let available = separators.len();
        let newline = line_terminator(original);

        let mut out = String::with_capacity(round_tripped.len() + 64);
        for line in &self.spec.header {
            out.push_str(line);
            out.push_str(newline);
        }

        for (index, line) in round_tripped.lines().enumerate() {
            if line == self.spec.end_of_stream || self.spec.header.iter().any(|h| h == line) {
                continue;
            }
            if self.is_separator(line) {
                let restored = separators
                    .pop_front()
                    .ok_or(ArrangeError::SeparatorUnderflow {
                        line: index + 1,
                        available,
                    })?;
                out.push_str(restored);
            } else {
                out.push_str(line);
            }
            out.push_str(newline);
        }

        if !separators.is_empty() {
            return Err(ArrangeError::SeparatorSurplus {
                remaining: separators.len(),
            });
        }

        if !original.is_empty() && !original.ends_with('\n') && out.ends_with(newline) {
            out.truncate(out.len() - newline.len());
        }
        Ok(out)
    }
}

/// Terminator of the first line of `text`; `\n` when it has none
fn line_terminator(text: &str) -> &'static str {
    match text.find('\n') {
        Some(end) if text[..end].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}
