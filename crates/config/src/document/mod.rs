//! Structured configuration documents.
//!
//! Responsibilities:
//! - Parse `<configuration>` documents into properties, ignoring comments
//!   and resolving namespace-aware inclusion directives.
//! - Render a configuration set back to a document.
//!
//! Does NOT handle:
//! - Deciding origin labels (see `loader.rs`).
//! - Opening destinations (see `persistence.rs`).
//!
//! Invariants:
//! - A property without a value is never returned as a null; it is skipped.
//! - Relative inclusion targets only resolve when the document has a
//!   filesystem location.

mod reader;
mod writer;

use crate::constants::DEFAULT_MAX_INCLUDE_DEPTH;
use crate::fs::{FileSystem, Location};

pub(crate) use reader::parse_document;
pub use writer::{to_document_string, write_document};

/// Options controlling how documents are parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Maximum nesting depth of inclusion directives.
    pub max_include_depth: usize,
    /// Whether inclusion directives are resolved. When disabled they are
    /// skipped with a warning.
    pub resolve_includes: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            resolve_includes: true,
        }
    }
}

/// A property as written in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedProperty {
    pub(crate) name: String,
    pub(crate) value: String,
    pub(crate) is_final: bool,
    /// Origins the document claims for itself.
    pub(crate) claimed_sources: Vec<String>,
}

/// Where a document's bytes came from.
#[derive(Clone, Copy)]
pub(crate) enum DocumentSource<'a> {
    /// A location on a filesystem; relative includes resolve against it.
    Located {
        fs: &'a dyn FileSystem,
        location: &'a Location,
    },
    /// Bytes without an addressable location (embedded resources).
    Detached { label: &'a str },
}

impl DocumentSource<'_> {
    pub(crate) fn label(&self) -> String {
        match self {
            DocumentSource::Located { location, .. } => location.to_string(),
            DocumentSource::Detached { label } => (*label).to_string(),
        }
    }
}
