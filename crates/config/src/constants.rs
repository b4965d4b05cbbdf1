//! Centralized constants for the configuration core.
//!
//! This module contains reserved keys, origin labels and parser limits used
//! across modules to avoid magic string duplication.

// =============================================================================
// Reserved Keys
// =============================================================================

/// Diagnostic key recording where a template configuration was loaded from.
pub const TEMPLATE_ORIGIN_KEY: &str = "template-origin";

// =============================================================================
// Origin Labels
// =============================================================================

/// Prefix of the origin label recorded when a template falls back to an
/// embedded resource, e.g. `"Resource default-site.xml"`.
pub const RESOURCE_ORIGIN_PREFIX: &str = "Resource ";

/// Origin label used when a value is copied from a set that has no recorded
/// origin for it.
pub const DEFAULT_ORIGIN: &str = "programmatically";

// =============================================================================
// Document Format
// =============================================================================

/// Root element of a configuration document.
pub const ROOT_ELEMENT: &str = "configuration";

/// Namespace URI of the inclusion directives honored by the parser.
pub const XINCLUDE_NAMESPACE: &str = "http://www.w3.org/2001/XInclude";

/// Default maximum nesting depth of inclusion directives.
///
/// Guards against include cycles (a document including itself).
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 16;

// =============================================================================
// Filesystem
// =============================================================================

/// Extension appended to a destination while a local write is in flight.
pub const TEMP_FILE_EXTENSION: &str = "tmp";
