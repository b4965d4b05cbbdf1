//! Layered configuration management for Strata deployments.
//!
//! This crate loads key/value configuration sets from filesystem locations,
//! local files and embedded resources, merges them with last-writer-wins
//! semantics while keeping each key's origin history, and writes them back
//! as `<configuration>` documents.
//!
//! ```
//! use strata_config::{ConfigSet, Location, MemoryFileSystem, load_from_path, merge_into, save_to};
//!
//! let fs = MemoryFileSystem::new();
//! let mut defaults = ConfigSet::new();
//! defaults.set("replication", "3", "defaults");
//!
//! let mut site = ConfigSet::new();
//! site.set("replication", "2", "operator");
//! merge_into(&mut defaults, &site, "site");
//!
//! let path = save_to(&fs, &Location::new("/conf"), "site.xml", &defaults).unwrap();
//! let loaded = load_from_path(&fs, &path).unwrap();
//! assert_eq!(loaded.get("replication"), Some("2"));
//! assert_eq!(loaded.origins_of("replication"), ["/conf/site.xml"]);
//! ```

pub mod constants;
mod document;
mod error;
pub mod fs;
pub mod loader;
pub mod merge;
pub mod persistence;
pub mod provenance;
mod resources;
mod set;
pub mod template;

pub use document::{DocumentOptions, to_document_string, write_document};
pub use error::{ConfigError, Result};
pub use fs::{Fault, FileSystem, LocalFileSystem, Location, MemoryFileSystem, WriteStream};
pub use loader::{
    load_defaults, load_from_embedded_resource, load_from_local_file, load_from_path,
};
pub use merge::{merge_into, merged, set_many};
pub use persistence::{save_to, save_to_local_file};
pub use provenance::{dump_sorted, propagate, render_as_text};
pub use resources::{DirectoryResources, EmbeddedResources, ResourceNamespace, ResourceSource};
pub use set::ConfigSet;
pub use template::{resolve_template, resolve_template_in};
