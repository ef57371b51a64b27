//! `setters_core` discovers the setters used in a kpt package. A setter is a
//! named parameter declared through a `# kpt-set: <pattern>` line comment on
//! a YAML field. This crate reports each setter's current value, whether it
//! is a scalar or a list, and how many fields it controls.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Package directory
//!   → Package scanner (walks the directory, reads *.yaml, *.yml and Kptfile)
//!   → Loader (comment-preserving YAML reader, one Document per `---` section)
//!   → Manifest seeder (setters declared by the Kptfile apply-setters function)
//!   → Walker (visits every field, resolves `# kpt-set:` patterns)
//!   → Registry (first value wins, counts every match, sorted results)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `setters.toml`.
//! - [`package`]: Package directory walking and document loading.
//! - [`manifest`]: Kptfile reading and apply-setters seeding.
//!
//! ## Key Types
//!
//! - [`Document`]: A parsed YAML document whose nodes keep their line
//!   comments.
//! - [`Pattern`]: A setter pattern split into literal and placeholder
//!   segments.
//! - [`ListSetters`]: One discovery pass: seed, walk, report.
//! - [`DiscoveryResult`]: A discovered setter with its value, type and count.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use setters_core::list_setters;
//! use setters_core::package::scan_package_with_config;
//! use std::path::Path;
//!
//! let documents = scan_package_with_config(Path::new(".")).unwrap();
//! let discovery = list_setters(&documents).unwrap();
//!
//! for setter in &discovery.results {
//!     println!("{setter}");
//! }
//! ```

pub use discovery::*;
pub use document::*;
pub use error::*;
pub use loader::*;
pub use marker::*;
pub use pattern::*;
pub use registry::*;
pub use walker::*;

pub mod config;
mod discovery;
mod document;
#[allow(unused_assignments)]
mod error;
pub(crate) mod lexer;
mod loader;
pub mod manifest;
mod marker;
pub mod package;
mod pattern;
mod registry;
mod walker;

#[cfg(test)]
mod __fixtures;
