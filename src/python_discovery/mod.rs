//! Python source front-end: parsing and member extraction.

pub mod discovery;
pub mod pattern;
pub mod semantic_analyzer;
mod visitor;

pub use discovery::{discover_scopes, parse_module, path_to_module_path, SourceModule};
pub use semantic_analyzer::{analyze_self_accesses, SelfAccesses};
