//! Parsing entry points turning Python source into resolved scope trees.

use crate::collection::error::{CollectionError, CollectionResult};
use crate::collection::nodes::ScopeTree;
use crate::collection::resolver::resolve_module;
use crate::collection::types::Members;
use crate::python_discovery::visitor::MemberVisitor;
use ruff_python_ast::Mod;
use ruff_python_parser::{parse, Mode, ParseOptions};
use std::path::{Component, Path, PathBuf};

/// A parsed module: the names it binds at top level and what they hold
#[derive(Debug, Clone, PartialEq)]
pub struct SourceModule {
    /// Dotted import name
    pub name: String,
    pub path: PathBuf,
    /// Host-engine node id of the file (path relative to the root)
    pub nodeid: String,
    pub members: Members,
}

/// Parse Python source into its top-level members
pub fn parse_module(
    path: &Path,
    nodeid: &str,
    module_name: &str,
    source: &str,
) -> CollectionResult<SourceModule> {
    let parsed = parse(source, ParseOptions::from(Mode::Module)).map_err(|e| {
        CollectionError::ParseError(format!("Failed to parse {}: {}", path.display(), e))
    })?;

    let members = match parsed.into_syntax() {
        Mod::Module(module) => MemberVisitor::new(module_name, source).visit_module(&module),
        Mod::Expression(_) => Members::new(),
    };

    Ok(SourceModule {
        name: module_name.to_string(),
        path: path.to_path_buf(),
        nodeid: nodeid.to_string(),
        members,
    })
}

/// Parse and resolve a module in one step
pub fn discover_scopes(
    path: &Path,
    nodeid: &str,
    module_name: &str,
    source: &str,
) -> CollectionResult<ScopeTree> {
    let module = parse_module(path, nodeid, module_name, source)?;
    Ok(resolve_module(&module))
}

/// Convert a file path to a module path
pub fn path_to_module_path(file_path: &Path, root_path: &Path) -> Vec<String> {
    let relative = file_path.strip_prefix(root_path).unwrap_or(file_path);
    let last = relative.components().count().saturating_sub(1);

    let mut parts = Vec::new();
    for (index, component) in relative.components().enumerate() {
        if let Component::Normal(name) = component {
            let name = name.to_string_lossy();
            if index != last {
                parts.push(name.into_owned());
                continue;
            }
            // Strip .py extension from the last component
            match name.strip_suffix(".py") {
                Some("__init__") => {}
                Some(stem) => parts.push(stem.to_string()),
                None => parts.push(name.into_owned()),
            }
        }
    }

    parts
}
