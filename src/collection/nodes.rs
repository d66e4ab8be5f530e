//! The scope tree produced by resolving one module.
//!
//! A [`ScopeTree`] is an arena of [`ScopeNode`]s: the module at the root,
//! classes and nested classes below it. Each node owns its [`TestLeaf`]s.

use super::types::{ClassDef, Location, Members, ScopeId, Value};
use crate::python_discovery::pattern::{
    is_test_class_name, is_test_function_name, MARKER_ATTRIBUTE,
};
use crate::reporter::display::display_name;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Kind of a scope node.
///
/// Both kinds share the same classification predicates; module scopes
/// additionally require members to be defined locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
}

/// What a member turns into during resolution
#[derive(Debug, Clone, PartialEq)]
pub enum Classification<'v> {
    Leaf,
    Scope(&'v Rc<ClassDef>),
    Ignored,
}

impl ScopeKind {
    /// Whether `name` passes the naming rules for the kind of `value`
    pub fn is_test_name(&self, name: &str, value: &Value) -> bool {
        if name == MARKER_ATTRIBUTE {
            return false;
        }
        if value.is_class() {
            is_test_class_name(name)
        } else {
            is_test_function_name(name)
        }
    }

    /// Whether `value` bound as `name` is collected, either as a test or a scope
    pub fn is_test_callable(&self, name: &str, value: &Value, module: &str) -> bool {
        if !value.is_callable() || !self.is_test_name(name, value) {
            return false;
        }
        match self {
            // Reject anything not defined in the module itself (imports)
            ScopeKind::Module => value.origin_module() == Some(module),
            ScopeKind::Class => true,
        }
    }

    pub fn classify<'v>(&self, name: &str, value: &'v Value, module: &str) -> Classification<'v> {
        if !self.is_test_callable(name, value, module) {
            return Classification::Ignored;
        }
        match value {
            Value::Class(class) => Classification::Scope(class),
            _ => Classification::Leaf,
        }
    }
}

/// A single collected, executable test
#[derive(Debug, Clone, PartialEq)]
pub struct TestLeaf {
    pub name: String,
    pub owning_scope: ScopeId,
    pub qualified_id: String,
    pub location: Location,
}

/// Position of a leaf or child in a scope's declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeEntry {
    Leaf(usize),
    Child(ScopeId),
}

/// One level of nesting: a module, a class, or a class nested in a class
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeNode {
    pub id: ScopeId,
    /// Source name, used for resolution and node ids
    pub name: String,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub nodeid: String,
    pub line: usize,
    /// Base classes of a class scope as written in source
    pub bases: Vec<String>,
    pub raw_members: Members,
    pub effective_members: Members,
    pub children: Vec<ScopeId>,
    pub leaves: Vec<TestLeaf>,
    pub entries: Vec<ScopeEntry>,
}

impl ScopeNode {
    /// Name with marker affixes stripped, for display only
    pub fn display_name(&self) -> String {
        display_name(&self.name)
    }

    pub fn leaf(&self, name: &str) -> Option<&TestLeaf> {
        self.leaves.iter().find(|leaf| leaf.name == name)
    }
}

/// Scope nodes of one module, root first
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeTree {
    module_name: String,
    path: PathBuf,
    nodes: Vec<ScopeNode>,
}

impl ScopeTree {
    pub(crate) fn new(module_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            module_name: module_name.into(),
            path: path.into(),
            nodes: Vec::new(),
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &ScopeNode {
        &self.nodes[0]
    }

    pub fn get(&self, id: ScopeId) -> &ScopeNode {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: ScopeId) -> &mut ScopeNode {
        &mut self.nodes[id.0]
    }

    /// Id the next pushed node will receive
    pub(crate) fn next_id(&self) -> ScopeId {
        ScopeId(self.nodes.len())
    }

    pub(crate) fn push(&mut self, node: ScopeNode) -> ScopeId {
        let id = self.next_id();
        debug_assert_eq!(node.id, id);
        self.nodes.push(node);
        id
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ScopeNode> {
        self.nodes.iter()
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = &ScopeNode> {
        std::iter::successors(self.get(id).parent.map(|p| self.get(p)), move |node| {
            node.parent.map(|p| self.get(p))
        })
    }

    /// Follow child scope names from the root
    pub fn find(&self, path: &[&str]) -> Option<&ScopeNode> {
        let mut current = self.root();
        for name in path {
            current = current
                .children
                .iter()
                .map(|id| self.get(*id))
                .find(|child| child.name == *name)?;
        }
        Some(current)
    }

    /// All test leaves in depth-first, pre-order declaration order
    pub fn leaves(&self) -> Vec<&TestLeaf> {
        let mut leaves = Vec::new();
        if !self.nodes.is_empty() {
            self.flatten_into(self.root().id, &mut leaves);
        }
        leaves
    }

    fn flatten_into<'a>(&'a self, id: ScopeId, leaves: &mut Vec<&'a TestLeaf>) {
        let node = self.get(id);
        for entry in &node.entries {
            match entry {
                ScopeEntry::Leaf(index) => leaves.push(&node.leaves[*index]),
                ScopeEntry::Child(child) => self.flatten_into(*child, leaves),
            }
        }
    }

    /// Depth of a scope below the module (top-level classes are at depth 0)
    pub fn depth(&self, id: ScopeId) -> usize {
        self.ancestors(id).count().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::types::{FunctionDef, ImportedName, Literal};

    fn function(name: &str, module: &str) -> Value {
        Value::Function(Rc::new(FunctionDef {
            name: name.into(),
            module: module.into(),
            line: 1,
            decorators: vec![],
            receiver: None,
            self_reads: vec![],
            self_writes: Default::default(),
        }))
    }

    #[test]
    fn test_module_scope_requires_local_definition() {
        let local = function("a_test_is_me", "foo");
        let imported = function("helper", "_util");
        assert!(ScopeKind::Module.is_test_callable("a_test_is_me", &local, "foo"));
        assert!(!ScopeKind::Module.is_test_callable("helper", &imported, "foo"));
        // Class scopes do not check origins
        assert!(ScopeKind::Class.is_test_callable("helper", &imported, "foo"));
    }

    #[test]
    fn test_non_callables_are_ignored() {
        let data = Value::Data(Literal::Int(17));
        let imported = Value::Imported(ImportedName {
            module: "_util".into(),
            name: Some("helper".into()),
        });
        assert_eq!(
            ScopeKind::Module.classify("some_uncallable", &data, "foo"),
            Classification::Ignored
        );
        assert_eq!(
            ScopeKind::Class.classify("helper", &imported, "foo"),
            Classification::Ignored
        );
    }

    #[test]
    fn test_setup_and_teardown_are_not_leaves() {
        for name in ["setup", "teardown", "_helper"] {
            assert_eq!(
                ScopeKind::Class.classify(name, &function(name, "foo"), "foo"),
                Classification::Ignored
            );
        }
        assert_eq!(
            ScopeKind::Class.classify("actual_nested_test_here", &function("x", "foo"), "foo"),
            Classification::Leaf
        );
    }
}
