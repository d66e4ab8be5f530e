//! Builds the scope tree of a module from its declared members.

use super::inheritance::merge_inherited;
use super::nodes::{Classification, ScopeEntry, ScopeKind, ScopeNode, ScopeTree, TestLeaf};
use super::types::{ClassDef, Location, ScopeId, Value};
use crate::python_discovery::discovery::SourceModule;
use log::debug;
use std::rc::Rc;

/// Resolve a parsed module into its scope tree.
///
/// Leaves and child scopes are recorded in declaration order, and every child
/// is fully resolved before its next sibling.
pub fn resolve_module(module: &SourceModule) -> ScopeTree {
    let mut resolver = ScopeResolver {
        module,
        tree: ScopeTree::new(&module.name, &module.path),
    };

    let root = resolver.tree.next_id();
    resolver.tree.push(ScopeNode {
        id: root,
        name: module.name.clone(),
        kind: ScopeKind::Module,
        parent: None,
        nodeid: module.nodeid.clone(),
        line: 1,
        bases: Vec::new(),
        raw_members: module.members.clone(),
        // Modules never inherit anything
        effective_members: module.members.clone(),
        children: Vec::new(),
        leaves: Vec::new(),
        entries: Vec::new(),
    });
    resolver.resolve_scope(root);

    debug!(
        "resolved {}: {} scopes, {} tests",
        module.nodeid,
        resolver.tree.nodes().count(),
        resolver.tree.leaves().len()
    );
    resolver.tree
}

struct ScopeResolver<'m> {
    module: &'m SourceModule,
    tree: ScopeTree,
}

impl ScopeResolver<'_> {
    fn resolve_scope(&mut self, scope: ScopeId) {
        let node = self.tree.get(scope);
        let kind = node.kind;
        let members = node.raw_members.clone();

        for (name, value) in members.iter() {
            match kind.classify(name, value, &self.module.name) {
                Classification::Leaf => self.add_leaf(scope, name, value),
                Classification::Scope(class) => {
                    let child = self.resolve_class(scope, name, class);
                    let node = self.tree.get_mut(scope);
                    node.children.push(child);
                    node.entries.push(ScopeEntry::Child(child));
                }
                Classification::Ignored => {}
            }
        }
    }

    fn add_leaf(&mut self, scope: ScopeId, name: &str, value: &Value) {
        let path = self.module.path.clone();
        let node = self.tree.get_mut(scope);
        let leaf = TestLeaf {
            name: name.to_string(),
            owning_scope: scope,
            qualified_id: format!("{}::{}", node.nodeid, name),
            location: Location {
                path,
                line: value.as_function().map(|f| f.line),
                name: name.to_string(),
            },
        };
        node.entries.push(ScopeEntry::Leaf(node.leaves.len()));
        node.leaves.push(leaf);
    }

    /// `name` is the binding the class was found under, which may differ from
    /// `class.name` when a class is aliased.
    fn resolve_class(&mut self, parent: ScopeId, name: &str, class: &Rc<ClassDef>) -> ScopeId {
        let id = self.tree.next_id();
        let parent_node = self.tree.get(parent);

        // Only class-in-class nesting inherits; module globals never leak in
        let effective_members = match parent_node.kind {
            ScopeKind::Class => merge_inherited(&parent_node.effective_members, &class.members, id),
            ScopeKind::Module => class.members.clone(),
        };

        let node = ScopeNode {
            id,
            name: name.to_string(),
            kind: ScopeKind::Class,
            parent: Some(parent),
            nodeid: format!("{}::{}", parent_node.nodeid, name),
            line: class.line,
            bases: class.bases.clone(),
            raw_members: class.members.clone(),
            effective_members,
            children: Vec::new(),
            leaves: Vec::new(),
            entries: Vec::new(),
        };
        self.tree.push(node);
        self.resolve_scope(id);
        id
    }
}
