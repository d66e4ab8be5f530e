//! The modelled runtime object of a scope.
//!
//! An [`Instance`] is what a test's receiver looks like once the host has
//! instantiated the scope and run its `setup`: the scope's effective members,
//! plus every attribute the bound lifecycle method assigns on `self`.

use super::error::CollectionWarning;
use super::nodes::{ScopeKind, ScopeNode, ScopeTree, TestLeaf};
use super::types::{AttributeAccess, FunctionDef, ScopeId, Value};
use crate::python_discovery::pattern::SETUP;
use std::collections::BTreeSet;
use std::rc::Rc;

pub struct Instance<'t> {
    scope: &'t ScopeNode,
    /// Attributes assigned on the receiver before a test runs
    attributes: BTreeSet<String>,
    /// The scope or an enclosing class derives from bases we cannot see into
    opaque_bases: bool,
}

impl<'t> Instance<'t> {
    pub fn new(tree: &'t ScopeTree, id: ScopeId) -> Self {
        let scope = tree.get(id);
        let opaque_bases = !scope.bases.is_empty()
            || tree
                .ancestors(id)
                .any(|ancestor| ancestor.kind == ScopeKind::Class && !ancestor.bases.is_empty());
        let mut attributes = BTreeSet::new();
        if let Some(setup) = scope
            .effective_members
            .get(SETUP)
            .and_then(Value::as_function)
        {
            attributes = writes_through_calls(scope, setup);
        }
        Self {
            scope,
            attributes,
            opaque_bases,
        }
    }

    pub fn scope(&self) -> &'t ScopeNode {
        self.scope
    }

    /// Member of the instance's class, own or inherited
    pub fn get(&self, name: &str) -> Option<&'t Value> {
        self.scope.effective_members.get(name)
    }

    /// Attributes set on the instance by its lifecycle methods
    pub fn instance_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        if self.get(name).is_some() || self.attributes.contains(name) {
            return true;
        }
        // Dunders come from `object`; anything else may come from a base class
        // we cannot see, which enclosing classes pass down as well
        (name.starts_with("__") && name.ends_with("__")) || self.opaque_bases
    }

    /// Reads of `self` made by `leaf` that nothing provides
    pub fn unresolved_reads(&self, leaf: &TestLeaf) -> Vec<&'t AttributeAccess> {
        let Some(function) = self.get(&leaf.name).and_then(Value::as_function) else {
            return Vec::new();
        };
        let own_writes = writes_through_calls(self.scope, function);
        function
            .self_reads
            .iter()
            .filter(|read| !own_writes.contains(&read.name) && !self.has_attr(&read.name))
            .collect()
    }
}

/// Attributes written by `function`, following `self.<method>()` calls into
/// other methods of the same scope
fn writes_through_calls(scope: &ScopeNode, function: &Rc<FunctionDef>) -> BTreeSet<String> {
    let mut writes = BTreeSet::new();
    let mut visited: Vec<&str> = Vec::new();
    let mut pending = vec![function];

    while let Some(current) = pending.pop() {
        if visited.contains(&current.name.as_str()) {
            continue;
        }
        visited.push(&current.name);
        writes.extend(current.self_writes.iter().cloned());

        for read in &current.self_reads {
            if let Some(callee) = scope
                .effective_members
                .get(&read.name)
                .and_then(Value::as_function)
            {
                if callee.receiver.is_some() {
                    pending.push(callee);
                }
            }
        }
    }

    writes
}

/// Warnings for every test reading an attribute its instance lacks
pub fn check_self_attributes(tree: &ScopeTree) -> Vec<CollectionWarning> {
    let mut warnings = Vec::new();
    for node in tree.nodes().filter(|node| node.kind == ScopeKind::Class) {
        let instance = Instance::new(tree, node.id);
        for leaf in &node.leaves {
            for read in instance.unresolved_reads(leaf) {
                warnings.push(CollectionWarning::UnresolvedSelfAttribute {
                    nodeid: leaf.qualified_id.clone(),
                    attribute: read.name.clone(),
                    line: read.line,
                });
            }
        }
    }
    warnings
}
