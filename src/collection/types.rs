//! Collection types: member values and the containers holding them.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::rc::Rc;

/// Location information for a test item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub line: Option<usize>,
    pub name: String,
}

/// A filesystem node awaiting collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collector {
    Directory(Directory),
    Module(Module),
}

impl Collector {
    pub fn nodeid(&self) -> &str {
        match self {
            Collector::Directory(dir) => &dir.nodeid,
            Collector::Module(module) => &module.nodeid,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            Collector::Directory(dir) => &dir.path,
            Collector::Module(module) => &module.path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub path: PathBuf,
    pub nodeid: String,
}

/// A Python source file accepted for collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub path: PathBuf,
    pub nodeid: String,
    /// Dotted import name, e.g. `tests.behaviors`
    pub name: String,
}

/// Index of a scope node inside its [`ScopeTree`](super::nodes::ScopeTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) usize);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A statically known value bound by an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    None,
    /// Anything we cannot evaluate; keeps the source text of the expression.
    Opaque(String),
}

/// A `self.<name>` access found in a method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeAccess {
    pub name: String,
    pub line: usize,
}

/// A function declared in Python source (`def`, `async def` or a lambda).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    /// Dotted name of the module the function was defined in
    pub module: String,
    pub line: usize,
    pub decorators: Vec<String>,
    /// Name of the instance parameter, when the function is an instance method
    pub receiver: Option<String>,
    /// Attributes read off the receiver, in source order
    pub self_reads: Vec<AttributeAccess>,
    /// Attributes assigned on the receiver
    pub self_writes: BTreeSet<String>,
}

/// A class declared in Python source together with its own body.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub module: String,
    pub line: usize,
    /// Base class expressions as written, `object` excluded
    pub bases: Vec<String>,
    pub members: Members,
}

/// A name bound by `import` or `from ... import`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName {
    /// Module the name comes from; relative imports keep their leading dots
    pub module: String,
    /// Imported member, `None` when the module object itself is bound
    pub name: Option<String>,
}

/// A function whose receiver has been rebound to a (possibly more derived) scope.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundMethod {
    pub function: Rc<FunctionDef>,
    /// Scope whose instance is passed as the receiver
    pub receiver: ScopeId,
}

/// Value of a member in a module or class namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Function(Rc<FunctionDef>),
    Method(BoundMethod),
    Class(Rc<ClassDef>),
    Data(Literal),
    /// The per-class test marker attribute (`pytestmark`), holding the mark names
    Marker(Vec<String>),
    Imported(ImportedName),
}

impl Value {
    /// Whether the value is a genuine function, class or method.
    ///
    /// Imported names and objects produced by calls are never treated as
    /// callables: we cannot tell a real function from a callable instance.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Method(_) | Value::Class(_))
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Value::Class(_))
    }

    /// Dotted name of the module the value originates from
    pub fn origin_module(&self) -> Option<&str> {
        match self {
            Value::Function(function) => Some(&function.module),
            Value::Method(method) => Some(&method.function.module),
            Value::Class(class) => Some(&class.module),
            Value::Imported(imported) => Some(&imported.module),
            Value::Data(_) | Value::Marker(_) => None,
        }
    }

    /// Underlying function of a function or rebound method
    pub fn as_function(&self) -> Option<&Rc<FunctionDef>> {
        match self {
            Value::Function(function) => Some(function),
            Value::Method(method) => Some(&method.function),
            _ => None,
        }
    }
}

/// Insertion-ordered namespace.
///
/// Rebinding a name replaces its value but keeps the position of the first
/// binding, the way a Python `__dict__` behaves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Members {
    entries: Vec<(String, Value)>,
}

impl Members {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, returning the value it previously held
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for Members {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        let mut members = Members::new();
        for (name, value) in iter {
            members.insert(name, value);
        }
        members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebinding_keeps_first_position() {
        let mut members = Members::new();
        members.insert("a", Value::Data(Literal::Int(1)));
        members.insert("b", Value::Data(Literal::Int(2)));
        let previous = members.insert("a", Value::Data(Literal::Int(3)));

        assert_eq!(previous, Some(Value::Data(Literal::Int(1))));
        assert_eq!(members.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(members.get("a"), Some(&Value::Data(Literal::Int(3))));
    }

    #[test]
    fn test_imported_names_are_not_callable() {
        let imported = Value::Imported(ImportedName {
            module: "_util".into(),
            name: Some("helper".into()),
        });
        assert!(!imported.is_callable());
        assert_eq!(imported.origin_module(), Some("_util"));
        assert!(!Value::Data(Literal::Opaque("Callable()".into())).is_callable());
    }
}
