//! AST visitor turning Python statements into namespace members.

use crate::collection::types::{ClassDef, FunctionDef, ImportedName, Literal, Members, Value};
use crate::python_discovery::pattern::{mark_name, MARKER_ATTRIBUTE};
use crate::python_discovery::semantic_analyzer::analyze_self_accesses;
use ruff_python_ast::{
    Decorator, ElifElseClause, ExceptHandler, Expr, ExprAttribute, ExprLambda, ModModule, Number,
    Parameters, Stmt, StmtClassDef, StmtFunctionDef,
};
use ruff_text_size::{Ranged, TextSize};
use std::rc::Rc;

/// Decorators that turn a method into a non-callable descriptor
const DATA_DESCRIPTORS: [&str; 3] = ["property", "functools.cached_property", "cached_property"];

/// Visitor collecting the names bound by a module or class body
pub(crate) struct MemberVisitor<'src> {
    module: &'src str,
    source: &'src str,
}

impl<'src> MemberVisitor<'src> {
    pub fn new(module: &'src str, source: &'src str) -> Self {
        Self { module, source }
    }

    pub fn visit_module(&self, module: &ModModule) -> Members {
        let mut members = Members::new();
        self.visit_body(&module.body, false, &mut members);
        members
    }

    fn visit_body(&self, body: &[Stmt], in_class: bool, members: &mut Members) {
        for stmt in body {
            self.visit_stmt(stmt, in_class, members);
        }
    }

    fn visit_stmt(&self, stmt: &Stmt, in_class: bool, members: &mut Members) {
        match stmt {
            Stmt::FunctionDef(func) => {
                let value = self.function_value(func, in_class);
                members.insert(func.name.as_str(), value);
            }
            Stmt::ClassDef(class) => {
                let value = self.class_value(class);
                members.insert(class.name.as_str(), value);
            }
            Stmt::Assign(assign) => {
                for target in &assign.targets {
                    self.bind_target(target, &assign.value, members);
                }
            }
            Stmt::AnnAssign(assign) => {
                // Bare annotations bind nothing
                if let Some(value) = &assign.value {
                    self.bind_target(&assign.target, value, members);
                }
            }
            Stmt::Import(import) => {
                for alias in &import.names {
                    let full = alias.name.as_str();
                    let bound = match &alias.asname {
                        Some(asname) => asname.as_str(),
                        None => full.split('.').next().unwrap_or(full),
                    };
                    members.insert(
                        bound,
                        Value::Imported(ImportedName {
                            module: full.to_string(),
                            name: None,
                        }),
                    );
                }
            }
            Stmt::ImportFrom(import) => {
                let mut module = ".".repeat(import.level as usize);
                if let Some(name) = &import.module {
                    module.push_str(name.as_str());
                }
                for alias in &import.names {
                    let name = alias.name.as_str();
                    if name == "*" {
                        continue;
                    }
                    let bound = alias.asname.as_ref().map_or(name, |a| a.as_str());
                    members.insert(
                        bound,
                        Value::Imported(ImportedName {
                            module: module.clone(),
                            name: Some(name.to_string()),
                        }),
                    );
                }
            }
            // Conditional definitions still bind names in the enclosing scope
            Stmt::If(stmt_if) => {
                self.visit_body(&stmt_if.body, in_class, members);
                for ElifElseClause { body, .. } in &stmt_if.elif_else_clauses {
                    self.visit_body(body, in_class, members);
                }
            }
            Stmt::Try(stmt_try) => {
                self.visit_body(&stmt_try.body, in_class, members);
                for handler in &stmt_try.handlers {
                    let ExceptHandler::ExceptHandler(handler) = handler;
                    self.visit_body(&handler.body, in_class, members);
                }
                self.visit_body(&stmt_try.orelse, in_class, members);
                self.visit_body(&stmt_try.finalbody, in_class, members);
            }
            Stmt::With(with) => self.visit_body(&with.body, in_class, members),
            Stmt::For(stmt_for) => {
                self.bind_opaque(&stmt_for.target, &stmt_for.iter, members);
                self.visit_body(&stmt_for.body, in_class, members);
                self.visit_body(&stmt_for.orelse, in_class, members);
            }
            Stmt::While(stmt_while) => {
                self.visit_body(&stmt_while.body, in_class, members);
                self.visit_body(&stmt_while.orelse, in_class, members);
            }
            Stmt::Match(stmt_match) => {
                for case in &stmt_match.cases {
                    self.visit_body(&case.body, in_class, members);
                }
            }
            _ => {}
        }
    }

    fn function_value(&self, func: &StmtFunctionDef, in_class: bool) -> Value {
        let decorators = decorator_names(&func.decorator_list);
        if decorators
            .iter()
            .any(|d| DATA_DESCRIPTORS.contains(&d.as_str()) || d.ends_with(".setter"))
        {
            return Value::Data(Literal::Opaque(format!("property {}", func.name)));
        }

        let is_static = decorators.iter().any(|d| d == "staticmethod");
        let is_classmethod = decorators.iter().any(|d| d == "classmethod");
        let receiver = if in_class && !is_static && !is_classmethod {
            first_parameter(&func.parameters)
        } else {
            None
        };

        let accesses = receiver
            .as_deref()
            .map(|receiver| analyze_self_accesses(&func.body, receiver, self.source))
            .unwrap_or_default();

        Value::Function(Rc::new(FunctionDef {
            name: func.name.to_string(),
            module: self.module.to_string(),
            line: line_number(self.source, func.range().start()),
            decorators,
            receiver,
            self_reads: accesses.reads,
            self_writes: accesses.writes,
        }))
    }

    fn class_value(&self, class: &StmtClassDef) -> Value {
        let mut members = Members::new();
        self.visit_body(&class.body, true, &mut members);

        // Class decorators like @pytest.mark.slow extend the marker attribute
        let marks: Vec<String> = decorator_names(&class.decorator_list)
            .iter()
            .filter_map(|d| mark_name(d).map(str::to_string))
            .collect();
        if !marks.is_empty() {
            match members.get_mut(MARKER_ATTRIBUTE) {
                Some(Value::Marker(existing)) => existing.extend(marks),
                _ => {
                    members.insert(MARKER_ATTRIBUTE, Value::Marker(marks));
                }
            }
        }

        let bases = class
            .arguments
            .as_ref()
            .map(|arguments| {
                arguments
                    .args
                    .iter()
                    .map(|base| self.source_text(base))
                    .filter(|base| base != "object")
                    .collect()
            })
            .unwrap_or_default();

        Value::Class(Rc::new(ClassDef {
            name: class.name.to_string(),
            module: self.module.to_string(),
            line: line_number(self.source, class.range().start()),
            bases,
            members,
        }))
    }

    fn bind_target(&self, target: &Expr, value: &Expr, members: &mut Members) {
        match target {
            Expr::Name(name) => {
                let bound = name.id.as_str();
                let value = if bound == MARKER_ATTRIBUTE {
                    Value::Marker(marks_in(value))
                } else {
                    self.expr_value(bound, value, members)
                };
                members.insert(bound, value);
            }
            Expr::Tuple(_) | Expr::List(_) => self.bind_opaque(target, value, members),
            // Attribute and subscript targets bind nothing in this namespace
            _ => {}
        }
    }

    /// Bind every name in `target` to a value we cannot see into, as
    /// unpacking and loop variables are
    fn bind_opaque(&self, target: &Expr, value: &Expr, members: &mut Members) {
        let elements: &[Expr] = match target {
            Expr::Tuple(tuple) => &tuple.elts,
            Expr::List(list) => &list.elts,
            single => std::slice::from_ref(single),
        };
        for element in elements {
            match element {
                Expr::Name(name) => {
                    members.insert(
                        name.id.as_str(),
                        Value::Data(Literal::Opaque(self.source_text(value))),
                    );
                }
                Expr::Tuple(_) | Expr::List(_) => self.bind_opaque(element, value, members),
                _ => {}
            }
        }
    }

    fn expr_value(&self, bound: &str, expr: &Expr, members: &Members) -> Value {
        match expr {
            Expr::Lambda(lambda) => self.lambda_value(bound, lambda),
            // Aliases share the object they refer to
            Expr::Name(name) => members
                .get(name.id.as_str())
                .cloned()
                .unwrap_or_else(|| Value::Data(Literal::Opaque(name.id.to_string()))),
            Expr::NumberLiteral(number) => match &number.value {
                Number::Int(int) => int
                    .as_i64()
                    .map(Literal::Int)
                    .map(Value::Data)
                    .unwrap_or_else(|| Value::Data(Literal::Opaque(self.source_text(expr)))),
                Number::Float(float) => Value::Data(Literal::Float(*float)),
                Number::Complex { .. } => Value::Data(Literal::Opaque(self.source_text(expr))),
            },
            Expr::StringLiteral(s) => Value::Data(Literal::String(s.value.to_str().to_string())),
            Expr::BooleanLiteral(b) => Value::Data(Literal::Bool(b.value)),
            Expr::NoneLiteral(_) => Value::Data(Literal::None),
            // Calls produce objects we cannot see into, callable or not
            _ => Value::Data(Literal::Opaque(self.source_text(expr))),
        }
    }

    fn lambda_value(&self, bound: &str, lambda: &ExprLambda) -> Value {
        Value::Function(Rc::new(FunctionDef {
            name: bound.to_string(),
            module: self.module.to_string(),
            line: line_number(self.source, lambda.range().start()),
            decorators: Vec::new(),
            receiver: None,
            self_reads: Vec::new(),
            self_writes: Default::default(),
        }))
    }

    fn source_text(&self, expr: &Expr) -> String {
        self.source[expr.range()].to_string()
    }
}

/// 1-based line number of a byte offset
pub(crate) fn line_number(source: &str, offset: TextSize) -> usize {
    let end = (offset.to_u32() as usize).min(source.len());
    source.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

fn first_parameter(parameters: &Parameters) -> Option<String> {
    parameters
        .posonlyargs
        .first()
        .or_else(|| parameters.args.first())
        .map(|param| param.parameter.name.to_string())
}

fn decorator_names(decorators: &[Decorator]) -> Vec<String> {
    decorators
        .iter()
        .filter_map(|decorator| match &decorator.expression {
            Expr::Call(call) => dotted_name(&call.func),
            other => dotted_name(other),
        })
        .collect()
}

/// `a.b.c` for a name or attribute chain
fn dotted_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Name(name) => Some(name.id.to_string()),
        Expr::Attribute(ExprAttribute { value, attr, .. }) => {
            dotted_name(value).map(|prefix| format!("{prefix}.{attr}"))
        }
        _ => None,
    }
}

/// Mark names referenced by a `pytestmark = ...` value
fn marks_in(expr: &Expr) -> Vec<String> {
    let elements: Vec<&Expr> = match expr {
        Expr::List(list) => list.elts.iter().collect(),
        Expr::Tuple(tuple) => tuple.elts.iter().collect(),
        other => vec![other],
    };
    elements
        .into_iter()
        .filter_map(|element| match element {
            Expr::Call(call) => dotted_name(&call.func),
            other => dotted_name(other),
        })
        .filter_map(|name| mark_name(&name).map(str::to_string))
        .collect()
}
