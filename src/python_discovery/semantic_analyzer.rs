//! Receiver attribute analysis for method bodies.
//!
//! Finds every `self.<name>` read and write inside a method so collection can
//! tell whether the attributes a test relies on are provided by its scope.

use crate::collection::types::AttributeAccess;
use crate::python_discovery::visitor::line_number;
use ruff_python_ast::visitor::{walk_expr, Visitor};
use ruff_python_ast::{Expr, ExprAttribute, ExprCall, ExprContext, Stmt};
use ruff_text_size::Ranged;
use std::collections::BTreeSet;

/// Attribute accesses on the receiver of one method
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelfAccesses {
    /// First read of each attribute, in source order
    pub reads: Vec<AttributeAccess>,
    pub writes: BTreeSet<String>,
}

/// Collect the `<receiver>.<attr>` accesses made by a function body
pub fn analyze_self_accesses(body: &[Stmt], receiver: &str, source: &str) -> SelfAccesses {
    let mut visitor = SelfAccessVisitor {
        receiver,
        source,
        accesses: SelfAccesses::default(),
    };
    visitor.visit_body(body);
    visitor.accesses
}

struct SelfAccessVisitor<'a> {
    receiver: &'a str,
    source: &'a str,
    accesses: SelfAccesses,
}

impl SelfAccessVisitor<'_> {
    fn is_receiver(&self, expr: &Expr) -> bool {
        matches!(expr, Expr::Name(name) if name.id.as_str() == self.receiver)
    }

    fn record_read(&mut self, name: &str, expr: &Expr) {
        if self.accesses.reads.iter().any(|read| read.name == name) {
            return;
        }
        self.accesses.reads.push(AttributeAccess {
            name: name.to_string(),
            line: line_number(self.source, expr.range().start()),
        });
    }

    /// `setattr(self, "name", value)` assigns like `self.name = value`
    fn setattr_target<'e>(&self, call: &'e ExprCall) -> Option<&'e str> {
        let Expr::Name(func) = call.func.as_ref() else {
            return None;
        };
        if func.id.as_str() != "setattr" {
            return None;
        }
        match call.arguments.args.as_ref() {
            [target, Expr::StringLiteral(name), _] if self.is_receiver(target) => {
                Some(name.value.to_str())
            }
            _ => None,
        }
    }
}

impl<'a> Visitor<'a> for SelfAccessVisitor<'_> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Attribute(ExprAttribute {
                value, attr, ctx, ..
            }) if self.is_receiver(value) => match ctx {
                ExprContext::Load => self.record_read(attr.as_str(), expr),
                ExprContext::Store | ExprContext::Del => {
                    self.accesses.writes.insert(attr.to_string());
                }
                ExprContext::Invalid => {}
            },
            Expr::Call(call) => {
                if let Some(name) = self.setattr_target(call) {
                    self.accesses.writes.insert(name.to_string());
                }
            }
            _ => {}
        }
        walk_expr(self, expr);
    }
}
