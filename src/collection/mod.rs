//! Relaxed test collection.
//!
//! Files are accepted by [`session::Session`], parsed into members, and
//! resolved into a [`nodes::ScopeTree`] whose nested class scopes inherit the
//! non-test members of the classes enclosing them.

pub mod error;
pub mod inheritance;
pub mod instance;
pub mod nodes;
pub mod report;
pub mod resolver;
pub mod session;
pub mod types;

pub use error::{CollectionError, CollectionOutcome, CollectionResult, CollectionWarning};
pub use instance::{check_self_attributes, Instance};
pub use nodes::{Classification, ScopeKind, ScopeNode, ScopeTree, TestLeaf};
pub use report::{collect_one_node, CollectReport};
pub use session::{Collected, PathCollection, Session};
pub use types::{Collector, Members, ScopeId, Value};
