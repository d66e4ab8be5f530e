//! Collection reporting functionality.

use super::error::{CollectionError, CollectionOutcome};
use super::session::{Collected, Session};
use super::types::Collector;

/// Collection report
#[derive(Debug)]
pub struct CollectReport {
    pub nodeid: String,
    pub outcome: CollectionOutcome,
    pub longrepr: Option<String>,
    pub error_type: Option<CollectionError>,
    pub result: Option<Collected>,
}

impl CollectReport {
    fn passed(nodeid: &str, result: Collected) -> Self {
        Self {
            nodeid: nodeid.to_string(),
            outcome: CollectionOutcome::Passed,
            longrepr: None,
            error_type: None,
            result: Some(result),
        }
    }

    fn failed(nodeid: &str, error: CollectionError) -> Self {
        Self {
            nodeid: nodeid.to_string(),
            outcome: CollectionOutcome::Failed,
            longrepr: Some(error.to_string()),
            error_type: Some(error),
            result: None,
        }
    }
}

/// Collect a single node and return a report
pub fn collect_one_node(node: &Collector, session: &Session) -> CollectReport {
    match session.collect_node(node) {
        Ok(result) => CollectReport::passed(node.nodeid(), result),
        Err(e) => CollectReport::failed(node.nodeid(), e),
    }
}
