//! Testing utilities for the program catalog workspace
//!
//! Shared fixtures: a small canonical program tree, effort builders, an
//! inheritance chain, and a pre-seeded in-memory gateway.

#![allow(missing_docs)]

use catalog_gateway::{CurrentUser, InMemoryGateway};
use catalog_model::{ProfileSection, ProgramId, ProgramNode, SectionProfile, SoftwareEffort};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install a test tracing subscriber; later calls are no-ops.
///
/// Honors `RUST_LOG`, writes through the test harness so output is only
/// shown for failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The canonical four-node tree used across tests:
///
/// ```text
/// Root (1)
/// ├── A (2)
/// └── B (3)
///     └── C (4, expecting software efforts)
/// ```
pub fn sample_tree() -> ProgramNode {
    ProgramNode::new("1", "Root").with_children(vec![
        ProgramNode::new("2", "A"),
        ProgramNode::new("3", "B").with_children(vec![ProgramNode::new("4", "C").expecting()]),
    ])
}

/// A gateway seeded with [`sample_tree`] and a plain user
pub fn seeded_gateway() -> Arc<InMemoryGateway> {
    Arc::new(
        InMemoryGateway::new()
            .with_programs(vec![sample_tree()])
            .with_user(CurrentUser::new("tester")),
    )
}

/// An effort with a one-field statement of work
pub fn effort_with_sow(name: &str, objective: &str) -> SoftwareEffort {
    let mut effort = SoftwareEffort::new(name);
    *effort.local_mut(ProfileSection::StatementOfWork) =
        Some(section(&[("objective", json!(objective))]));
    effort
}

/// Build a section profile from key/value pairs
pub fn section(fields: &[(&str, serde_json::Value)]) -> SectionProfile {
    fields
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}

/// A three-deep inheritance chain for the statement-of-work section:
/// `e1` holds local data, `e2` inherits from `e1`, `e3` inherits from `e2`.
pub fn inheritance_chain() -> Vec<SoftwareEffort> {
    let e1 = effort_with_sow("e1", "Design");
    let e2 = {
        let mut e = SoftwareEffort::new("e2").with_parent(e1.uuid);
        e.set_inherit(ProfileSection::StatementOfWork, true);
        e
    };
    let e3 = {
        let mut e = SoftwareEffort::new("e3").with_parent(e2.uuid);
        e.set_inherit(ProfileSection::StatementOfWork, true);
        e
    };
    vec![e1, e2, e3]
}

/// The id of the node named C in [`sample_tree`]
pub fn leaf_id() -> ProgramId {
    ProgramId::new("4")
}
