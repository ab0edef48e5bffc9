//! Program hierarchy nodes
//!
//! A [`ProgramNode`] is one unit in the organizational tree. Children and
//! attached software efforts are owned exclusively by their parent node, so
//! the program tree is acyclic by construction; only the flat effort parent
//! pointers can describe malformed graphs.

use crate::effort::SoftwareEffort;
use crate::ids::ProgramId;
use serde::{Deserialize, Serialize};

/// A unit in the organizational hierarchy (division/program/team)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramNode {
    /// Normalized id; legacy payloads key this field as `value`
    #[serde(rename = "program_id", alias = "value")]
    pub id: ProgramId,
    pub name: String,
    #[serde(default)]
    pub organization_leader_name: Option<String>,
    #[serde(default)]
    pub chief_engineer_name: Option<String>,
    #[serde(default)]
    pub primary_location: Option<String>,
    #[serde(default)]
    pub program_type: Option<String>,
    #[serde(default)]
    pub program_value: Option<String>,
    /// Marks a node that should have at least one software effort assigned
    #[serde(default)]
    pub expecting_software_efforts: bool,
    #[serde(default)]
    pub has_descendant_expecting_software_effort: bool,
    #[serde(default)]
    pub children: Vec<ProgramNode>,
    /// Lazily hydrated in production mode, embedded in mock payloads
    #[serde(default, alias = "softwareEfforts")]
    pub software_efforts: Vec<SoftwareEffort>,
}

impl ProgramNode {
    /// Create a bare node
    #[must_use]
    pub fn new(id: impl Into<ProgramId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            organization_leader_name: None,
            chief_engineer_name: None,
            primary_location: None,
            program_type: None,
            program_value: None,
            expecting_software_efforts: false,
            has_descendant_expecting_software_effort: false,
            children: Vec::new(),
            software_efforts: Vec::new(),
        }
    }

    /// With child nodes
    #[inline]
    #[must_use]
    pub fn with_children(mut self, children: Vec<ProgramNode>) -> Self {
        self.children = children;
        self
    }

    /// With attached software efforts
    #[inline]
    #[must_use]
    pub fn with_efforts(mut self, efforts: Vec<SoftwareEffort>) -> Self {
        self.software_efforts = efforts;
        self
    }

    /// With the expecting-software-efforts flag set
    #[inline]
    #[must_use]
    pub fn expecting(mut self) -> Self {
        self.expecting_software_efforts = true;
        self
    }

    /// Whether any efforts are attached (derived, never stored)
    #[inline]
    #[must_use]
    pub fn has_software_effort(&self) -> bool {
        !self.software_efforts.is_empty()
    }

    /// Whether this node or any descendant expects software efforts
    #[must_use]
    pub fn subtree_expects_efforts(&self) -> bool {
        self.expecting_software_efforts
            || self.children.iter().any(ProgramNode::subtree_expects_efforts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_numeric_program_id() {
        let node: ProgramNode =
            serde_json::from_str(r#"{"program_id": 3, "name": "B"}"#).unwrap();
        assert_eq!(node.id, ProgramId::new("3"));
        assert!(node.children.is_empty());
    }

    #[test]
    fn deserializes_legacy_value_key() {
        let node: ProgramNode = serde_json::from_str(r#"{"value": "7", "name": "Legacy"}"#).unwrap();
        assert_eq!(node.id, ProgramId::new("7"));
    }

    #[test]
    fn deserializes_camel_case_efforts_alias() {
        let json = format!(
            r#"{{"program_id": 1, "name": "Root",
                 "softwareEfforts": [{{"uuid": "{}", "name": "alpha"}}]}}"#,
            crate::EffortUuid::new()
        );
        let node: ProgramNode = serde_json::from_str(&json).unwrap();
        assert!(node.has_software_effort());
    }

    #[test]
    fn subtree_expectation_is_transitive() {
        let leaf = ProgramNode::new("4", "C").expecting();
        let mid = ProgramNode::new("3", "B").with_children(vec![leaf]);
        let root = ProgramNode::new("1", "Root").with_children(vec![mid]);

        assert!(!root.expecting_software_efforts);
        assert!(root.subtree_expects_efforts());

        let lonely = ProgramNode::new("2", "A");
        assert!(!lonely.subtree_expects_efforts());
    }
}
