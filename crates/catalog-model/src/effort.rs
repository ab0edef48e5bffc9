//! Software efforts and their inheritable profile sections
//!
//! An effort carries four profile sections (statement of work, technical
//! points of contact, developer setup, work location). Each section is
//! either local to the effort or inherited from the nearest non-inheriting
//! ancestor in the effort's parent chain. The chain walk itself lives in
//! the store crate; this module only models the data.

use crate::ids::EffortUuid;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The four inheritable profile sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileSection {
    StatementOfWork,
    TechnicalPointsOfContact,
    DeveloperSetup,
    WorkLocation,
}

impl ProfileSection {
    /// All sections, in form-tab order
    pub const ALL: [Self; 4] = [
        Self::StatementOfWork,
        Self::TechnicalPointsOfContact,
        Self::DeveloperSetup,
        Self::WorkLocation,
    ];

    /// Wire/storage key for this section
    #[inline]
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::StatementOfWork => "statement_of_work_profile",
            Self::TechnicalPointsOfContact => "technical_points_of_contact",
            Self::DeveloperSetup => "developer_setup",
            Self::WorkLocation => "work_location",
        }
    }
}

impl fmt::Display for ProfileSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Field map for one profile section
///
/// The backend owns the per-section field schema, so the payload stays an
/// open map rather than a fixed struct. Ordered for deterministic
/// serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionProfile(pub BTreeMap<String, Value>);

impl SectionProfile {
    /// Empty profile
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field value
    #[inline]
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field value
    #[inline]
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for SectionProfile {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Validation failures for a single effort record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffortValidationError {
    /// An effort may not link to itself
    #[error("effort {0} lists itself in linked_software_efforts")]
    SelfLink(EffortUuid),

    /// Inheriting a section requires a parent to inherit from
    #[error("effort {uuid} inherits {section} but has no parent")]
    InheritWithoutParent {
        uuid: EffortUuid,
        section: ProfileSection,
    },
}

/// A tracked software project/team/component attached to a program node
///
/// Parent/child structure among efforts is carried as flat `parent_uuid`
/// pointers; the display forest is rebuilt from them on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwareEffort {
    /// Server-assigned id; `None` until the first successful save
    #[serde(default)]
    pub id: Option<i64>,
    /// Stable content key, assigned client-side at creation
    pub uuid: EffortUuid,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub effort_type: Option<String>,
    /// Parent effort within the same program; dangling values are tolerated
    /// downstream and demote the effort to a root
    #[serde(default, alias = "parent")]
    pub parent_uuid: Option<EffortUuid>,
    /// Non-hierarchical cross-references to efforts in the same program
    #[serde(default)]
    pub linked_software_efforts: Vec<EffortUuid>,

    #[serde(default)]
    pub inherit_statement_of_work_profile: bool,
    #[serde(default)]
    pub local_statement_of_work_profile: Option<SectionProfile>,
    #[serde(default)]
    pub inherit_technical_points_of_contact: bool,
    #[serde(default)]
    pub local_technical_points_of_contact: Option<SectionProfile>,
    #[serde(default)]
    pub inherit_developer_setup: bool,
    #[serde(default)]
    pub local_developer_setup: Option<SectionProfile>,
    #[serde(default)]
    pub inherit_work_location: bool,
    #[serde(default)]
    pub local_work_location: Option<SectionProfile>,
}

impl SoftwareEffort {
    /// Create a new unsaved effort with a fresh uuid
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            uuid: EffortUuid::new(),
            name: name.into(),
            status: None,
            effort_type: None,
            parent_uuid: None,
            linked_software_efforts: Vec::new(),
            inherit_statement_of_work_profile: false,
            local_statement_of_work_profile: None,
            inherit_technical_points_of_contact: false,
            local_technical_points_of_contact: None,
            inherit_developer_setup: false,
            local_developer_setup: None,
            inherit_work_location: false,
            local_work_location: None,
        }
    }

    /// With an explicit uuid (fixtures, round trips)
    #[inline]
    #[must_use]
    pub fn with_uuid(mut self, uuid: EffortUuid) -> Self {
        self.uuid = uuid;
        self
    }

    /// With a parent reference
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent: EffortUuid) -> Self {
        self.parent_uuid = Some(parent);
        self
    }

    /// With a status label
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Whether `section` defers to the parent chain
    #[inline]
    #[must_use]
    pub fn inherits(&self, section: ProfileSection) -> bool {
        match section {
            ProfileSection::StatementOfWork => self.inherit_statement_of_work_profile,
            ProfileSection::TechnicalPointsOfContact => self.inherit_technical_points_of_contact,
            ProfileSection::DeveloperSetup => self.inherit_developer_setup,
            ProfileSection::WorkLocation => self.inherit_work_location,
        }
    }

    /// Set the inherit flag for `section`
    ///
    /// Only flips the flag; discarding a stale local payload is the
    /// resolver's concern (`set_section_inherit` in the store crate).
    #[inline]
    pub fn set_inherit(&mut self, section: ProfileSection, inherit: bool) {
        match section {
            ProfileSection::StatementOfWork => self.inherit_statement_of_work_profile = inherit,
            ProfileSection::TechnicalPointsOfContact => {
                self.inherit_technical_points_of_contact = inherit;
            }
            ProfileSection::DeveloperSetup => self.inherit_developer_setup = inherit,
            ProfileSection::WorkLocation => self.inherit_work_location = inherit,
        }
    }

    /// The local payload for `section`, if any
    #[inline]
    #[must_use]
    pub fn local(&self, section: ProfileSection) -> Option<&SectionProfile> {
        self.local_slot(section).as_ref()
    }

    /// Mutable access to the local payload slot for `section`
    #[inline]
    pub fn local_mut(&mut self, section: ProfileSection) -> &mut Option<SectionProfile> {
        match section {
            ProfileSection::StatementOfWork => &mut self.local_statement_of_work_profile,
            ProfileSection::TechnicalPointsOfContact => {
                &mut self.local_technical_points_of_contact
            }
            ProfileSection::DeveloperSetup => &mut self.local_developer_setup,
            ProfileSection::WorkLocation => &mut self.local_work_location,
        }
    }

    fn local_slot(&self, section: ProfileSection) -> &Option<SectionProfile> {
        match section {
            ProfileSection::StatementOfWork => &self.local_statement_of_work_profile,
            ProfileSection::TechnicalPointsOfContact => &self.local_technical_points_of_contact,
            ProfileSection::DeveloperSetup => &self.local_developer_setup,
            ProfileSection::WorkLocation => &self.local_work_location,
        }
    }

    /// Check record-local invariants
    ///
    /// # Errors
    /// Returns the first violated invariant: a self-link, or an inherit
    /// flag set on a parentless effort.
    pub fn validate(&self) -> Result<(), EffortValidationError> {
        if self.linked_software_efforts.contains(&self.uuid) {
            return Err(EffortValidationError::SelfLink(self.uuid));
        }
        if self.parent_uuid.is_none() {
            for section in ProfileSection::ALL {
                if self.inherits(section) {
                    return Err(EffortValidationError::InheritWithoutParent {
                        uuid: self.uuid,
                        section,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn section_keys_are_stable() {
        assert_eq!(
            ProfileSection::StatementOfWork.key(),
            "statement_of_work_profile"
        );
        assert_eq!(ProfileSection::WorkLocation.to_string(), "work_location");
    }

    #[test]
    fn inherit_flag_accessors_cover_all_sections() {
        let mut effort = SoftwareEffort::new("alpha").with_parent(EffortUuid::new());
        for section in ProfileSection::ALL {
            assert!(!effort.inherits(section));
            effort.set_inherit(section, true);
            assert!(effort.inherits(section));
        }
    }

    #[test]
    fn local_slot_round_trip() {
        let mut effort = SoftwareEffort::new("alpha");
        let mut profile = SectionProfile::new();
        profile.set("program_phase", json!("Design"));
        *effort.local_mut(ProfileSection::StatementOfWork) = Some(profile.clone());

        assert_eq!(effort.local(ProfileSection::StatementOfWork), Some(&profile));
        assert_eq!(effort.local(ProfileSection::DeveloperSetup), None);
    }

    #[test]
    fn validate_rejects_self_link() {
        let mut effort = SoftwareEffort::new("alpha");
        effort.linked_software_efforts.push(effort.uuid);
        assert_eq!(
            effort.validate(),
            Err(EffortValidationError::SelfLink(effort.uuid))
        );
    }

    #[test]
    fn validate_rejects_inherit_without_parent() {
        let mut effort = SoftwareEffort::new("alpha");
        effort.set_inherit(ProfileSection::DeveloperSetup, true);
        assert!(matches!(
            effort.validate(),
            Err(EffortValidationError::InheritWithoutParent {
                section: ProfileSection::DeveloperSetup,
                ..
            })
        ));
    }

    #[test]
    fn validate_accepts_inherit_with_parent() {
        let mut effort = SoftwareEffort::new("alpha").with_parent(EffortUuid::new());
        effort.set_inherit(ProfileSection::WorkLocation, true);
        assert_eq!(effort.validate(), Ok(()));
    }

    #[test]
    fn deserializes_legacy_parent_alias() {
        let parent = EffortUuid::new();
        let json = format!(
            r#"{{"uuid": "{}", "name": "alpha", "parent": "{}"}}"#,
            EffortUuid::new(),
            parent
        );
        let effort: SoftwareEffort = serde_json::from_str(&json).unwrap();
        assert_eq!(effort.parent_uuid, Some(parent));
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = format!(r#"{{"uuid": "{}", "name": "alpha"}}"#, EffortUuid::new());
        let effort: SoftwareEffort = serde_json::from_str(&json).unwrap();
        assert_eq!(effort.id, None);
        assert!(effort.linked_software_efforts.is_empty());
        assert!(!effort.inherit_statement_of_work_profile);
        assert_eq!(effort.local_work_location, None);
    }
}
