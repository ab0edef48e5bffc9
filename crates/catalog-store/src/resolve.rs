//! Inheritance resolution for effort profile sections
//!
//! A section whose inherit flag is set defers to the nearest ancestor (via
//! `parent_uuid`) whose flag is clear; the chain may pass through several
//! inheriting ancestors. A broken chain resolves to nothing rather than an
//! error. The walk is bounded by the effort count, so a cyclic parent
//! chain in pre-existing data degrades to "unset" with a warning instead
//! of hanging; new cycles are rejected at save time by the store.

use catalog_model::{ProfileSection, SectionProfile, SoftwareEffort};
use serde_json::Value;

/// Resolve the effective payload of one section
///
/// Returns the effort's own local payload when not inheriting, the first
/// non-inheriting ancestor's payload when inheriting, or `None` when the
/// chain ends (no parent, broken reference, or nothing local anywhere).
#[must_use]
pub fn resolve_section<'a>(
    effort: &'a SoftwareEffort,
    all: &'a [SoftwareEffort],
    section: ProfileSection,
) -> Option<&'a SectionProfile> {
    if !effort.inherits(section) {
        return effort.local(section);
    }

    let mut current = effort;
    for _ in 0..all.len() {
        let parent_uuid = current.parent_uuid?;
        let Some(parent) = all.iter().find(|e| e.uuid == parent_uuid) else {
            tracing::warn!(
                effort = %current.uuid,
                parent = %parent_uuid,
                "broken inheritance chain; treating section as unset"
            );
            return None;
        };
        if !parent.inherits(section) {
            return parent.local(section);
        }
        current = parent;
    }

    tracing::warn!(
        effort = %effort.uuid,
        %section,
        "inheritance walk exceeded effort count; cyclic parent chain suspected"
    );
    None
}

/// Resolve the effective value of one field within a section
#[must_use]
pub fn resolve_field<'a>(
    effort: &'a SoftwareEffort,
    all: &'a [SoftwareEffort],
    section: ProfileSection,
    field: &str,
) -> Option<&'a Value> {
    resolve_section(effort, all, section)?.get(field)
}

/// Write one local field value
///
/// A section that is currently inheriting is read-only: the write is
/// refused and `false` returned. Otherwise the local payload is created on
/// demand and the field set.
pub fn update_local(
    effort: &mut SoftwareEffort,
    section: ProfileSection,
    field: &str,
    value: Value,
) -> bool {
    if effort.inherits(section) {
        return false;
    }
    effort
        .local_mut(section)
        .get_or_insert_with(SectionProfile::new)
        .set(field, value);
    true
}

/// Flip a section's inherit flag
///
/// Turning inheritance on discards the local payload, mirroring the
/// backend, which deletes the local profile row when `inherit_<section>`
/// becomes true. Turning it off leaves the payload empty until the next
/// [`update_local`].
pub fn set_section_inherit(effort: &mut SoftwareEffort, section: ProfileSection, inherit: bool) {
    effort.set_inherit(section, inherit);
    if inherit {
        *effort.local_mut(section) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_model::EffortUuid;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SECTION: ProfileSection = ProfileSection::StatementOfWork;

    fn with_local(mut effort: SoftwareEffort, field: &str, value: Value) -> SoftwareEffort {
        assert!(update_local(&mut effort, SECTION, field, value));
        effort
    }

    fn inheriting(mut effort: SoftwareEffort) -> SoftwareEffort {
        effort.set_inherit(SECTION, true);
        effort
    }

    #[test]
    fn non_inheriting_effort_reads_own_local() {
        let effort = with_local(SoftwareEffort::new("e1"), "program_phase", json!("Build"));
        let all = vec![effort.clone()];
        assert_eq!(
            resolve_field(&all[0], &all, SECTION, "program_phase"),
            Some(&json!("Build"))
        );
    }

    #[test]
    fn unset_local_field_resolves_to_none() {
        let effort = SoftwareEffort::new("e1");
        let all = vec![effort];
        assert_eq!(resolve_field(&all[0], &all, SECTION, "program_phase"), None);
    }

    #[test]
    fn chain_resolves_through_multiple_inheriting_ancestors() {
        let e1 = with_local(SoftwareEffort::new("e1"), "program_phase", json!("Design"));
        let e2 = inheriting(SoftwareEffort::new("e2").with_parent(e1.uuid));
        let e3 = inheriting(SoftwareEffort::new("e3").with_parent(e2.uuid));
        let all = vec![e1, e2, e3];

        assert_eq!(
            resolve_field(&all[2], &all, SECTION, "program_phase"),
            Some(&json!("Design"))
        );
    }

    #[test]
    fn chain_stops_at_first_non_inheriting_ancestor() {
        let grandparent = with_local(SoftwareEffort::new("gp"), "phase", json!("Old"));
        let parent = with_local(
            SoftwareEffort::new("p").with_parent(grandparent.uuid),
            "phase",
            json!("New"),
        );
        let child = inheriting(SoftwareEffort::new("c").with_parent(parent.uuid));
        let all = vec![grandparent, parent, child];

        assert_eq!(
            resolve_field(&all[2], &all, SECTION, "phase"),
            Some(&json!("New"))
        );
    }

    #[test]
    fn broken_chain_resolves_to_none() {
        let orphan = inheriting(SoftwareEffort::new("o").with_parent(EffortUuid::new()));
        let all = vec![orphan];
        assert_eq!(resolve_field(&all[0], &all, SECTION, "phase"), None);
    }

    #[test]
    fn cyclic_chain_terminates_with_none() {
        let mut a = SoftwareEffort::new("a");
        let mut b = SoftwareEffort::new("b");
        a.parent_uuid = Some(b.uuid);
        b.parent_uuid = Some(a.uuid);
        a.set_inherit(SECTION, true);
        b.set_inherit(SECTION, true);
        let all = vec![a, b];

        assert_eq!(resolve_field(&all[0], &all, SECTION, "phase"), None);
    }

    #[test]
    fn write_guard_refuses_while_inheriting() {
        let mut effort = inheriting(SoftwareEffort::new("e").with_parent(EffortUuid::new()));
        let before = effort.clone();

        assert!(!update_local(&mut effort, SECTION, "phase", json!("X")));
        assert_eq!(effort, before);
    }

    #[test]
    fn update_creates_local_payload_on_demand() {
        let mut effort = SoftwareEffort::new("e");
        assert_eq!(effort.local(SECTION), None);

        assert!(update_local(&mut effort, SECTION, "phase", json!("Design")));
        assert_eq!(
            effort.local(SECTION).unwrap().get("phase"),
            Some(&json!("Design"))
        );
    }

    #[test]
    fn enabling_inherit_discards_local_payload() {
        let mut effort = with_local(
            SoftwareEffort::new("e").with_parent(EffortUuid::new()),
            "phase",
            json!("Design"),
        );

        set_section_inherit(&mut effort, SECTION, true);
        assert!(effort.inherits(SECTION));
        assert_eq!(effort.local(SECTION), None);

        // Turning inheritance back off starts from a clean slate
        set_section_inherit(&mut effort, SECTION, false);
        assert_eq!(effort.local(SECTION), None);
    }

    #[test]
    fn sections_resolve_independently() {
        let parent = with_local(SoftwareEffort::new("p"), "phase", json!("Design"));
        let mut child = SoftwareEffort::new("c").with_parent(parent.uuid);
        child.set_inherit(SECTION, true);
        assert!(update_local(
            &mut child,
            ProfileSection::WorkLocation,
            "site",
            json!("Everett")
        ));
        let all = vec![parent, child];

        assert_eq!(
            resolve_field(&all[1], &all, SECTION, "phase"),
            Some(&json!("Design"))
        );
        assert_eq!(
            resolve_field(&all[1], &all, ProfileSection::WorkLocation, "site"),
            Some(&json!("Everett"))
        );
    }
}
