//! Deletion-propagation policy, encoded as data rather than ORM metadata so
//! the cascade closure is inspectable and unit-testable.

use crate::models::EntityKind;

/// What happens to dependents when their referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Dependents are removed with the referenced row.
    Cascade,
    /// Deletion is refused while any dependent still references the row.
    Restrict,
}

/// The set of rows a policy edge points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependentSet {
    /// Rows of a dependent entity kind holding a foreign key to the parent.
    Rows(EntityKind),
    /// Parent↔student membership rows touching the parent.
    ParentLinks,
    /// Student↔transport enrollment rows touching the parent.
    TransportEnrollments,
}

/// One referencing relationship and its deletion policy.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceEdge {
    pub dependents: DependentSet,
    pub policy: DeletePolicy,
}

const fn edge(dependents: DependentSet, policy: DeletePolicy) -> ReferenceEdge {
    ReferenceEdge { dependents, policy }
}

use DeletePolicy::{Cascade, Restrict};
use DependentSet::{ParentLinks, Rows, TransportEnrollments};

const ACCOUNT_EDGES: [ReferenceEdge; 4] = [
    edge(Rows(EntityKind::Student), Cascade),
    edge(Rows(EntityKind::ParentGuardian), Cascade),
    edge(Rows(EntityKind::Accountant), Cascade),
    edge(Rows(EntityKind::Subject), Restrict),
];

const CLASS_GROUP_EDGES: [ReferenceEdge; 3] = [
    edge(Rows(EntityKind::Student), Restrict),
    edge(Rows(EntityKind::Subject), Restrict),
    edge(Rows(EntityKind::Timetable), Restrict),
];

const STUDENT_EDGES: [ReferenceEdge; 5] = [
    edge(Rows(EntityKind::Absence), Cascade),
    edge(Rows(EntityKind::Grade), Cascade),
    edge(Rows(EntityKind::Payment), Cascade),
    edge(ParentLinks, Cascade),
    edge(TransportEnrollments, Cascade),
];

const PARENT_EDGES: [ReferenceEdge; 1] = [edge(ParentLinks, Cascade)];

const SUBJECT_EDGES: [ReferenceEdge; 3] = [
    edge(Rows(EntityKind::Absence), Restrict),
    edge(Rows(EntityKind::Grade), Restrict),
    edge(Rows(EntityKind::Timetable), Restrict),
];

const TRANSPORT_EDGES: [ReferenceEdge; 1] = [edge(TransportEnrollments, Restrict)];

/// Referencing relationships of `kind`, in the order the closure planner
/// evaluates them.
pub fn dependents_of(kind: EntityKind) -> &'static [ReferenceEdge] {
    match kind {
        EntityKind::Account => &ACCOUNT_EDGES,
        EntityKind::ClassGroup => &CLASS_GROUP_EDGES,
        EntityKind::Student => &STUDENT_EDGES,
        EntityKind::ParentGuardian => &PARENT_EDGES,
        EntityKind::Subject => &SUBJECT_EDGES,
        EntityKind::Transport => &TRANSPORT_EDGES,
        EntityKind::Absence
        | EntityKind::Grade
        | EntityKind::Payment
        | EntityKind::Timetable
        | EntityKind::Accountant => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_kinds_have_no_dependents() {
        for kind in [
            EntityKind::Absence,
            EntityKind::Grade,
            EntityKind::Payment,
            EntityKind::Timetable,
            EntityKind::Accountant,
        ] {
            assert!(dependents_of(kind).is_empty(), "{kind} should be a leaf");
        }
    }

    #[test]
    fn test_account_deletion_restricts_on_taught_subjects() {
        let subject_edge = dependents_of(EntityKind::Account)
            .iter()
            .find(|e| e.dependents == DependentSet::Rows(EntityKind::Subject))
            .expect("account must carry a subject edge");
        assert_eq!(subject_edge.policy, DeletePolicy::Restrict);
    }

    #[test]
    fn test_profiles_cascade_from_account() {
        for profile in [
            EntityKind::Student,
            EntityKind::ParentGuardian,
            EntityKind::Accountant,
        ] {
            let e = dependents_of(EntityKind::Account)
                .iter()
                .find(|e| e.dependents == DependentSet::Rows(profile))
                .expect("profile edge");
            assert_eq!(e.policy, DeletePolicy::Cascade);
        }
    }

    #[test]
    fn test_class_group_is_fully_restricted() {
        assert!(dependents_of(EntityKind::ClassGroup)
            .iter()
            .all(|e| e.policy == DeletePolicy::Restrict));
    }

    #[test]
    fn test_student_subtree_is_fully_cascading() {
        assert!(dependents_of(EntityKind::Student)
            .iter()
            .all(|e| e.policy == DeletePolicy::Cascade));
    }
}
