//! Cascade closure planner.
//!
//! Given a row marked for deletion, computes the transitive set of dependents
//! breadth-first per the [`crate::policy`] table. Any RESTRICT edge with a
//! live dependent fails the whole plan; otherwise the plan lists victims in
//! discovery order and the store applies them in reverse (dependents before
//! ancestors) inside one write-lock scope.

use crate::error::{RegistryError, RegistryResult};
use crate::models::EntityKind;
use crate::policy::{dependents_of, DeletePolicy, DependentSet};
use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

/// Read-only view of the reference graph the planner walks. Implemented by
/// the store's table set; tests may supply their own.
pub trait ReferenceIndex {
    fn row_exists(&self, kind: EntityKind, id: Uuid) -> bool;

    /// Ids of `child` rows holding a foreign key to `(parent, parent_id)`.
    fn rows_referencing(&self, parent: EntityKind, parent_id: Uuid, child: EntityKind)
        -> Vec<Uuid>;

    /// `(parent_id, student_id)` membership pairs touching the given row.
    fn parent_links_touching(&self, kind: EntityKind, id: Uuid) -> Vec<(Uuid, Uuid)>;

    /// `(student_id, transport_id)` enrollment pairs touching the given row.
    fn enrollments_touching(&self, kind: EntityKind, id: Uuid) -> Vec<(Uuid, Uuid)>;
}

/// Resolved deletion closure. `victims` is in breadth-first discovery order,
/// root first; application removes them back to front.
#[derive(Debug, Clone)]
pub struct DeletePlan {
    pub root: (EntityKind, Uuid),
    pub victims: Vec<(EntityKind, Uuid)>,
    pub parent_links: Vec<(Uuid, Uuid)>,
    pub enrollments: Vec<(Uuid, Uuid)>,
}

pub fn plan_delete(
    index: &dyn ReferenceIndex,
    kind: EntityKind,
    id: Uuid,
) -> RegistryResult<DeletePlan> {
    if !index.row_exists(kind, id) {
        return Err(RegistryError::NotFound { kind, id });
    }

    let mut victims: Vec<(EntityKind, Uuid)> = Vec::new();
    let mut parent_links: Vec<(Uuid, Uuid)> = Vec::new();
    let mut enrollments: Vec<(Uuid, Uuid)> = Vec::new();
    let mut visited: HashSet<(EntityKind, Uuid)> = HashSet::new();
    let mut queue: VecDeque<(EntityKind, Uuid)> = VecDeque::new();

    visited.insert((kind, id));
    queue.push_back((kind, id));

    while let Some((current_kind, current_id)) = queue.pop_front() {
        victims.push((current_kind, current_id));

        for edge in dependents_of(current_kind) {
            match edge.dependents {
                DependentSet::Rows(child) => {
                    let dependent_ids = index.rows_referencing(current_kind, current_id, child);
                    match edge.policy {
                        DeletePolicy::Restrict => {
                            if let Some(&blocking) = dependent_ids.first() {
                                return Err(RegistryError::Restricted {
                                    kind: child,
                                    id: blocking,
                                });
                            }
                        }
                        DeletePolicy::Cascade => {
                            for dependent_id in dependent_ids {
                                if visited.insert((child, dependent_id)) {
                                    queue.push_back((child, dependent_id));
                                }
                            }
                        }
                    }
                }
                DependentSet::ParentLinks => {
                    // Membership rows never restrict; they go with either side.
                    parent_links.extend(index.parent_links_touching(current_kind, current_id));
                }
                DependentSet::TransportEnrollments => {
                    let pairs = index.enrollments_touching(current_kind, current_id);
                    match edge.policy {
                        DeletePolicy::Restrict => {
                            if let Some(&(student_id, _)) = pairs.first() {
                                // The enrolled student is the blocking row.
                                return Err(RegistryError::Restricted {
                                    kind: EntityKind::Student,
                                    id: student_id,
                                });
                            }
                        }
                        DeletePolicy::Cascade => enrollments.extend(pairs),
                    }
                }
            }
        }
    }

    parent_links.sort_unstable();
    parent_links.dedup();
    enrollments.sort_unstable();
    enrollments.dedup();

    Ok(DeletePlan {
        root: (kind, id),
        victims,
        parent_links,
        enrollments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Hand-built reference graph for exercising the planner without a store.
    #[derive(Default)]
    struct FakeIndex {
        rows: HashSet<(EntityKind, Uuid)>,
        references: HashMap<(EntityKind, Uuid, EntityKind), Vec<Uuid>>,
        parent_links: Vec<(Uuid, Uuid)>,
        enrollments: Vec<(Uuid, Uuid)>,
    }

    impl FakeIndex {
        fn add_row(&mut self, kind: EntityKind, id: Uuid) {
            self.rows.insert((kind, id));
        }

        fn add_reference(&mut self, parent: (EntityKind, Uuid), child: EntityKind, id: Uuid) {
            self.add_row(child, id);
            self.references
                .entry((parent.0, parent.1, child))
                .or_default()
                .push(id);
        }
    }

    impl ReferenceIndex for FakeIndex {
        fn row_exists(&self, kind: EntityKind, id: Uuid) -> bool {
            self.rows.contains(&(kind, id))
        }

        fn rows_referencing(
            &self,
            parent: EntityKind,
            parent_id: Uuid,
            child: EntityKind,
        ) -> Vec<Uuid> {
            self.references
                .get(&(parent, parent_id, child))
                .cloned()
                .unwrap_or_default()
        }

        fn parent_links_touching(&self, kind: EntityKind, id: Uuid) -> Vec<(Uuid, Uuid)> {
            self.parent_links
                .iter()
                .filter(|(p, s)| match kind {
                    EntityKind::ParentGuardian => *p == id,
                    EntityKind::Student => *s == id,
                    _ => false,
                })
                .copied()
                .collect()
        }

        fn enrollments_touching(&self, kind: EntityKind, id: Uuid) -> Vec<(Uuid, Uuid)> {
            self.enrollments
                .iter()
                .filter(|(s, t)| match kind {
                    EntityKind::Student => *s == id,
                    EntityKind::Transport => *t == id,
                    _ => false,
                })
                .copied()
                .collect()
        }
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let index = FakeIndex::default();
        let err = plan_delete(&index, EntityKind::Student, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }

    #[test]
    fn test_restrict_edge_blocks_whole_plan() {
        let mut index = FakeIndex::default();
        let subject = Uuid::new_v4();
        let grade = Uuid::new_v4();
        index.add_row(EntityKind::Subject, subject);
        index.add_reference((EntityKind::Subject, subject), EntityKind::Grade, grade);

        let err = plan_delete(&index, EntityKind::Subject, subject).unwrap_err();
        match err {
            RegistryError::Restricted { kind, id } => {
                assert_eq!(kind, EntityKind::Grade);
                assert_eq!(id, grade);
            }
            other => panic!("expected Restricted, got {other:?}"),
        }
    }

    #[test]
    fn test_cascade_closure_is_breadth_first() {
        let mut index = FakeIndex::default();
        let account = Uuid::new_v4();
        let student = Uuid::new_v4();
        let grade = Uuid::new_v4();
        let absence = Uuid::new_v4();
        index.add_row(EntityKind::Account, account);
        index.add_reference((EntityKind::Account, account), EntityKind::Student, student);
        index.add_reference((EntityKind::Student, student), EntityKind::Absence, absence);
        index.add_reference((EntityKind::Student, student), EntityKind::Grade, grade);

        let plan = plan_delete(&index, EntityKind::Account, account).unwrap();
        assert_eq!(plan.victims.first(), Some(&(EntityKind::Account, account)));
        assert_eq!(plan.victims.get(1), Some(&(EntityKind::Student, student)));
        assert_eq!(plan.victims.len(), 4);

        // Leaves sit at the tail, so reverse application removes them first.
        let tail: Vec<_> = plan.victims.iter().skip(2).map(|(k, _)| *k).collect();
        assert!(tail.contains(&EntityKind::Absence));
        assert!(tail.contains(&EntityKind::Grade));
    }

    #[test]
    fn test_restrict_deep_in_closure_blocks_root() {
        // account -> student cascades, but the account also teaches a subject
        let mut index = FakeIndex::default();
        let account = Uuid::new_v4();
        let student = Uuid::new_v4();
        let subject = Uuid::new_v4();
        index.add_row(EntityKind::Account, account);
        index.add_reference((EntityKind::Account, account), EntityKind::Student, student);
        index.add_reference((EntityKind::Account, account), EntityKind::Subject, subject);

        let err = plan_delete(&index, EntityKind::Account, account).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Restricted {
                kind: EntityKind::Subject,
                ..
            }
        ));
    }

    #[test]
    fn test_student_closure_collects_association_rows() {
        let mut index = FakeIndex::default();
        let student = Uuid::new_v4();
        let parent = Uuid::new_v4();
        let transport = Uuid::new_v4();
        index.add_row(EntityKind::Student, student);
        index.parent_links.push((parent, student));
        index.enrollments.push((student, transport));

        let plan = plan_delete(&index, EntityKind::Student, student).unwrap();
        assert_eq!(plan.parent_links, vec![(parent, student)]);
        assert_eq!(plan.enrollments, vec![(student, transport)]);
    }

    #[test]
    fn test_transport_with_enrollment_is_restricted() {
        let mut index = FakeIndex::default();
        let student = Uuid::new_v4();
        let transport = Uuid::new_v4();
        index.add_row(EntityKind::Transport, transport);
        index.enrollments.push((student, transport));

        let err = plan_delete(&index, EntityKind::Transport, transport).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Restricted {
                kind: EntityKind::Student,
                ..
            }
        ));
    }
}
