//! The fixed authorization policy, declared as data so it can be inspected
//! and tested apart from any evaluation machinery.

use records_core::{EntityKind, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

/// How a grant narrows from "any row of this type" to rows related to the
/// actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// No row scoping; the resource type and action alone decide.
    Unrestricted,
    /// Rows tied to a subject the actor teaches.
    SubjectsTaught,
    /// Rows tied to a class the actor teaches in.
    ClassesTaught,
    /// Rows tied to a student linked through a parent membership.
    LinkedStudents,
    /// Rows tied to the actor's own student profile.
    OwnStudent,
}

/// One policy entry: a resource type, the actions it covers, and the scope
/// under which they apply.
#[derive(Debug, Clone, Copy)]
pub struct Grant {
    pub resource: EntityKind,
    pub actions: &'static [Action],
    pub scope: Scope,
}

const ALL_ACTIONS: &[Action] = &[Action::Create, Action::Read, Action::Update, Action::Delete];
const READ: &[Action] = &[Action::Read];
const READ_UPDATE: &[Action] = &[Action::Read, Action::Update];
const CREATE_READ_UPDATE: &[Action] = &[Action::Create, Action::Read, Action::Update];

/// Role → grants table, fixed at design time.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    grants: HashMap<Role, Vec<Grant>>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::school_policy()
    }
}

impl PolicyTable {
    /// The school-administration policy.
    pub fn school_policy() -> Self {
        let mut grants: HashMap<Role, Vec<Grant>> = HashMap::new();

        grants.insert(
            Role::Admin,
            EntityKind::ALL
                .iter()
                .map(|&resource| Grant {
                    resource,
                    actions: ALL_ACTIONS,
                    scope: Scope::Unrestricted,
                })
                .collect(),
        );

        grants.insert(
            Role::Teacher,
            vec![
                Grant {
                    resource: EntityKind::Absence,
                    actions: READ_UPDATE,
                    scope: Scope::SubjectsTaught,
                },
                Grant {
                    resource: EntityKind::Grade,
                    actions: READ_UPDATE,
                    scope: Scope::SubjectsTaught,
                },
                Grant {
                    resource: EntityKind::Timetable,
                    actions: READ,
                    scope: Scope::ClassesTaught,
                },
                Grant {
                    resource: EntityKind::Student,
                    actions: READ,
                    scope: Scope::ClassesTaught,
                },
            ],
        );

        grants.insert(
            Role::Parent,
            [
                EntityKind::Absence,
                EntityKind::Grade,
                EntityKind::Payment,
                EntityKind::Timetable,
            ]
            .iter()
            .map(|&resource| Grant {
                resource,
                actions: READ,
                scope: Scope::LinkedStudents,
            })
            .collect(),
        );

        grants.insert(
            Role::Accountant,
            vec![
                Grant {
                    resource: EntityKind::Payment,
                    actions: CREATE_READ_UPDATE,
                    scope: Scope::Unrestricted,
                },
                Grant {
                    resource: EntityKind::Student,
                    actions: READ,
                    scope: Scope::Unrestricted,
                },
            ],
        );

        grants.insert(
            Role::Student,
            [
                EntityKind::Absence,
                EntityKind::Grade,
                EntityKind::Payment,
                EntityKind::Timetable,
            ]
            .iter()
            .map(|&resource| Grant {
                resource,
                actions: READ,
                scope: Scope::OwnStudent,
            })
            .collect(),
        );

        Self { grants }
    }

    pub fn grants_for(&self, role: Role) -> &[Grant] {
        self.grants.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Grants of `role` covering `(resource, action)`.
    pub fn covering(&self, role: Role, resource: EntityKind, action: Action) -> Vec<&Grant> {
        self.grants_for(role)
            .iter()
            .filter(|g| g.resource == resource && g.actions.contains(&action))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_covers_everything() {
        let table = PolicyTable::school_policy();
        for kind in EntityKind::ALL {
            for action in [Action::Create, Action::Read, Action::Update, Action::Delete] {
                assert!(
                    !table.covering(Role::Admin, kind, action).is_empty(),
                    "admin missing {kind}/{action:?}"
                );
            }
        }
    }

    #[test]
    fn test_teacher_cannot_delete_grades() {
        let table = PolicyTable::school_policy();
        assert!(table
            .covering(Role::Teacher, EntityKind::Grade, Action::Delete)
            .is_empty());
        assert!(!table
            .covering(Role::Teacher, EntityKind::Grade, Action::Update)
            .is_empty());
    }

    #[test]
    fn test_parent_is_read_only() {
        let table = PolicyTable::school_policy();
        for grant in table.grants_for(Role::Parent) {
            assert_eq!(grant.actions, READ);
            assert_eq!(grant.scope, Scope::LinkedStudents);
        }
    }

    #[test]
    fn test_accountant_payments_are_unscoped() {
        let table = PolicyTable::school_policy();
        let covering = table.covering(Role::Accountant, EntityKind::Payment, Action::Create);
        assert!(covering.iter().all(|g| g.scope == Scope::Unrestricted));
        // but no delete
        assert!(table
            .covering(Role::Accountant, EntityKind::Payment, Action::Delete)
            .is_empty());
    }

    #[test]
    fn test_student_sees_only_own_rows() {
        let table = PolicyTable::school_policy();
        for grant in table.grants_for(Role::Student) {
            assert_eq!(grant.scope, Scope::OwnStudent);
            assert_eq!(grant.actions, READ);
        }
    }
}
