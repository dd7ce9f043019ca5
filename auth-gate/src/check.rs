use crate::error::GateResult;
use crate::policy::{Action, PolicyTable, Scope};
use records_core::repository::RecordStore;
use records_core::{Account, EntityKind, Record};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Authorization outcome. `Deny` is a normal result the caller surfaces as a
/// refusal, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allow(self) -> bool {
        self == Decision::Allow
    }
}

/// Stateless policy evaluator. Holds no authorization state of its own;
/// roles come from the account row, scoping facts from the record store.
pub struct AccessGate {
    store: Arc<dyn RecordStore>,
    policy: PolicyTable,
}

impl AccessGate {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            policy: PolicyTable::school_policy(),
        }
    }

    pub fn with_policy(mut self, policy: PolicyTable) -> Self {
        self.policy = policy;
        self
    }

    /// Decide whether `actor` may perform `action` on `resource`.
    ///
    /// `target` names the specific row for row-scoped roles; type-level
    /// requests (e.g. create) pass `None`. The decision is the OR across all
    /// held roles, and every failure mode — unknown actor, missing target on
    /// a scoped grant, scoping miss — reads as `Deny`.
    pub async fn authorize(
        &self,
        actor: Uuid,
        resource: EntityKind,
        action: Action,
        target: Option<Uuid>,
    ) -> GateResult<Decision> {
        let Some(Record::Account(account)) =
            self.store.fetch(EntityKind::Account, actor).await?
        else {
            debug!(%actor, "authorize: unknown actor");
            return Ok(Decision::Deny);
        };

        for &role in &account.roles {
            for grant in self.policy.covering(role, resource, action) {
                if self.scope_holds(grant.scope, &account, resource, target).await? {
                    debug!(%actor, %role, %resource, ?action, "authorize: allow");
                    return Ok(Decision::Allow);
                }
            }
        }

        debug!(%actor, %resource, ?action, "authorize: deny");
        Ok(Decision::Deny)
    }

    async fn scope_holds(
        &self,
        scope: Scope,
        account: &Account,
        resource: EntityKind,
        target: Option<Uuid>,
    ) -> GateResult<bool> {
        if scope == Scope::Unrestricted {
            return Ok(true);
        }

        // Row-scoped grants need a concrete row to scope against.
        let Some(target) = target else {
            return Ok(false);
        };
        let Some(row) = self.store.fetch(resource, target).await? else {
            return Ok(false);
        };

        match scope {
            Scope::Unrestricted => Ok(true),
            Scope::SubjectsTaught => {
                let Some(subject_id) = subject_of_row(&row) else {
                    return Ok(false);
                };
                let Some(Record::Subject(subject)) =
                    self.store.fetch(EntityKind::Subject, subject_id).await?
                else {
                    return Ok(false);
                };
                Ok(subject.teacher_id == account.id)
            }
            Scope::ClassesTaught => {
                let Some(class_id) = class_of_row(&row) else {
                    return Ok(false);
                };
                let taught = self.store.subjects_taught_by(account.id).await?;
                Ok(taught.iter().any(|s| s.class_id == class_id))
            }
            Scope::LinkedStudents => {
                let Some(parent) = self.store.parent_by_account(account.id).await? else {
                    return Ok(false);
                };
                let linked = self.store.students_of_parent(parent.id).await?;

                if let Some(student_id) = student_of_row(&row) {
                    return Ok(linked.contains(&student_id));
                }
                let Some(class_id) = class_of_row(&row) else {
                    return Ok(false);
                };
                for student_id in linked {
                    if let Some(Record::Student(student)) =
                        self.store.fetch(EntityKind::Student, student_id).await?
                    {
                        if student.class_id == class_id {
                            return Ok(true);
                        }
                    }
                }
                Ok(false)
            }
            Scope::OwnStudent => {
                let Some(own) = self.store.student_by_account(account.id).await? else {
                    return Ok(false);
                };
                if let Some(student_id) = student_of_row(&row) {
                    return Ok(student_id == own.id);
                }
                Ok(class_of_row(&row) == Some(own.class_id))
            }
        }
    }
}

/// The student a row belongs to, for rows that carry one.
fn student_of_row(row: &Record) -> Option<Uuid> {
    match row {
        Record::Absence(r) => Some(r.student_id),
        Record::Grade(r) => Some(r.student_id),
        Record::Payment(r) => Some(r.student_id),
        Record::Student(r) => Some(r.id),
        _ => None,
    }
}

fn subject_of_row(row: &Record) -> Option<Uuid> {
    match row {
        Record::Absence(r) => Some(r.subject_id),
        Record::Grade(r) => Some(r.subject_id),
        Record::Timetable(r) => Some(r.subject_id),
        _ => None,
    }
}

fn class_of_row(row: &Record) -> Option<Uuid> {
    match row {
        Record::Student(r) => Some(r.class_id),
        Record::Timetable(r) => Some(r.class_id),
        Record::Subject(r) => Some(r.class_id),
        _ => None,
    }
}
