//! In-memory record store for development and testing.
//!
//! Every table lives behind one `parking_lot::RwLock`, so constraint checks,
//! cascade planning, and row removal commit in a single write-lock scope —
//! a concurrent reader never observes a partially applied cascade.

use crate::associations::OverlapPolicy;
use crate::error::{RegistryError, RegistryResult};
use crate::integrity::{self, DeletePlan, ReferenceIndex};
use crate::models::*;
use crate::repository::RecordStore;
use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    classes: HashMap<Uuid, ClassGroup>,
    students: HashMap<Uuid, Student>,
    parents: HashMap<Uuid, ParentGuardian>,
    subjects: HashMap<Uuid, Subject>,
    absences: HashMap<Uuid, Absence>,
    grades: HashMap<Uuid, Grade>,
    payments: HashMap<Uuid, Payment>,
    transports: HashMap<Uuid, Transport>,
    timetables: HashMap<Uuid, Timetable>,
    accountants: HashMap<Uuid, Accountant>,
    // (parent_id, student_id)
    parent_links: BTreeSet<(Uuid, Uuid)>,
    enrollments: Vec<TransportEnrollment>,
}

impl Tables {
    fn get(&self, kind: EntityKind, id: Uuid) -> Option<Record> {
        match kind {
            EntityKind::Account => self.accounts.get(&id).cloned().map(Record::Account),
            EntityKind::ClassGroup => self.classes.get(&id).cloned().map(Record::ClassGroup),
            EntityKind::Student => self.students.get(&id).cloned().map(Record::Student),
            EntityKind::ParentGuardian => {
                self.parents.get(&id).cloned().map(Record::ParentGuardian)
            }
            EntityKind::Subject => self.subjects.get(&id).cloned().map(Record::Subject),
            EntityKind::Absence => self.absences.get(&id).cloned().map(Record::Absence),
            EntityKind::Grade => self.grades.get(&id).cloned().map(Record::Grade),
            EntityKind::Payment => self.payments.get(&id).cloned().map(Record::Payment),
            EntityKind::Transport => self.transports.get(&id).cloned().map(Record::Transport),
            EntityKind::Timetable => self.timetables.get(&id).cloned().map(Record::Timetable),
            EntityKind::Accountant => self.accountants.get(&id).cloned().map(Record::Accountant),
        }
    }

    fn put(&mut self, record: Record) {
        match record {
            Record::Account(r) => {
                self.accounts.insert(r.id, r);
            }
            Record::ClassGroup(r) => {
                self.classes.insert(r.id, r);
            }
            Record::Student(r) => {
                self.students.insert(r.id, r);
            }
            Record::ParentGuardian(r) => {
                self.parents.insert(r.id, r);
            }
            Record::Subject(r) => {
                self.subjects.insert(r.id, r);
            }
            Record::Absence(r) => {
                self.absences.insert(r.id, r);
            }
            Record::Grade(r) => {
                self.grades.insert(r.id, r);
            }
            Record::Payment(r) => {
                self.payments.insert(r.id, r);
            }
            Record::Transport(r) => {
                self.transports.insert(r.id, r);
            }
            Record::Timetable(r) => {
                self.timetables.insert(r.id, r);
            }
            Record::Accountant(r) => {
                self.accountants.insert(r.id, r);
            }
        }
    }

    fn remove(&mut self, kind: EntityKind, id: Uuid) {
        match kind {
            EntityKind::Account => {
                self.accounts.remove(&id);
            }
            EntityKind::ClassGroup => {
                self.classes.remove(&id);
            }
            EntityKind::Student => {
                self.students.remove(&id);
            }
            EntityKind::ParentGuardian => {
                self.parents.remove(&id);
            }
            EntityKind::Subject => {
                self.subjects.remove(&id);
            }
            EntityKind::Absence => {
                self.absences.remove(&id);
            }
            EntityKind::Grade => {
                self.grades.remove(&id);
            }
            EntityKind::Payment => {
                self.payments.remove(&id);
            }
            EntityKind::Transport => {
                self.transports.remove(&id);
            }
            EntityKind::Timetable => {
                self.timetables.remove(&id);
            }
            EntityKind::Accountant => {
                self.accountants.remove(&id);
            }
        }
    }

    fn require(&self, field: &'static str, kind: EntityKind, id: Uuid) -> RegistryResult<()> {
        if self.get(kind, id).is_some() {
            Ok(())
        } else {
            Err(RegistryError::dangling(field))
        }
    }

    /// Uniqueness constraints: account email, one profile of each type per
    /// account. `exclude` skips the row being replaced.
    fn check_unique(&self, record: &Record, exclude: Option<Uuid>) -> RegistryResult<()> {
        match record {
            Record::Account(account) => {
                let taken = self
                    .accounts
                    .values()
                    .any(|a| a.email == account.email && Some(a.id) != exclude);
                if taken {
                    return Err(RegistryError::DuplicateEmail {
                        email: account.email.clone(),
                    });
                }
            }
            Record::Student(student) => {
                let taken = self
                    .students
                    .values()
                    .any(|s| s.account_id == student.account_id && Some(s.id) != exclude);
                if taken {
                    return Err(RegistryError::ProfileExists {
                        kind: EntityKind::Student,
                        account_id: student.account_id,
                    });
                }
            }
            Record::ParentGuardian(parent) => {
                let taken = self
                    .parents
                    .values()
                    .any(|p| p.account_id == parent.account_id && Some(p.id) != exclude);
                if taken {
                    return Err(RegistryError::ProfileExists {
                        kind: EntityKind::ParentGuardian,
                        account_id: parent.account_id,
                    });
                }
            }
            Record::Accountant(accountant) => {
                let taken = self
                    .accountants
                    .values()
                    .any(|a| a.account_id == accountant.account_id && Some(a.id) != exclude);
                if taken {
                    return Err(RegistryError::ProfileExists {
                        kind: EntityKind::Accountant,
                        account_id: accountant.account_id,
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Foreign-key constraints: every reference resolves at the instant of
    /// mutation.
    fn check_references(&self, record: &Record) -> RegistryResult<()> {
        match record {
            Record::Account(_) | Record::ClassGroup(_) | Record::Transport(_) => Ok(()),
            Record::Student(r) => {
                self.require("account_id", EntityKind::Account, r.account_id)?;
                self.require("class_id", EntityKind::ClassGroup, r.class_id)
            }
            Record::ParentGuardian(r) => {
                self.require("account_id", EntityKind::Account, r.account_id)
            }
            Record::Subject(r) => {
                self.require("class_id", EntityKind::ClassGroup, r.class_id)?;
                self.require("teacher_id", EntityKind::Account, r.teacher_id)
            }
            Record::Absence(r) => {
                self.require("student_id", EntityKind::Student, r.student_id)?;
                self.require("subject_id", EntityKind::Subject, r.subject_id)
            }
            Record::Grade(r) => {
                self.require("student_id", EntityKind::Student, r.student_id)?;
                self.require("subject_id", EntityKind::Subject, r.subject_id)
            }
            Record::Payment(r) => self.require("student_id", EntityKind::Student, r.student_id),
            Record::Timetable(r) => {
                self.require("class_id", EntityKind::ClassGroup, r.class_id)?;
                self.require("subject_id", EntityKind::Subject, r.subject_id)
            }
            Record::Accountant(r) => self.require("account_id", EntityKind::Account, r.account_id),
        }
    }
}

impl ReferenceIndex for Tables {
    fn row_exists(&self, kind: EntityKind, id: Uuid) -> bool {
        self.get(kind, id).is_some()
    }

    fn rows_referencing(
        &self,
        parent: EntityKind,
        parent_id: Uuid,
        child: EntityKind,
    ) -> Vec<Uuid> {
        match (parent, child) {
            (EntityKind::Account, EntityKind::Student) => self
                .students
                .values()
                .filter(|r| r.account_id == parent_id)
                .map(|r| r.id)
                .collect(),
            (EntityKind::Account, EntityKind::ParentGuardian) => self
                .parents
                .values()
                .filter(|r| r.account_id == parent_id)
                .map(|r| r.id)
                .collect(),
            (EntityKind::Account, EntityKind::Accountant) => self
                .accountants
                .values()
                .filter(|r| r.account_id == parent_id)
                .map(|r| r.id)
                .collect(),
            (EntityKind::Account, EntityKind::Subject) => self
                .subjects
                .values()
                .filter(|r| r.teacher_id == parent_id)
                .map(|r| r.id)
                .collect(),
            (EntityKind::ClassGroup, EntityKind::Student) => self
                .students
                .values()
                .filter(|r| r.class_id == parent_id)
                .map(|r| r.id)
                .collect(),
            (EntityKind::ClassGroup, EntityKind::Subject) => self
                .subjects
                .values()
                .filter(|r| r.class_id == parent_id)
                .map(|r| r.id)
                .collect(),
            (EntityKind::ClassGroup, EntityKind::Timetable) => self
                .timetables
                .values()
                .filter(|r| r.class_id == parent_id)
                .map(|r| r.id)
                .collect(),
            (EntityKind::Student, EntityKind::Absence) => self
                .absences
                .values()
                .filter(|r| r.student_id == parent_id)
                .map(|r| r.id)
                .collect(),
            (EntityKind::Student, EntityKind::Grade) => self
                .grades
                .values()
                .filter(|r| r.student_id == parent_id)
                .map(|r| r.id)
                .collect(),
            (EntityKind::Student, EntityKind::Payment) => self
                .payments
                .values()
                .filter(|r| r.student_id == parent_id)
                .map(|r| r.id)
                .collect(),
            (EntityKind::Subject, EntityKind::Absence) => self
                .absences
                .values()
                .filter(|r| r.subject_id == parent_id)
                .map(|r| r.id)
                .collect(),
            (EntityKind::Subject, EntityKind::Grade) => self
                .grades
                .values()
                .filter(|r| r.subject_id == parent_id)
                .map(|r| r.id)
                .collect(),
            (EntityKind::Subject, EntityKind::Timetable) => self
                .timetables
                .values()
                .filter(|r| r.subject_id == parent_id)
                .map(|r| r.id)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn parent_links_touching(&self, kind: EntityKind, id: Uuid) -> Vec<(Uuid, Uuid)> {
        self.parent_links
            .iter()
            .filter(|(parent_id, student_id)| match kind {
                EntityKind::ParentGuardian => *parent_id == id,
                EntityKind::Student => *student_id == id,
                _ => false,
            })
            .copied()
            .collect()
    }

    fn enrollments_touching(&self, kind: EntityKind, id: Uuid) -> Vec<(Uuid, Uuid)> {
        self.enrollments
            .iter()
            .filter(|e| match kind {
                EntityKind::Student => e.student_id == id,
                EntityKind::Transport => e.transport_id == id,
                _ => false,
            })
            .map(|e| (e.student_id, e.transport_id))
            .collect()
    }
}

pub struct InMemoryRecordStore {
    tables: RwLock<Tables>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, record: Record) -> RegistryResult<()> {
        let mut tables = self.tables.write();
        if tables.get(record.kind(), record.id()).is_some() {
            return Err(RegistryError::Internal(anyhow!(
                "id collision on insert: {} {}",
                record.kind(),
                record.id()
            )));
        }
        tables.check_unique(&record, None)?;
        tables.check_references(&record)?;
        tables.put(record);
        Ok(())
    }

    async fn replace(&self, record: Record) -> RegistryResult<()> {
        let mut tables = self.tables.write();
        if tables.get(record.kind(), record.id()).is_none() {
            return Err(RegistryError::NotFound {
                kind: record.kind(),
                id: record.id(),
            });
        }
        tables.check_unique(&record, Some(record.id()))?;
        tables.check_references(&record)?;
        tables.put(record);
        Ok(())
    }

    async fn fetch(&self, kind: EntityKind, id: Uuid) -> RegistryResult<Option<Record>> {
        Ok(self.tables.read().get(kind, id))
    }

    async fn delete(&self, kind: EntityKind, id: Uuid) -> RegistryResult<DeletePlan> {
        let mut tables = self.tables.write();
        let plan = integrity::plan_delete(&*tables, kind, id)?;

        // Dependents first: walk the closure back to front.
        for &(victim_kind, victim_id) in plan.victims.iter().rev() {
            tables.remove(victim_kind, victim_id);
        }
        for pair in &plan.parent_links {
            tables.parent_links.remove(pair);
        }
        for &(student_id, transport_id) in &plan.enrollments {
            tables
                .enrollments
                .retain(|e| !(e.student_id == student_id && e.transport_id == transport_id));
        }

        debug!(
            kind = %kind,
            %id,
            victims = plan.victims.len(),
            "applied deletion closure"
        );
        Ok(plan)
    }

    async fn find_account_by_email(&self, email: &str) -> RegistryResult<Option<Account>> {
        Ok(self
            .tables
            .read()
            .accounts
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn assign_role(&self, account_id: Uuid, role: Role) -> RegistryResult<bool> {
        let mut tables = self.tables.write();
        let account = tables
            .accounts
            .get_mut(&account_id)
            .ok_or(RegistryError::NotFound {
                kind: EntityKind::Account,
                id: account_id,
            })?;
        Ok(account.roles.insert(role))
    }

    async fn revoke_role(&self, account_id: Uuid, role: Role) -> RegistryResult<bool> {
        let mut tables = self.tables.write();
        let account = tables
            .accounts
            .get_mut(&account_id)
            .ok_or(RegistryError::NotFound {
                kind: EntityKind::Account,
                id: account_id,
            })?;
        Ok(account.roles.remove(&role))
    }

    async fn student_by_account(&self, account_id: Uuid) -> RegistryResult<Option<Student>> {
        Ok(self
            .tables
            .read()
            .students
            .values()
            .find(|s| s.account_id == account_id)
            .cloned())
    }

    async fn parent_by_account(
        &self,
        account_id: Uuid,
    ) -> RegistryResult<Option<ParentGuardian>> {
        Ok(self
            .tables
            .read()
            .parents
            .values()
            .find(|p| p.account_id == account_id)
            .cloned())
    }

    async fn subjects_taught_by(&self, teacher_id: Uuid) -> RegistryResult<Vec<Subject>> {
        Ok(self
            .tables
            .read()
            .subjects
            .values()
            .filter(|s| s.teacher_id == teacher_id)
            .cloned()
            .collect())
    }

    async fn timetables_for_class(&self, class_id: Uuid) -> RegistryResult<Vec<Timetable>> {
        Ok(self
            .tables
            .read()
            .timetables
            .values()
            .filter(|t| t.class_id == class_id)
            .cloned()
            .collect())
    }

    async fn timetables_for_subject(&self, subject_id: Uuid) -> RegistryResult<Vec<Timetable>> {
        Ok(self
            .tables
            .read()
            .timetables
            .values()
            .filter(|t| t.subject_id == subject_id)
            .cloned()
            .collect())
    }

    async fn insert_parent_link(
        &self,
        parent_id: Uuid,
        student_id: Uuid,
    ) -> RegistryResult<bool> {
        let mut tables = self.tables.write();
        tables.require("parent_id", EntityKind::ParentGuardian, parent_id)?;
        tables.require("student_id", EntityKind::Student, student_id)?;
        Ok(tables.parent_links.insert((parent_id, student_id)))
    }

    async fn remove_parent_link(
        &self,
        parent_id: Uuid,
        student_id: Uuid,
    ) -> RegistryResult<bool> {
        Ok(self
            .tables
            .write()
            .parent_links
            .remove(&(parent_id, student_id)))
    }

    async fn students_of_parent(&self, parent_id: Uuid) -> RegistryResult<Vec<Uuid>> {
        Ok(self
            .tables
            .read()
            .parent_links
            .iter()
            .filter(|(p, _)| *p == parent_id)
            .map(|(_, s)| *s)
            .collect())
    }

    async fn parents_of_student(&self, student_id: Uuid) -> RegistryResult<Vec<Uuid>> {
        Ok(self
            .tables
            .read()
            .parent_links
            .iter()
            .filter(|(_, s)| *s == student_id)
            .map(|(p, _)| *p)
            .collect())
    }

    async fn insert_enrollment(
        &self,
        enrollment: TransportEnrollment,
        overlap: OverlapPolicy,
    ) -> RegistryResult<()> {
        let mut tables = self.tables.write();
        tables.require("student_id", EntityKind::Student, enrollment.student_id)?;
        tables.require("transport_id", EntityKind::Transport, enrollment.transport_id)?;

        if overlap == OverlapPolicy::RejectOpenEnded {
            let open_exists = tables.enrollments.iter().any(|e| {
                e.student_id == enrollment.student_id
                    && e.transport_id == enrollment.transport_id
                    && e.end_date.is_none()
            });
            if open_exists {
                return Err(RegistryError::DuplicateLink);
            }
        }

        tables.enrollments.push(enrollment);
        Ok(())
    }

    async fn remove_enrollments(
        &self,
        student_id: Uuid,
        transport_id: Uuid,
    ) -> RegistryResult<usize> {
        let mut tables = self.tables.write();
        let before = tables.enrollments.len();
        tables
            .enrollments
            .retain(|e| !(e.student_id == student_id && e.transport_id == transport_id));
        Ok(before - tables.enrollments.len())
    }

    async fn enrollments_of_student(
        &self,
        student_id: Uuid,
    ) -> RegistryResult<Vec<TransportEnrollment>> {
        Ok(self
            .tables
            .read()
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn enrollments_of_transport(
        &self,
        transport_id: Uuid,
    ) -> RegistryResult<Vec<TransportEnrollment>> {
        Ok(self
            .tables
            .read()
            .enrollments
            .iter()
            .filter(|e| e.transport_id == transport_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;

    fn account(email: &str) -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            roles: HashSet::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_first_account_untouched() {
        let store = InMemoryRecordStore::new();
        let first = account("shared@school.test");
        let first_id = first.id;
        store.insert(Record::Account(first)).await.unwrap();

        let err = store
            .insert(Record::Account(account("shared@school.test")))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateEmail { .. }));

        let kept = store.fetch(EntityKind::Account, first_id).await.unwrap();
        assert!(kept.is_some());
    }

    #[tokio::test]
    async fn test_dangling_reference_rejected() {
        let store = InMemoryRecordStore::new();
        let owner = account("s@school.test");
        let owner_id = owner.id;
        store.insert(Record::Account(owner)).await.unwrap();

        let student = Student {
            id: Uuid::new_v4(),
            account_id: owner_id,
            first_name: "Ana".to_string(),
            last_name: "Pop".to_string(),
            date_of_birth: chrono::NaiveDate::from_ymd_opt(2014, 9, 1).unwrap(),
            class_id: Uuid::new_v4(), // no such class
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let err = store.insert(Record::Student(student)).await.unwrap_err();
        match err {
            RegistryError::Validation { field, reason } => {
                assert_eq!(field, "class_id");
                assert_eq!(reason, "dangling reference");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_second_profile_of_same_type_rejected() {
        let store = InMemoryRecordStore::new();
        let owner = account("p@school.test");
        let owner_id = owner.id;
        store.insert(Record::Account(owner)).await.unwrap();

        let parent = |id| ParentGuardian {
            id,
            account_id: owner_id,
            first_name: "Ioana".to_string(),
            last_name: "Pop".to_string(),
            phone: "0700000000".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store
            .insert(Record::ParentGuardian(parent(Uuid::new_v4())))
            .await
            .unwrap();
        let err = store
            .insert(Record::ParentGuardian(parent(Uuid::new_v4())))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::ProfileExists { .. }));
    }

    #[tokio::test]
    async fn test_replace_missing_row_is_not_found() {
        let store = InMemoryRecordStore::new();
        let err = store
            .replace(Record::Account(account("ghost@school.test")))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }
}
