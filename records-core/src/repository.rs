//! Storage seam for the record registry.
//!
//! Backends must enforce the schema's uniqueness and foreign-key constraints
//! themselves (not only at the service layer) so they stay correct under
//! concurrent writers, and must apply deletion closures atomically.

use crate::associations::OverlapPolicy;
use crate::error::RegistryResult;
use crate::integrity::DeletePlan;
use crate::models::*;
use async_trait::async_trait;
use uuid::Uuid;

mod memory;

pub use memory::InMemoryRecordStore;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new row. Enforces email uniqueness, one-profile-per-account,
    /// and foreign-key existence under the storage constraint mechanism.
    async fn insert(&self, record: Record) -> RegistryResult<()>;

    /// Replace an existing row's attributes, re-checking constraints.
    async fn replace(&self, record: Record) -> RegistryResult<()>;

    async fn fetch(&self, kind: EntityKind, id: Uuid) -> RegistryResult<Option<Record>>;

    /// Plan and apply the deletion closure for a row in one atomic step.
    /// Returns the applied plan for observability.
    async fn delete(&self, kind: EntityKind, id: Uuid) -> RegistryResult<DeletePlan>;

    // Identity lookups
    async fn find_account_by_email(&self, email: &str) -> RegistryResult<Option<Account>>;
    /// Returns whether the role was newly added.
    async fn assign_role(&self, account_id: Uuid, role: Role) -> RegistryResult<bool>;
    /// Returns whether the role was present.
    async fn revoke_role(&self, account_id: Uuid, role: Role) -> RegistryResult<bool>;

    // Ownership/scoping lookups
    async fn student_by_account(&self, account_id: Uuid) -> RegistryResult<Option<Student>>;
    async fn parent_by_account(&self, account_id: Uuid)
        -> RegistryResult<Option<ParentGuardian>>;
    async fn subjects_taught_by(&self, teacher_id: Uuid) -> RegistryResult<Vec<Subject>>;

    // Timetable reads
    async fn timetables_for_class(&self, class_id: Uuid) -> RegistryResult<Vec<Timetable>>;
    async fn timetables_for_subject(&self, subject_id: Uuid) -> RegistryResult<Vec<Timetable>>;

    // Parent↔student membership
    /// Returns `false` when the link already existed (idempotent insert).
    async fn insert_parent_link(&self, parent_id: Uuid, student_id: Uuid)
        -> RegistryResult<bool>;
    /// Returns `false` when no such link existed.
    async fn remove_parent_link(&self, parent_id: Uuid, student_id: Uuid)
        -> RegistryResult<bool>;
    async fn students_of_parent(&self, parent_id: Uuid) -> RegistryResult<Vec<Uuid>>;
    async fn parents_of_student(&self, student_id: Uuid) -> RegistryResult<Vec<Uuid>>;

    // Student↔transport enrollment
    async fn insert_enrollment(
        &self,
        enrollment: TransportEnrollment,
        overlap: OverlapPolicy,
    ) -> RegistryResult<()>;
    /// Removes every enrollment row for the pair, returning how many went.
    async fn remove_enrollments(
        &self,
        student_id: Uuid,
        transport_id: Uuid,
    ) -> RegistryResult<usize>;
    async fn enrollments_of_student(
        &self,
        student_id: Uuid,
    ) -> RegistryResult<Vec<TransportEnrollment>>;
    async fn enrollments_of_transport(
        &self,
        transport_id: Uuid,
    ) -> RegistryResult<Vec<TransportEnrollment>>;
}
