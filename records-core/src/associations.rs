use crate::error::{RegistryError, RegistryResult};
use crate::models::TransportEnrollment;
use crate::repository::RecordStore;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Whether a student may hold several open-ended enrollments on the same
/// transport. Overlap is tolerated by default; stricter deployments opt into
/// rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    AllowOverlap,
    RejectOpenEnded,
}

impl Default for OverlapPolicy {
    fn default() -> Self {
        OverlapPolicy::AllowOverlap
    }
}

/// Many-to-many link management: parent↔student membership and
/// student↔transport enrollment with a validity interval.
pub struct AssociationManager {
    store: Arc<dyn RecordStore>,
    overlap: OverlapPolicy,
}

impl AssociationManager {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            overlap: OverlapPolicy::default(),
        }
    }

    pub fn with_overlap_policy(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    /// Link a parent to a student. Idempotent: a duplicate request is a
    /// no-op keyed by the composite pair.
    pub async fn link_parent(&self, parent_id: Uuid, student_id: Uuid) -> RegistryResult<()> {
        let inserted = self.store.insert_parent_link(parent_id, student_id).await?;
        if !inserted {
            debug!(%parent_id, %student_id, "parent link already present");
        }
        Ok(())
    }

    pub async fn unlink_parent(&self, parent_id: Uuid, student_id: Uuid) -> RegistryResult<()> {
        let removed = self.store.remove_parent_link(parent_id, student_id).await?;
        if removed {
            Ok(())
        } else {
            Err(RegistryError::LinkNotFound {
                left: parent_id,
                right: student_id,
            })
        }
    }

    /// Enroll a student on a transport for a validity interval. An absent
    /// `end_date` leaves the enrollment open-ended.
    pub async fn link_transport(
        &self,
        student_id: Uuid,
        transport_id: Uuid,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> RegistryResult<()> {
        if let Some(end) = end_date {
            if end < start_date {
                return Err(RegistryError::validation(
                    "end_date",
                    "ends before start_date",
                ));
            }
        }

        self.store
            .insert_enrollment(
                TransportEnrollment {
                    student_id,
                    transport_id,
                    start_date,
                    end_date,
                },
                self.overlap,
            )
            .await
    }

    /// Remove every enrollment row for the pair.
    pub async fn unlink_transport(
        &self,
        student_id: Uuid,
        transport_id: Uuid,
    ) -> RegistryResult<()> {
        let removed = self
            .store
            .remove_enrollments(student_id, transport_id)
            .await?;
        if removed > 0 {
            Ok(())
        } else {
            Err(RegistryError::LinkNotFound {
                left: student_id,
                right: transport_id,
            })
        }
    }

    pub async fn parents_of_student(&self, student_id: Uuid) -> RegistryResult<Vec<Uuid>> {
        self.store.parents_of_student(student_id).await
    }

    pub async fn students_of_parent(&self, parent_id: Uuid) -> RegistryResult<Vec<Uuid>> {
        self.store.students_of_parent(parent_id).await
    }

    pub async fn enrollments_of_student(
        &self,
        student_id: Uuid,
    ) -> RegistryResult<Vec<TransportEnrollment>> {
        self.store.enrollments_of_student(student_id).await
    }

    pub async fn enrollments_of_transport(
        &self,
        transport_id: Uuid,
    ) -> RegistryResult<Vec<TransportEnrollment>> {
        self.store.enrollments_of_transport(transport_id).await
    }
}
