//! Read-only timetable surface consumed by the export/report layer.

use crate::error::{RegistryError, RegistryResult};
use crate::models::{EntityKind, Record, Timetable};
use crate::repository::RecordStore;
use std::sync::Arc;
use uuid::Uuid;

pub struct TimetableQuery {
    store: Arc<dyn RecordStore>,
}

impl TimetableQuery {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Entries for one class, sorted by day then start time.
    pub async fn list_for_class(&self, class_id: Uuid) -> RegistryResult<Vec<Timetable>> {
        if self
            .store
            .fetch(EntityKind::ClassGroup, class_id)
            .await?
            .is_none()
        {
            return Err(RegistryError::NotFound {
                kind: EntityKind::ClassGroup,
                id: class_id,
            });
        }

        let mut entries = self.store.timetables_for_class(class_id).await?;
        sort_entries(&mut entries);
        Ok(entries)
    }

    /// Entries visible to an account through its profiles: the own class for
    /// a student profile, linked students' classes for a parent profile, and
    /// taught subjects for a teaching account. Deduplicated and sorted.
    pub async fn list_for_account(&self, account_id: Uuid) -> RegistryResult<Vec<Timetable>> {
        if self
            .store
            .fetch(EntityKind::Account, account_id)
            .await?
            .is_none()
        {
            return Err(RegistryError::NotFound {
                kind: EntityKind::Account,
                id: account_id,
            });
        }

        let mut entries = Vec::new();

        if let Some(student) = self.store.student_by_account(account_id).await? {
            entries.extend(self.store.timetables_for_class(student.class_id).await?);
        }

        if let Some(parent) = self.store.parent_by_account(account_id).await? {
            for student_id in self.store.students_of_parent(parent.id).await? {
                if let Some(Record::Student(student)) =
                    self.store.fetch(EntityKind::Student, student_id).await?
                {
                    entries.extend(self.store.timetables_for_class(student.class_id).await?);
                }
            }
        }

        for subject in self.store.subjects_taught_by(account_id).await? {
            entries.extend(self.store.timetables_for_subject(subject.id).await?);
        }

        entries.sort_by_key(|t| t.id);
        entries.dedup_by_key(|t| t.id);
        sort_entries(&mut entries);
        Ok(entries)
    }
}

fn sort_entries(entries: &mut [Timetable]) {
    entries.sort_by_key(|t| (t.day, t.start_time));
}
