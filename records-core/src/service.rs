use crate::error::{RegistryError, RegistryResult};
use crate::models::{EntityKind, Record, RecordDraft};
use crate::repository::RecordStore;
use crate::validation::validate_draft;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Entity graph facade: create/update/get/delete over the record store.
///
/// Shape validation happens here; referential and uniqueness constraints are
/// enforced by the store under its own lock, and deletions go through the
/// integrity engine's cascade closure.
pub struct RegistryService {
    store: Arc<dyn RecordStore>,
}

impl RegistryService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, draft: RecordDraft) -> RegistryResult<Uuid> {
        validate_draft(&draft)?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let record = draft.into_record(id, now, now);
        let kind = record.kind();
        self.store.insert(record).await?;

        debug!(%kind, %id, "created record");
        Ok(id)
    }

    /// Full-attribute replace. Keeps the row's id and creation timestamp.
    pub async fn update(&self, id: Uuid, draft: RecordDraft) -> RegistryResult<()> {
        validate_draft(&draft)?;

        let kind = draft.kind();
        let existing = self
            .store
            .fetch(kind, id)
            .await?
            .ok_or(RegistryError::NotFound { kind, id })?;

        let record = draft.into_record(id, existing.created_at(), Utc::now());
        self.store.replace(record).await?;

        debug!(%kind, %id, "updated record");
        Ok(())
    }

    pub async fn get(&self, kind: EntityKind, id: Uuid) -> RegistryResult<Record> {
        self.store
            .fetch(kind, id)
            .await?
            .ok_or(RegistryError::NotFound { kind, id })
    }

    /// Delete a row and its cascade closure atomically, or fail with the
    /// blocking dependent under a RESTRICT edge.
    pub async fn delete(&self, kind: EntityKind, id: Uuid) -> RegistryResult<()> {
        let plan = self.store.delete(kind, id).await?;
        info!(
            %kind,
            %id,
            removed = plan.victims.len(),
            links = plan.parent_links.len() + plan.enrollments.len(),
            "deleted record with closure"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use crate::repository::InMemoryRecordStore;

    fn service() -> RegistryService {
        RegistryService::new(Arc::new(InMemoryRecordStore::new()))
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let registry = service();
        let id = registry
            .create(RecordDraft::ClassGroup(ClassGroupDraft {
                name: "5B".to_string(),
                level: "5".to_string(),
            }))
            .await
            .unwrap();

        match registry.get(EntityKind::ClassGroup, id).await.unwrap() {
            Record::ClassGroup(class) => {
                assert_eq!(class.id, id);
                assert_eq!(class.name, "5B");
                assert_eq!(class.level, "5");
            }
            other => panic!("expected class group, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let registry = service();
        let err = registry
            .get(EntityKind::Transport, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let registry = service();
        let id = registry
            .create(RecordDraft::Transport(TransportDraft {
                vehicle_number: "B-101".to_string(),
                driver_name: "D. Enache".to_string(),
                route_description: "North loop".to_string(),
            }))
            .await
            .unwrap();

        let created_at = registry
            .get(EntityKind::Transport, id)
            .await
            .unwrap()
            .created_at();

        registry
            .update(
                id,
                RecordDraft::Transport(TransportDraft {
                    vehicle_number: "B-102".to_string(),
                    driver_name: "D. Enache".to_string(),
                    route_description: "North loop".to_string(),
                }),
            )
            .await
            .unwrap();

        let updated = registry.get(EntityKind::Transport, id).await.unwrap();
        assert_eq!(updated.created_at(), created_at);
        match updated {
            Record::Transport(t) => assert_eq!(t.vehicle_number, "B-102"),
            other => panic!("expected transport, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let registry = service();
        let err = registry
            .update(
                Uuid::new_v4(),
                RecordDraft::ClassGroup(ClassGroupDraft {
                    name: "6A".to_string(),
                    level: "6".to_string(),
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }
}
