use crate::{config::IdentityConfig, error::*, models::*};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use records_core::repository::RecordStore;
use records_core::{Account, EntityKind, Record, RecordDraft, Role};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct IdentityService {
    store: Arc<dyn RecordStore>,
    config: IdentityConfig,
    argon2: Argon2<'static>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn RecordStore>, config: IdentityConfig) -> Self {
        Self {
            store,
            config,
            argon2: Argon2::default(),
        }
    }

    /// Provision a login account. The email must be unique; the storage
    /// constraint is authoritative under concurrent registration.
    pub async fn register_account(
        &self,
        request: RegisterAccountRequest,
    ) -> IdentityResult<Uuid> {
        if !self.is_valid_email(&request.email) {
            return Err(IdentityError::InvalidEmail);
        }
        if request.secret.len() < self.config.min_secret_length {
            return Err(IdentityError::WeakSecret);
        }

        let password_hash = self.hash_secret(&request.secret)?;
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: request.name,
            email: request.email,
            password_hash,
            roles: HashSet::new(),
            created_at: now,
            updated_at: now,
        };
        let id = account.id;

        self.store.insert(Record::Account(account)).await?;
        info!(account_id = %id, "registered account");
        Ok(id)
    }

    /// Attach a profile to an account. At most one profile of each type per
    /// account; the student profile additionally references its class.
    pub async fn attach_profile(
        &self,
        account_id: Uuid,
        profile: ProfileDraft,
    ) -> IdentityResult<Uuid> {
        if self
            .store
            .fetch(EntityKind::Account, account_id)
            .await?
            .is_none()
        {
            return Err(IdentityError::AccountNotFound);
        }

        let draft = match profile {
            ProfileDraft::Student {
                first_name,
                last_name,
                date_of_birth,
                class_id,
            } => RecordDraft::Student(records_core::StudentDraft {
                account_id,
                first_name,
                last_name,
                date_of_birth,
                class_id,
            }),
            ProfileDraft::ParentGuardian {
                first_name,
                last_name,
                phone,
            } => RecordDraft::ParentGuardian(records_core::ParentGuardianDraft {
                account_id,
                first_name,
                last_name,
                phone,
            }),
            ProfileDraft::Accountant {
                first_name,
                last_name,
                phone,
            } => RecordDraft::Accountant(records_core::AccountantDraft {
                account_id,
                first_name,
                last_name,
                phone,
            }),
        };

        records_core::validation::validate_draft(&draft)?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let kind = draft.kind();
        self.store.insert(draft.into_record(id, now, now)).await?;

        info!(%account_id, profile_id = %id, %kind, "attached profile");
        Ok(id)
    }

    pub async fn assign_role(&self, account_id: Uuid, role: Role) -> IdentityResult<()> {
        let added = self.store.assign_role(account_id, role).await?;
        if added {
            info!(%account_id, %role, "assigned role");
        }
        Ok(())
    }

    pub async fn revoke_role(&self, account_id: Uuid, role: Role) -> IdentityResult<()> {
        let removed = self.store.revoke_role(account_id, role).await?;
        if removed {
            info!(%account_id, %role, "revoked role");
        }
        Ok(())
    }

    /// Verify a credential pair. The same error covers unknown email and
    /// mismatching secret, so callers learn nothing about registered emails.
    pub async fn verify_credential(&self, email: &str, secret: &str) -> IdentityResult<Uuid> {
        let account = self
            .store
            .find_account_by_email(email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        self.verify_secret(secret, &account.password_hash)?;
        Ok(account.id)
    }

    fn hash_secret(&self, secret: &str) -> IdentityResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|_| IdentityError::HashingError)?
            .to_string();
        Ok(hash)
    }

    fn verify_secret(&self, secret: &str, hash: &str) -> IdentityResult<()> {
        let parsed = PasswordHash::new(hash).map_err(|_| IdentityError::HashingError)?;
        self.argon2
            .verify_password(secret.as_bytes(), &parsed)
            .map_err(|_| IdentityError::InvalidCredentials)
    }

    fn is_valid_email(&self, email: &str) -> bool {
        email.contains('@') && email.contains('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use records_core::repository::InMemoryRecordStore;
    use records_core::{ClassGroupDraft, RegistryService};

    fn identity() -> (Arc<InMemoryRecordStore>, IdentityService) {
        let store = Arc::new(InMemoryRecordStore::new());
        let service = IdentityService::new(store.clone(), IdentityConfig::default());
        (store, service)
    }

    fn request(email: &str) -> RegisterAccountRequest {
        RegisterAccountRequest {
            name: "Ana Popescu".to_string(),
            email: email.to_string(),
            secret: "correct horse".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_verify() {
        let (_, service) = identity();
        let id = service.register_account(request("ana@school.test")).await.unwrap();

        let verified = service
            .verify_credential("ana@school.test", "correct horse")
            .await
            .unwrap();
        assert_eq!(verified, id);

        let err = service
            .verify_credential("ana@school.test", "wrong secret")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials));

        // Unknown email reads the same as a wrong secret.
        let err = service
            .verify_credential("ghost@school.test", "correct horse")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (_, service) = identity();
        service.register_account(request("ana@school.test")).await.unwrap();

        let err = service
            .register_account(request("ana@school.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::DuplicateEmail { .. }));
    }

    #[tokio::test]
    async fn test_invalid_email_and_weak_secret() {
        let (_, service) = identity();

        let err = service
            .register_account(RegisterAccountRequest {
                name: "X".to_string(),
                email: "not-an-email".to_string(),
                secret: "correct horse".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidEmail));

        let err = service
            .register_account(RegisterAccountRequest {
                name: "X".to_string(),
                email: "x@school.test".to_string(),
                secret: "short".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::WeakSecret));
    }

    #[tokio::test]
    async fn test_one_profile_of_each_type() {
        let (store, service) = identity();
        let registry = RegistryService::new(store);
        let class_id = registry
            .create(RecordDraft::ClassGroup(ClassGroupDraft {
                name: "5B".to_string(),
                level: "5".to_string(),
            }))
            .await
            .unwrap();

        let account_id = service.register_account(request("dual@school.test")).await.unwrap();

        let student = ProfileDraft::Student {
            first_name: "Ana".to_string(),
            last_name: "Popescu".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2014, 3, 14).unwrap(),
            class_id,
        };
        service
            .attach_profile(account_id, student.clone())
            .await
            .unwrap();

        let err = service.attach_profile(account_id, student).await.unwrap_err();
        assert!(matches!(
            err,
            IdentityError::ProfileAlreadyAttached {
                kind: EntityKind::Student
            }
        ));

        // A different profile type on the same account is fine.
        service
            .attach_profile(
                account_id,
                ProfileDraft::ParentGuardian {
                    first_name: "Ana".to_string(),
                    last_name: "Popescu".to_string(),
                    phone: "0712345678".to_string(),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_attach_profile_to_missing_account() {
        let (_, service) = identity();
        let err = service
            .attach_profile(
                Uuid::new_v4(),
                ProfileDraft::Accountant {
                    first_name: "C".to_string(),
                    last_name: "V".to_string(),
                    phone: "0712345678".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::AccountNotFound));
    }

    #[tokio::test]
    async fn test_role_assignment_round_trip() {
        let (store, service) = identity();
        let account_id = service.register_account(request("t@school.test")).await.unwrap();

        service.assign_role(account_id, Role::Teacher).await.unwrap();
        service.assign_role(account_id, Role::Teacher).await.unwrap(); // idempotent

        let Some(Record::Account(account)) =
            store.fetch(EntityKind::Account, account_id).await.unwrap()
        else {
            panic!("account missing");
        };
        assert!(account.roles.contains(&Role::Teacher));

        service.revoke_role(account_id, Role::Teacher).await.unwrap();
        let Some(Record::Account(account)) =
            store.fetch(EntityKind::Account, account_id).await.unwrap()
        else {
            panic!("account missing");
        };
        assert!(!account.roles.contains(&Role::Teacher));

        let err = service
            .assign_role(Uuid::new_v4(), Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::AccountNotFound));
    }
}
