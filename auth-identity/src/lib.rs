//! Identity management for Campus Engine
//!
//! Provisions login accounts on top of the record registry:
//! - Account registration with argon2 credential hashing
//! - Profile completion (student, parent/guardian, accountant — at most one
//!   of each type per account)
//! - Role assignment against the closed role set
//! - Credential verification for the excluded HTTP layer
//!
//! # Example
//!
//! ```rust
//! use auth_identity::{IdentityService, RegisterAccountRequest};
//! use records_core::repository::InMemoryRecordStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryRecordStore::new());
//!     let identity = IdentityService::new(store, Default::default());
//!
//!     let account_id = identity.register_account(RegisterAccountRequest {
//!         name: "Ana Popescu".to_string(),
//!         email: "ana@school.test".to_string(),
//!         secret: "correct horse".to_string(),
//!     }).await?;
//!
//!     let verified = identity.verify_credential("ana@school.test", "correct horse").await?;
//!     assert_eq!(verified, account_id);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod service;

pub use config::*;
pub use error::*;
pub use models::*;
pub use service::*;
