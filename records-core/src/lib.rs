//! School-administration record store for Campus Engine
//!
//! This crate holds the relational domain model and the rules that keep it
//! consistent:
//! - **Entity graph**: typed records (classes, students, parents, subjects,
//!   absences, grades, payments, transport, timetables, accountants) and the
//!   directed references between them
//! - **Integrity engine**: explicit cascade/restrict deletion policy with a
//!   breadth-first closure planner, applied atomically
//! - **Association manager**: many-to-many links carrying their own
//!   attributes (parent membership, transport enrollment intervals)
//! - **Timetable queries**: the read-only surface consumed by export layers
//!
//! Storage goes through the [`repository::RecordStore`] trait; the bundled
//! in-memory implementation enforces the same uniqueness and foreign-key
//! constraints a relational backend would.
//!
//! # Example
//!
//! ```rust
//! use records_core::{RegistryService, RecordDraft, ClassGroupDraft};
//! use records_core::repository::InMemoryRecordStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryRecordStore::new());
//!     let registry = RegistryService::new(store);
//!
//!     let class_id = registry.create(RecordDraft::ClassGroup(ClassGroupDraft {
//!         name: "5B".to_string(),
//!         level: "5".to_string(),
//!     })).await?;
//!
//!     let class = registry.get(records_core::EntityKind::ClassGroup, class_id).await?;
//!     println!("created {:?}", class);
//!
//!     Ok(())
//! }
//! ```

pub mod associations;
pub mod error;
pub mod integrity;
pub mod models;
pub mod policy;
pub mod query;
pub mod repository;
pub mod service;
pub mod validation;

pub use associations::*;
pub use error::*;
pub use integrity::{DeletePlan, ReferenceIndex};
pub use models::*;
pub use policy::*;
pub use query::*;
pub use service::*;
