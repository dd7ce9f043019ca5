//! Role-gated access control for Campus Engine
//!
//! A stateless evaluator over the identity store's role assignments:
//! - A fixed policy table (role → resource type → actions) declared as data
//! - Row-scoping predicates narrowing teacher/parent/student access to rows
//!   related to the actor (subjects taught, linked students, own records)
//! - `Deny` as a normal outcome, never an error — the gate fails closed
//!
//! # Example
//!
//! ```rust
//! use auth_gate::{AccessGate, Action, Decision};
//! use records_core::EntityKind;
//! use records_core::repository::InMemoryRecordStore;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryRecordStore::new());
//!     let gate = AccessGate::new(store);
//!
//!     // Unknown actors are denied, not errored.
//!     let decision = gate
//!         .authorize(Uuid::new_v4(), EntityKind::Grade, Action::Read, None)
//!         .await?;
//!     assert_eq!(decision, Decision::Deny);
//!
//!     Ok(())
//! }
//! ```

pub mod check;
pub mod error;
pub mod policy;

pub use check::*;
pub use error::*;
pub use policy::*;
