use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAccountRequest {
    pub name: String,
    pub email: String,
    pub secret: String,
}

/// Profile payload for the "profile completion" step. An account may hold at
/// most one profile of each type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProfileDraft {
    Student {
        first_name: String,
        last_name: String,
        date_of_birth: NaiveDate,
        class_id: Uuid,
    },
    ParentGuardian {
        first_name: String,
        last_name: String,
        phone: String,
    },
    Accountant {
        first_name: String,
        last_name: String,
        phone: String,
    },
}
