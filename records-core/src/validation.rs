//! Attribute-shape validation, applied before any storage is touched.
//! Referential checks live in the storage layer where they can run under its
//! constraint mechanism.

use crate::error::{RegistryError, RegistryResult};
use crate::models::RecordDraft;
use rust_decimal::Decimal;

// Column widths from the relational schema.
const PHONE_MAX: usize = 20;
const VEHICLE_NUMBER_MAX: usize = 50;

fn require_text(field: &'static str, value: &str, max: Option<usize>) -> RegistryResult<()> {
    if value.trim().is_empty() {
        return Err(RegistryError::validation(field, "must not be empty"));
    }
    if let Some(max) = max {
        if value.chars().count() > max {
            return Err(RegistryError::validation(
                field,
                format!("longer than {max} characters"),
            ));
        }
    }
    Ok(())
}

/// Fixed-point check mirroring `decimal(p, 2)`: non-negative, at most two
/// fractional digits, integral part within `integral_digits`.
fn require_decimal(
    field: &'static str,
    value: Decimal,
    integral_digits: u32,
) -> RegistryResult<()> {
    if value.is_sign_negative() {
        return Err(RegistryError::validation(field, "must not be negative"));
    }
    if value.normalize().scale() > 2 {
        return Err(RegistryError::validation(
            field,
            "more than 2 fractional digits",
        ));
    }
    let limit = Decimal::from(10_i64.pow(integral_digits));
    if value >= limit {
        return Err(RegistryError::validation(
            field,
            format!("must be below {limit}"),
        ));
    }
    Ok(())
}

pub fn validate_draft(draft: &RecordDraft) -> RegistryResult<()> {
    match draft {
        RecordDraft::ClassGroup(d) => {
            require_text("name", &d.name, None)?;
            require_text("level", &d.level, None)
        }
        RecordDraft::Student(d) => {
            require_text("first_name", &d.first_name, None)?;
            require_text("last_name", &d.last_name, None)
        }
        RecordDraft::ParentGuardian(d) => {
            require_text("first_name", &d.first_name, None)?;
            require_text("last_name", &d.last_name, None)?;
            require_text("phone", &d.phone, Some(PHONE_MAX))
        }
        RecordDraft::Subject(d) => require_text("name", &d.name, None),
        RecordDraft::Absence(d) => {
            // Reason is free text; only reject an explicitly empty one.
            if let Some(reason) = &d.reason {
                require_text("reason", reason, None)?;
            }
            Ok(())
        }
        RecordDraft::Grade(d) => require_decimal("value", d.value, 3),
        RecordDraft::Payment(d) => require_decimal("amount", d.amount, 8),
        RecordDraft::Transport(d) => {
            require_text("vehicle_number", &d.vehicle_number, Some(VEHICLE_NUMBER_MAX))?;
            require_text("driver_name", &d.driver_name, None)?;
            require_text("route_description", &d.route_description, None)
        }
        RecordDraft::Timetable(_) => Ok(()),
        RecordDraft::Accountant(d) => {
            require_text("first_name", &d.first_name, None)?;
            require_text("last_name", &d.last_name, None)?;
            require_text("phone", &d.phone, Some(PHONE_MAX))
        }
    }
}
