use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Closed set of roles an account may hold. Roles are tags on the account,
/// not rows; the authorization policy table keys off this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Parent,
    Student,
    Accountant,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Teacher,
        Role::Parent,
        Role::Student,
        Role::Accountant,
    ];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Parent => "parent",
            Role::Student => "student",
            Role::Accountant => "accountant",
        };
        write!(f, "{}", name)
    }
}

/// Every row type the registry manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Account,
    ClassGroup,
    Student,
    ParentGuardian,
    Subject,
    Absence,
    Grade,
    Payment,
    Transport,
    Timetable,
    Accountant,
}

impl EntityKind {
    pub const ALL: [EntityKind; 11] = [
        EntityKind::Account,
        EntityKind::ClassGroup,
        EntityKind::Student,
        EntityKind::ParentGuardian,
        EntityKind::Subject,
        EntityKind::Absence,
        EntityKind::Grade,
        EntityKind::Payment,
        EntityKind::Transport,
        EntityKind::Timetable,
        EntityKind::Accountant,
    ];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Account => "account",
            EntityKind::ClassGroup => "class_group",
            EntityKind::Student => "student",
            EntityKind::ParentGuardian => "parent_guardian",
            EntityKind::Subject => "subject",
            EntityKind::Absence => "absence",
            EntityKind::Grade => "grade",
            EntityKind::Payment => "payment",
            EntityKind::Transport => "transport",
            EntityKind::Timetable => "timetable",
            EntityKind::Accountant => "accountant",
        };
        write!(f, "{}", name)
    }
}

/// What a payment covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Tuition,
    Transport,
    Other,
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Lesson day. Declaration order drives timetable sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Login account. Student/parent/accountant profiles and taught subjects
/// reference it; credentials are an opaque hash owned by the identity layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub roles: HashSet<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassGroup {
    pub id: Uuid,
    pub name: String,
    pub level: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub account_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub class_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentGuardian {
    pub id: Uuid,
    pub account_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Taught subject. `teacher_id` references the teaching account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub class_id: Uuid,
    pub teacher_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Absence {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub date: NaiveDate,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Exam grade. `value` is fixed-point with two fractional digits; never
/// compare grades through floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub value: Decimal,
    pub exam_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    pub id: Uuid,
    pub vehicle_number: String,
    pub driver_name: String,
    pub route_description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timetable {
    pub id: Uuid,
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub day: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accountant {
    pub id: Uuid,
    pub account_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Transport enrollment row: student↔transport with a validity interval.
/// Identified by its composite pair; an absent `end_date` means open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportEnrollment {
    pub student_id: Uuid,
    pub transport_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// A typed row of any entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Account(Account),
    ClassGroup(ClassGroup),
    Student(Student),
    ParentGuardian(ParentGuardian),
    Subject(Subject),
    Absence(Absence),
    Grade(Grade),
    Payment(Payment),
    Transport(Transport),
    Timetable(Timetable),
    Accountant(Accountant),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Account(_) => EntityKind::Account,
            Record::ClassGroup(_) => EntityKind::ClassGroup,
            Record::Student(_) => EntityKind::Student,
            Record::ParentGuardian(_) => EntityKind::ParentGuardian,
            Record::Subject(_) => EntityKind::Subject,
            Record::Absence(_) => EntityKind::Absence,
            Record::Grade(_) => EntityKind::Grade,
            Record::Payment(_) => EntityKind::Payment,
            Record::Transport(_) => EntityKind::Transport,
            Record::Timetable(_) => EntityKind::Timetable,
            Record::Accountant(_) => EntityKind::Accountant,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Record::Account(r) => r.id,
            Record::ClassGroup(r) => r.id,
            Record::Student(r) => r.id,
            Record::ParentGuardian(r) => r.id,
            Record::Subject(r) => r.id,
            Record::Absence(r) => r.id,
            Record::Grade(r) => r.id,
            Record::Payment(r) => r.id,
            Record::Transport(r) => r.id,
            Record::Timetable(r) => r.id,
            Record::Accountant(r) => r.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Record::Account(r) => r.created_at,
            Record::ClassGroup(r) => r.created_at,
            Record::Student(r) => r.created_at,
            Record::ParentGuardian(r) => r.created_at,
            Record::Subject(r) => r.created_at,
            Record::Absence(r) => r.created_at,
            Record::Grade(r) => r.created_at,
            Record::Payment(r) => r.created_at,
            Record::Transport(r) => r.created_at,
            Record::Timetable(r) => r.created_at,
            Record::Accountant(r) => r.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassGroupDraft {
    pub name: String,
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentDraft {
    pub account_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub class_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentGuardianDraft {
    pub account_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectDraft {
    pub name: String,
    pub class_id: Uuid,
    pub teacher_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceDraft {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeDraft {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub value: Decimal,
    pub exam_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDraft {
    pub student_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportDraft {
    pub vehicle_number: String,
    pub driver_name: String,
    pub route_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableDraft {
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub day: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountantDraft {
    pub account_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Attribute payload for create/update. Accounts are provisioned through the
/// identity layer and have no draft variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordDraft {
    ClassGroup(ClassGroupDraft),
    Student(StudentDraft),
    ParentGuardian(ParentGuardianDraft),
    Subject(SubjectDraft),
    Absence(AbsenceDraft),
    Grade(GradeDraft),
    Payment(PaymentDraft),
    Transport(TransportDraft),
    Timetable(TimetableDraft),
    Accountant(AccountantDraft),
}

impl RecordDraft {
    pub fn kind(&self) -> EntityKind {
        match self {
            RecordDraft::ClassGroup(_) => EntityKind::ClassGroup,
            RecordDraft::Student(_) => EntityKind::Student,
            RecordDraft::ParentGuardian(_) => EntityKind::ParentGuardian,
            RecordDraft::Subject(_) => EntityKind::Subject,
            RecordDraft::Absence(_) => EntityKind::Absence,
            RecordDraft::Grade(_) => EntityKind::Grade,
            RecordDraft::Payment(_) => EntityKind::Payment,
            RecordDraft::Transport(_) => EntityKind::Transport,
            RecordDraft::Timetable(_) => EntityKind::Timetable,
            RecordDraft::Accountant(_) => EntityKind::Accountant,
        }
    }

    /// Materialize the draft into a full row. Decimal fields are rescaled to
    /// exactly two fractional digits; the caller has already validated shape.
    pub fn into_record(
        self,
        id: Uuid,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Record {
        match self {
            RecordDraft::ClassGroup(d) => Record::ClassGroup(ClassGroup {
                id,
                name: d.name,
                level: d.level,
                created_at,
                updated_at,
            }),
            RecordDraft::Student(d) => Record::Student(Student {
                id,
                account_id: d.account_id,
                first_name: d.first_name,
                last_name: d.last_name,
                date_of_birth: d.date_of_birth,
                class_id: d.class_id,
                created_at,
                updated_at,
            }),
            RecordDraft::ParentGuardian(d) => Record::ParentGuardian(ParentGuardian {
                id,
                account_id: d.account_id,
                first_name: d.first_name,
                last_name: d.last_name,
                phone: d.phone,
                created_at,
                updated_at,
            }),
            RecordDraft::Subject(d) => Record::Subject(Subject {
                id,
                name: d.name,
                class_id: d.class_id,
                teacher_id: d.teacher_id,
                created_at,
                updated_at,
            }),
            RecordDraft::Absence(d) => Record::Absence(Absence {
                id,
                student_id: d.student_id,
                subject_id: d.subject_id,
                date: d.date,
                reason: d.reason,
                created_at,
                updated_at,
            }),
            RecordDraft::Grade(d) => {
                let mut value = d.value;
                value.rescale(2);
                Record::Grade(Grade {
                    id,
                    student_id: d.student_id,
                    subject_id: d.subject_id,
                    value,
                    exam_date: d.exam_date,
                    created_at,
                    updated_at,
                })
            }
            RecordDraft::Payment(d) => {
                let mut amount = d.amount;
                amount.rescale(2);
                Record::Payment(Payment {
                    id,
                    student_id: d.student_id,
                    amount,
                    payment_date: d.payment_date,
                    payment_type: d.payment_type,
                    status: d.status,
                    created_at,
                    updated_at,
                })
            }
            RecordDraft::Transport(d) => Record::Transport(Transport {
                id,
                vehicle_number: d.vehicle_number,
                driver_name: d.driver_name,
                route_description: d.route_description,
                created_at,
                updated_at,
            }),
            RecordDraft::Timetable(d) => Record::Timetable(Timetable {
                id,
                class_id: d.class_id,
                subject_id: d.subject_id,
                day: d.day,
                start_time: d.start_time,
                end_time: d.end_time,
                created_at,
                updated_at,
            }),
            RecordDraft::Accountant(d) => Record::Accountant(Accountant {
                id,
                account_id: d.account_id,
                first_name: d.first_name,
                last_name: d.last_name,
                phone: d.phone,
                created_at,
                updated_at,
            }),
        }
    }
}
