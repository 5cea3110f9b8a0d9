use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::rooms::Room;

/// A resident enrolled in the currently active period of a hostel.
///
/// Live residents are the mutable working set: room assignment, course and
/// check-out date can change while the period is open. When the period
/// closes they are migrated wholesale into [`HistoricalResident`] snapshots
/// and removed from this table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resident {
    pub id: Uuid,

    pub hostel_id: Uuid,

    /// The period the resident was enrolled under; fixed at creation
    pub calendar_year_id: Uuid,

    pub room_id: Option<Uuid>,

    pub full_name: String,

    /// Institutional identifier (registration/matric number)
    pub student_id: String,

    pub course: Option<String>,

    pub check_in_date: NaiveDate,

    pub check_out_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Resident {
    /// Create a new live resident with validation
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hostel_id: Uuid,
        calendar_year_id: Uuid,
        room_id: Option<Uuid>,
        full_name: impl Into<String>,
        student_id: impl Into<String>,
        course: Option<String>,
        check_in_date: NaiveDate,
    ) -> Result<Self> {
        let full_name = full_name.into();
        if full_name.trim().is_empty() {
            return Err(AppError::validation("Resident name cannot be empty"));
        }
        let student_id = student_id.into();
        if student_id.trim().is_empty() {
            return Err(AppError::validation("Student ID cannot be empty"));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            hostel_id,
            calendar_year_id,
            room_id,
            full_name,
            student_id,
            course,
            check_in_date,
            check_out_date: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Immutable snapshot of a resident as of the moment their period closed.
///
/// Identity fields are copied, the room is denormalized by number and price
/// (so later room edits or deletions never rewrite history), and the record
/// keeps a back-reference to the now-ended calendar year. Produced only by
/// the archival migrator, exactly once per resident per period close, and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoricalResident {
    pub id: Uuid,

    pub hostel_id: Uuid,

    /// The ended period this snapshot belongs to
    pub calendar_year_id: Uuid,

    /// Id of the live resident row this snapshot was taken from
    pub source_resident_id: Uuid,

    pub full_name: String,

    pub student_id: String,

    pub course: Option<String>,

    /// Room number as occupied during the period, denormalized at close
    pub room_number: Option<String>,

    /// Room price in effect at close, frozen for stable debt figures
    pub room_price_at_close: Option<Decimal>,

    pub check_in_date: NaiveDate,

    pub check_out_date: Option<NaiveDate>,

    pub archived_at: DateTime<Utc>,
}

impl HistoricalResident {
    /// Snapshot a live resident at period close.
    ///
    /// `room` is the resident's room looked up at migration time (including
    /// soft-deleted rows, so a tombstoned room still yields its number).
    pub fn snapshot(resident: &Resident, room: Option<&Room>, archived_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            hostel_id: resident.hostel_id,
            calendar_year_id: resident.calendar_year_id,
            source_resident_id: resident.id,
            full_name: resident.full_name.clone(),
            student_id: resident.student_id.clone(),
            course: resident.course.clone(),
            room_number: room.map(|r| r.number.clone()),
            room_price_at_close: room.map(|r| r.price),
            check_in_date: resident.check_in_date,
            check_out_date: resident.check_out_date,
            archived_at,
        }
    }
}

/// A resident record from either side of the live/historical split.
///
/// The two shapes are an intentional tagged-variant split, not duplication:
/// only `Live` is mutable, only `Archived` is produced by the migrator.
/// Consumers that just need display fields match on either through the
/// accessors below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResidentRecord {
    Live(Resident),
    Archived(HistoricalResident),
}

impl ResidentRecord {
    pub fn is_live(&self) -> bool {
        matches!(self, ResidentRecord::Live(_))
    }

    pub fn full_name(&self) -> &str {
        match self {
            ResidentRecord::Live(r) => &r.full_name,
            ResidentRecord::Archived(h) => &h.full_name,
        }
    }

    pub fn student_id(&self) -> &str {
        match self {
            ResidentRecord::Live(r) => &r.student_id,
            ResidentRecord::Archived(h) => &h.student_id,
        }
    }

    pub fn calendar_year_id(&self) -> Uuid {
        match self {
            ResidentRecord::Live(r) => r.calendar_year_id,
            ResidentRecord::Archived(h) => h.calendar_year_id,
        }
    }

    pub fn check_in_date(&self) -> NaiveDate {
        match self {
            ResidentRecord::Live(r) => r.check_in_date,
            ResidentRecord::Archived(h) => h.check_in_date,
        }
    }
}
