use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Result};

/// One billing/occupancy cycle of a hostel (typically an academic year).
///
/// Born active, accumulates residents and payments, then transitions once
/// and irreversibly to ended: `end_date` is set exactly that once and
/// `is_active` drops to false. Per hostel at most one row is active at any
/// instant; the store enforces the invariant on insert and the close path
/// re-checks it atomically.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CalendarYear {
    pub id: Uuid,

    pub hostel_id: Uuid,

    /// Operator-facing label, e.g. "2025-2026"
    pub name: String,

    pub start_date: DateTime<Utc>,

    /// Set exactly once, when the period closes; never null afterwards
    pub end_date: Option<DateTime<Utc>>,

    pub is_active: bool,

    /// Capacity-based revenue expectation frozen at close time, so
    /// historical collection rates never shift when room prices change
    pub expected_revenue_at_close: Option<Decimal>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl CalendarYear {
    /// Open a new active period for a hostel.
    pub fn open(hostel_id: Uuid, name: impl Into<String>, now: DateTime<Utc>) -> Result<Self> {
        let name = Self::validate_name(name)?;

        Ok(Self {
            id: Uuid::new_v4(),
            hostel_id,
            name,
            start_date: now,
            end_date: None,
            is_active: true,
            expected_revenue_at_close: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validate and normalize a period name (trimmed, non-empty).
    pub fn validate_name(name: impl Into<String>) -> Result<String> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("Period name cannot be empty"));
        }
        if trimmed.len() > 100 {
            return Err(AppError::validation(
                "Period name cannot exceed 100 characters",
            ));
        }
        Ok(trimmed.to_string())
    }

    pub fn is_ended(&self) -> bool {
        !self.is_active
    }
}
