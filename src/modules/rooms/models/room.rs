use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, RecordState, Result};

/// Which residents a room admits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(10)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RoomGender {
    Male,
    Female,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(10)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Shared,
    Private,
}

/// A room inside a hostel.
///
/// Owned and mutated by the room CRUD outside this core. Period close and
/// report assembly only read rooms: `price` feeds expected-revenue and debt
/// figures, `occupants` feeds occupancy rates, and `number` is denormalized
/// into historical snapshots when a period closes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub id: Uuid,

    pub hostel_id: Uuid,

    /// Door label shown to residents (e.g. "B-12")
    pub number: String,

    pub capacity: u32,

    /// Price per resident for one billing period
    pub price: Decimal,

    pub gender: RoomGender,

    pub room_type: RoomType,

    /// Occupancy counter, maintained by the room CRUD from resident
    /// assignments
    pub occupants: u32,

    pub state: RecordState,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Create a new room record with validation
    pub fn new(
        hostel_id: Uuid,
        number: impl Into<String>,
        capacity: u32,
        price: Decimal,
        gender: RoomGender,
        room_type: RoomType,
    ) -> Result<Self> {
        let number = number.into();
        if number.trim().is_empty() {
            return Err(AppError::validation("Room number cannot be empty"));
        }
        if capacity == 0 {
            return Err(AppError::validation("Room capacity must be at least 1"));
        }
        if price < Decimal::ZERO {
            return Err(AppError::validation("Room price cannot be negative"));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            hostel_id,
            number,
            capacity,
            price,
            gender,
            room_type,
            occupants: 0,
            state: RecordState::Active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_occupied(&self) -> bool {
        self.occupants > 0
    }
}
