use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, RecordState, Result};

/// A hostel operated through the dashboard.
///
/// Owns at most one active calendar year at a time and any number of ended
/// ones. Room/staff CRUD and verification workflows live outside this core;
/// the fields here are what period and report operations read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Hostel {
    pub id: Uuid,

    pub name: String,

    /// Set by the back-office verification workflow
    pub verified: bool,

    /// Whether the hostel is visible on the public listing
    pub published: bool,

    pub state: RecordState,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Hostel {
    /// Create a new hostel record with validation
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::validation("Hostel name cannot be empty"));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            verified: false,
            published: false,
            state: RecordState::Active,
            created_at: now,
            updated_at: now,
        })
    }
}
