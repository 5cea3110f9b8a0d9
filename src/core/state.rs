use serde::{Deserialize, Serialize};
use std::fmt;

/// Explicit soft-delete lifecycle for records the surrounding dashboard
/// manages (hostels, rooms).
///
/// Replaces nullable `deleted_at` timestamps scattered through query
/// filters: every read path names the states it includes instead of
/// re-deriving them from a NULL check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(10)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    /// Visible to all read paths
    Active,
    /// Tombstoned: excluded from listings, still readable where history
    /// requires it (e.g. room denormalization at period close)
    Deleted,
}

impl Default for RecordState {
    fn default() -> Self {
        RecordState::Active
    }
}

impl RecordState {
    pub fn is_active(self) -> bool {
        self == RecordState::Active
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordState::Active => write!(f, "active"),
            RecordState::Deleted => write!(f, "deleted"),
        }
    }
}

impl std::str::FromStr for RecordState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RecordState::Active),
            "deleted" => Ok(RecordState::Deleted),
            _ => Err(format!("Invalid record state: {}", s)),
        }
    }
}
