use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Result};

/// Payment status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Recorded but not yet confirmed by the office
    Pending,

    /// Money received; the only status that counts as revenue
    Confirmed,

    /// Bounced or rejected
    Failed,

    /// Confirmed and later returned
    Refunded,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Confirmed => write!(f, "confirmed"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "confirmed" => Ok(PaymentStatus::Confirmed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// How a payment was made. Recorded payments may carry no method at all;
/// aggregation reports those under an explicit "unspecified" bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    MobileMoney,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::BankTransfer => write!(f, "bank_transfer"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::MobileMoney => write!(f, "mobile_money"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "card" => Ok(PaymentMethod::Card),
            "mobile_money" => Ok(PaymentMethod::MobileMoney),
            _ => Err(format!("Invalid payment method: {}", s)),
        }
    }
}

/// A recorded payment fact.
///
/// Always attributed to the calendar year that was active when it was
/// recorded; that attribution never changes. The resident reference is
/// exclusive: a live `resident_id` before the period closes, a
/// `historical_resident_id` afterwards, re-pointed by the archival
/// migrator so no payment ever dangles.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,

    /// Live resident reference; cleared when the resident is archived
    pub resident_id: Option<Uuid>,

    /// Historical snapshot reference; set by archival, exclusive with
    /// `resident_id`
    pub historical_resident_id: Option<Uuid>,

    pub room_id: Option<Uuid>,

    pub calendar_year_id: Uuid,

    pub amount: Decimal,

    /// When the money changed hands (not when the row was written)
    pub date: DateTime<Utc>,

    pub status: PaymentStatus,

    pub method: Option<PaymentMethod>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Record a payment against a live resident.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        resident_id: Uuid,
        room_id: Option<Uuid>,
        calendar_year_id: Uuid,
        amount: Decimal,
        date: DateTime<Utc>,
        status: PaymentStatus,
        method: Option<PaymentMethod>,
    ) -> Result<Self> {
        if amount < Decimal::ZERO {
            return Err(AppError::validation("Payment amount cannot be negative"));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            resident_id: Some(resident_id),
            historical_resident_id: None,
            room_id,
            calendar_year_id,
            amount,
            date,
            status,
            method,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == PaymentStatus::Confirmed
    }

    /// Move the resident reference from a live resident to its historical
    /// snapshot. Keeps the reference exclusive; fails if the payment is
    /// already archived.
    pub fn repoint_to_historical(
        &mut self,
        historical_resident_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.resident_id.is_none() {
            return Err(AppError::conflict(format!(
                "Payment '{}' is already attached to a historical resident",
                self.id
            )));
        }

        self.resident_id = None;
        self.historical_resident_id = Some(historical_resident_id);
        self.updated_at = now;
        Ok(())
    }
}
