// Payments module: recorded payment facts and the pure aggregation over them

pub mod models;
pub mod services;

pub use models::{Payment, PaymentMethod, PaymentStatus};
pub use services::{MonthlyStats, PaymentAggregator, PaymentMethodBreakdown, ResidentDebt};
