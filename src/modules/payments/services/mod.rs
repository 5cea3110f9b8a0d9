pub mod payment_aggregator;

pub use payment_aggregator::{
    MonthlyStats, PaymentAggregator, PaymentMethodBreakdown, ResidentDebt,
};
