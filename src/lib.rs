//! Hostelcore: billing-period lifecycle and financial ledger
//!
//! This library provides the calendar-year (billing period) lifecycle and the
//! payment aggregation core of a hostel operations dashboard.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;
pub mod store;

// Re-export commonly used types
pub use modules::payments;
pub use modules::periods;
pub use modules::reports;
pub use modules::residents;
