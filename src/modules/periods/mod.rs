// Periods module: the calendar-year lifecycle (open, rename, close, delete)

pub mod controllers;
pub mod models;
pub mod services;

pub use models::CalendarYear;
pub use services::PeriodService;
