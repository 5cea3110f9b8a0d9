pub mod calendar_year;

pub use calendar_year::CalendarYear;
