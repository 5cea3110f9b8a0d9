// Residents module

pub mod models;
pub mod services;

pub use models::{HistoricalResident, Resident, ResidentRecord};
pub use services::ArchivalMigrator;
