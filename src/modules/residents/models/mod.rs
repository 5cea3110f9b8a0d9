pub mod resident;

pub use resident::{HistoricalResident, Resident, ResidentRecord};
