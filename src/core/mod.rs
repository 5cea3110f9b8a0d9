pub mod error;
pub mod state;

pub use error::{AppError, Result};
pub use state::RecordState;
