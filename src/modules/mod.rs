pub mod health;
pub mod hostels;
pub mod payments;
pub mod periods;
pub mod reports;
pub mod residents;
pub mod rooms;
