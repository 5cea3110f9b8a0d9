// Hostels module

pub mod models;

pub use models::Hostel;
