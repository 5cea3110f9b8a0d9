pub mod hostel;

pub use hostel::Hostel;
