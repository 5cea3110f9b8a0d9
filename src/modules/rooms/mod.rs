// Rooms module (read-only collaborator for reports and archival)

pub mod models;

pub use models::{Room, RoomGender, RoomType};
