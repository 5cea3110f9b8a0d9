pub mod room;

pub use room::{Room, RoomGender, RoomType};
