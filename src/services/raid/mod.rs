pub mod gateway;
pub mod mover;

pub use gateway::{SerenityGateway, VoiceGateway};
pub use mover::{move_raid, MoveOptions, MoveOutcome, MoveReport};
