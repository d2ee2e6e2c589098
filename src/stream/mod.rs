pub mod channel;
pub mod mover;

pub use channel::{channel, ChannelReader, ChannelWriter};
pub use mover::{move_to_channel, move_to_memory};
