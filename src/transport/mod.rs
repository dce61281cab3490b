//! Transport module - moving bytes between the host and the controller.
//!
//! Provides:
//! - [`ByteChannel`], a byte-at-a-time link polled once per tick
//! - [`MemoryChannel`], an in-memory link for tests and simulation
//! - [`serve`], an async loop over any tokio reader/writer pair

mod channel;
mod stream;

pub use channel::{ByteChannel, MemoryChannel};
pub use stream::{serve, DEFAULT_READ_BUFFER};
