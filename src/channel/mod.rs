//! Seekable byte channel.
//!
//! - [`SeekableByteChannel`] - Window-buffered random access
//! - [`ReadBehavior`] / [`WriteBehavior`] - Injected transport strategies
//! - [`MemoryResource`] - In-memory resource implementing both behaviors

mod behavior;
mod io;
mod memory;
mod seekable;

pub use behavior::{ReadBehavior, WriteBehavior};
pub use memory::MemoryResource;
pub use seekable::SeekableByteChannel;
