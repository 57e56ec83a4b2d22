//! Async streaming support for block staging.
//!
//! This module stages blocks from asynchronous inputs, either a
//! `futures_core::Stream` of buffers or a `futures_io::AsyncRead`, making it
//! runtime-agnostic and compatible with tokio, async-std, smol, and other
//! async runtimes.
//!
//! - [`stage_stream`] - Stages blocks from a stream of buffers
//! - [`stage_async`] - Stages blocks from an async reader
//!
//! This module requires the `async-io` feature to be enabled.

mod stream;

pub use stream::{ReaderStream, StageStream, stage_async, stage_stream};
