//! Async stream adapters for block staging.
//!
//! Runtime-agnostic: the input is any `futures_core::Stream` of `Bytes` or
//! any `futures_io::AsyncRead`, so tokio, async-std and smol all work.
//!
//! # Example
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use blockstage::{stage_async, StagingConfig};
//! use futures_io::AsyncRead;
//!
//! async fn demo<R: AsyncRead + Unpin>(reader: R) -> Result<(), blockstage::StagingError> {
//!     let mut blocks = stage_async(reader, StagingConfig::default())?;
//!
//!     while let Some(block) = blocks.next().await {
//!         let block = block?;
//!         println!("block {}: {} bytes", block.index(), block.len());
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures_core::Stream;
use futures_io::AsyncRead;
use pin_project_lite::pin_project;
use tracing::trace;

use crate::config::StagingConfig;
use crate::error::StagingError;
use crate::staging::{BufferAggregator, BufferStagingArea};

/// Read size used when pulling from an `AsyncRead`.
const READ_BUFFER_SIZE: usize = 64 * 1024;

pin_project! {
    /// A stream of sealed upload blocks staged from a stream of buffers.
    ///
    /// Holds at most `max_in_flight` sealed blocks. Upstream is not polled
    /// again until every queued block and any unconsumed input has been
    /// handed out, so a slow consumer slows the producer down.
    ///
    /// The final flushed block is yielded when it is non-empty, or when the
    /// input was empty altogether so that an empty upload still has one
    /// block.
    pub struct StageStream<S> {
        #[pin]
        upstream: S,
        staging: BufferStagingArea,
        ready: VecDeque<BufferAggregator>,
        leftover: Bytes,
        emitted_any: bool,
        upstream_done: bool,
        finished: bool,
    }
}

impl<S> StageStream<S> {
    /// Wraps `upstream` with a fresh staging area.
    pub fn new(upstream: S, config: StagingConfig) -> Result<Self, StagingError> {
        Ok(Self {
            upstream,
            staging: BufferStagingArea::new(config)?,
            ready: VecDeque::with_capacity(config.max_in_flight()),
            leftover: Bytes::new(),
            emitted_any: false,
            upstream_done: false,
            finished: false,
        })
    }

    /// Returns the number of sealed blocks waiting to be yielded.
    pub fn queued_blocks(&self) -> usize {
        self.ready.len()
    }

    /// Returns the CRC64 of everything sealed so far.
    pub fn stream_crc64(&self) -> Option<u64> {
        self.staging.stream_crc64()
    }
}

impl<S, E> Stream for StageStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<StagingError>,
{
    type Item = Result<BufferAggregator, StagingError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(block) = this.ready.pop_front() {
                *this.emitted_any = true;
                return Poll::Ready(Some(Ok(block)));
            }

            if *this.finished {
                return Poll::Ready(None);
            }

            if !this.leftover.is_empty() {
                let data = std::mem::take(this.leftover);
                match this.staging.write_bounded(data) {
                    Ok((blocks, rest)) => {
                        this.ready.extend(blocks);
                        *this.leftover = rest;
                    }
                    Err(e) => {
                        *this.finished = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                }
                continue;
            }

            if *this.upstream_done {
                *this.finished = true;
                match this.staging.flush() {
                    Ok(last) => {
                        if !last.is_empty() || !*this.emitted_any {
                            this.ready.push_back(last);
                        }
                    }
                    Err(e) => return Poll::Ready(Some(Err(e))),
                }
                continue;
            }

            match ready!(this.upstream.as_mut().poll_next(cx)) {
                Some(Ok(data)) => *this.leftover = data,
                Some(Err(e)) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(e.into())));
                }
                None => {
                    trace!("upstream exhausted");
                    *this.upstream_done = true;
                }
            }
        }
    }
}

pin_project! {
    /// Adapts an `AsyncRead` into a stream of `Bytes`.
    pub struct ReaderStream<R> {
        #[pin]
        reader: R,
        buffer: Vec<u8>,
        done: bool,
    }
}

impl<R> ReaderStream<R> {
    /// Wraps `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: vec![0u8; READ_BUFFER_SIZE],
            done: false,
        }
    }
}

impl<R: AsyncRead> Stream for ReaderStream<R> {
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }

        match ready!(this.reader.poll_read(cx, &mut this.buffer[..])) {
            Ok(0) => {
                *this.done = true;
                Poll::Ready(None)
            }
            Ok(n) => Poll::Ready(Some(Ok(Bytes::copy_from_slice(&this.buffer[..n])))),
            Err(e) => {
                *this.done = true;
                Poll::Ready(Some(Err(e)))
            }
        }
    }
}

/// Stages a stream of buffers into upload blocks.
///
/// # Arguments
///
/// * `stream` - Any `Stream<Item = Result<Bytes, E>>` with `E: Into<StagingError>`
/// * `config` - The staging configuration
pub fn stage_stream<S>(stream: S, config: StagingConfig) -> Result<StageStream<S>, StagingError> {
    StageStream::new(stream, config)
}

/// Stages the bytes of an async reader into upload blocks.
///
/// For tokio users, `tokio_util::compat` converts a `tokio::io::AsyncRead`:
///
/// ```ignore
/// use tokio_util::compat::TokioAsyncReadCompatExt;
/// use blockstage::{stage_async, StagingConfig};
///
/// let file = tokio::fs::File::open("file").await?;
/// let blocks = stage_async(file.compat(), StagingConfig::default())?;
/// ```
pub fn stage_async<R: AsyncRead>(
    reader: R,
    config: StagingConfig,
) -> Result<StageStream<ReaderStream<R>>, StagingError> {
    StageStream::new(ReaderStream::new(reader), config)
}
