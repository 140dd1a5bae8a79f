mod buffered;

use std::os::fd::RawFd;

use crate::{events::EventSource, OsError};

pub use buffered::BufferedReader;
pub use buffered::Receive;
pub use buffered::DEFAULT_CHUNK_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadResult {
    Closed, // The source is closed and will never produce data again
    Received(usize), // This many bytes were written to the buffer
    WouldBlock // Nothing to read now, but the source may produce data later
}

/// Anything an event loop can wait on and then read from without knowing what it is:
/// timers here, sockets elsewhere.
pub trait Pollable {

    /// The descriptor to wait on; negative once closed.
    fn raw_fd(&self) -> RawFd;

    /// One non-blocking read into `buf`. Interruptions are retried by the implementor.
    fn receive(&self, buf: &mut [u8]) -> Result<ReadResult, OsError>;

    /// Releases the underlying descriptor. Must be idempotent.
    fn close(&self);

    fn is_closed(&self) -> bool { self.raw_fd() < 0 }

    fn event_source(&self) -> EventSource { EventSource::from_raw(self.raw_fd()) }
}

impl<P: Pollable + ?Sized> Pollable for &P {
    fn raw_fd(&self) -> RawFd { (**self).raw_fd() }

    fn receive(&self, buf: &mut [u8]) -> Result<ReadResult, OsError> { (**self).receive(buf) }

    fn close(&self) { (**self).close() }

    fn is_closed(&self) -> bool { (**self).is_closed() }
}
