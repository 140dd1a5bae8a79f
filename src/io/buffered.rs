use bytes::{Bytes, BytesMut};

use crate::OsError;

use super::{Pollable, ReadResult};

pub const DEFAULT_CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receive {
    Complete(Bytes), // Exactly what was asked for
    Pending, // Not enough data yet; what arrived so far stays buffered
    Closed(Bytes), // The source closed; whatever was left over
}

/// Buffers reads from any [`Pollable`] so callers can ask for byte counts
/// instead of dealing with however much one read happens to return.
#[derive(Debug)]
pub struct BufferedReader<S: Pollable> {
    source: S,
    buffer: BytesMut,
    chunk_size: usize,
}

impl<S: Pollable> BufferedReader<S> {

    pub fn new(source: S) -> Self {
        Self::with_chunk_size(source, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(source: S, chunk_size: usize) -> Self {
        Self {
            source,
            buffer: BytesMut::new(),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn source(&self) -> &S { &self.source }

    pub fn into_inner(self) -> S { self.source }

    pub fn buffered(&self) -> usize { self.buffer.len() }

    /// Returns exactly `count` bytes once that many have arrived.
    pub fn receive(&mut self, count: usize) -> Result<Receive, OsError> {
        while self.buffer.len() < count {
            match self.fill()? {
                ReadResult::Received(_) => continue,
                ReadResult::WouldBlock => return Ok(Receive::Pending),
                ReadResult::Closed => {
                    return Ok(Receive::Closed(self.buffer.split().freeze()))
                }
            }
        }
        Ok(Receive::Complete(self.buffer.split_to(count).freeze()))
    }

    /// Returns everything buffered plus whatever one more read produces.
    pub fn receive_available(&mut self) -> Result<Receive, OsError> {
        let status = self.fill()?;
        if !self.buffer.is_empty() {
            return Ok(Receive::Complete(self.buffer.split().freeze()));
        }
        Ok(match status {
            ReadResult::Closed => Receive::Closed(Bytes::new()),
            _ => Receive::Pending,
        })
    }

    fn fill(&mut self) -> Result<ReadResult, OsError> {
        let filled = self.buffer.len();
        self.buffer.resize(filled + self.chunk_size, 0);

        let result = self.source.receive(&mut self.buffer[filled..]);
        let received = match result {
            Ok(ReadResult::Received(n)) => n,
            _ => 0,
        };
        self.buffer.truncate(filled + received);

        // A zero-byte read is end of stream.
        match result? {
            ReadResult::Received(0) => Ok(ReadResult::Closed),
            status => Ok(status),
        }
    }
}
