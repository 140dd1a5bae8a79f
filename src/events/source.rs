use std::{
    fmt,
    os::fd::{
        AsRawFd,
        RawFd
    }
};

/// A borrowed-by-number descriptor handed to the poller. Does not own the fd.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct EventSource(RawFd);

impl EventSource {
    pub fn new<T>(source: &T) -> Self where T: AsRawFd + ?Sized {
        Self(source.as_raw_fd())
    }

    pub fn from_raw(fd: RawFd) -> Self { Self(fd) }

    pub fn is_valid(&self) -> bool { self.0 >= 0 }
}

impl AsRawFd for EventSource {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "fd {}", self.0)
    }
}
