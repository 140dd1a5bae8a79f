pub mod registry;
pub mod interest_type;

use std::os::fd::{
    AsRawFd,
    FromRawFd,
    OwnedFd,
    RawFd
};

use std::{fmt, sync::Arc};
use thiserror::Error;

use crate::{io::Pollable, OsError};

pub use self::interest_type::InterestType;
pub use self::registry::EventPollerRegistry;
pub use self::registry::EventPollerRegistryError;

use super::{Event, EventSource, Key};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EventPollerError {
    #[error("Failed to create epoll file descriptor: {source}")]
    FailedToCreateEpollFd {
        source: OsError,
    },

    #[error("Failed to poll events: {source}")]
    FailedToPollEvents {
        source: OsError,
    },
}

/// A level-triggered epoll instance that timers, sockets and any other
/// descriptor can share.
pub struct EventPoller {
    inner: Arc<OwnedFd>,
    event_registry: EventPollerRegistry,
    buffer: Vec<libc::epoll_event>,
}

impl EventPoller {

    pub fn new(buffer_size: usize) -> Result<Self, EventPollerError> {
        let inner = Arc::new(unsafe {
            OwnedFd::from_raw_fd(Self::epoll_create()?)
        });
        let event_registry = EventPollerRegistry::new(Arc::clone(&inner));
        Ok(Self {
            inner,
            event_registry,
            buffer: Vec::with_capacity(buffer_size.max(1)),
        })
    }

    pub fn registry(&self) -> EventPollerRegistry {
        self.event_registry.clone()
    }

    pub fn register<T>(
        &self,
        source: &T,
        interest_type: InterestType
    ) -> Result<Key, registry::EventPollerRegistryError> where T: AsRawFd + ?Sized {
        self.event_registry.register_interest(EventSource::new(source), interest_type)
    }

    pub fn register_source<P>(
        &self,
        source: &P,
        interest_type: InterestType
    ) -> Result<Key, registry::EventPollerRegistryError> where P: Pollable + ?Sized {
        self.event_registry.register_interest(source.event_source(), interest_type)
    }

    pub fn modify(
        &self,
        key: Key,
        interest_type: InterestType
    ) -> Result<(), registry::EventPollerRegistryError> {
        self.event_registry.modify_interest(key, interest_type)
    }

    pub fn deregister(&self, key: Key) -> Result<(), registry::EventPollerRegistryError> {
        self.event_registry.deregister_interest(key)
    }

    /// Waits up to `timeout_ms` (forever with `None`) and replaces `events_out` with
    /// whatever became ready. A wait cut short by a signal yields no events.
    pub fn poll_events(&mut self, events_out: &mut Vec<Event>, timeout_ms: Option<i32>) -> Result<(), EventPollerError> {
        let timeout: i32 = timeout_ms.unwrap_or(-1);

        events_out.clear();
        self.buffer.clear();

        let n = match syscall!(
            epoll_wait(
                self.inner.as_raw_fd(),
                self.buffer.as_mut_ptr(),
                self.buffer.capacity() as i32,
                timeout
            )
        ) {
            Ok(n) => n,
            Err(e) if e.raw_os_error() == Some(libc::EINTR) => 0,
            Err(e) => return Err(EventPollerError::FailedToPollEvents { source: e.into() }),
        };

        info!(
            "polled {} events in fd {} with timeout {}",
            n,
            self.inner.as_raw_fd(),
            timeout
        );

        /*
            Safe because the OS guarantees that 0..n are filled with valid data
            and n is never larger than the capacity passed in
        */
        unsafe { self.buffer.set_len(n as usize); }

        events_out.extend(self.buffer.iter().map(Event::from_libc_epoll_event));
        Ok(())
    }

    fn epoll_create() -> Result<RawFd, EventPollerError> {
        syscall!(
            epoll_create1(libc::EPOLL_CLOEXEC)
        ).map_err(|e| EventPollerError::FailedToCreateEpollFd { source: e.into() })
    }
}

impl fmt::Debug for EventPoller {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventPoller")
            .field("fd", &self.inner.as_raw_fd())
            .field("registered", &self.event_registry.len())
            .field("capacity", &self.buffer.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::Timer;

    #[test]
    fn test_timer_becomes_readable() {
        let mut poller = EventPoller::new(8).unwrap();
        let timer = Timer::new(0.01, 0.0).unwrap();
        let key = poller.register(&timer, InterestType::READ).unwrap();

        let mut events = Vec::new();
        poller.poll_events(&mut events, Some(1_000)).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key, key);
        assert!(events[0].is_readable());

        assert!(timer.clear());
        poller.poll_events(&mut events, Some(0)).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_unarmed_timer_never_ready() {
        let mut poller = EventPoller::new(4).unwrap();
        let timer = Timer::new(0.0, 0.0).unwrap();
        poller.register(&timer, InterestType::READ).unwrap();

        let mut events = Vec::new();
        poller.poll_events(&mut events, Some(30)).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_closed_source_is_rejected() {
        let poller = EventPoller::new(4).unwrap();
        let timer = Timer::new(0.0, 0.0).unwrap();
        timer.close();
        assert_eq!(
            poller.register(&timer, InterestType::READ),
            Err(EventPollerRegistryError::FailedToRegisterInterest { source: OsError::InvalidFd })
        );
    }

    #[test]
    fn test_deregister_stops_events() {
        let mut poller = EventPoller::new(4).unwrap();
        let timer = Timer::new(0.001, 0.0).unwrap();
        let key = poller.register(&timer, InterestType::READ).unwrap();
        assert_eq!(poller.registry().len(), 1);

        poller.deregister(key).unwrap();
        assert!(poller.registry().is_empty());
        assert!(poller.deregister(key).is_err());

        let mut events = Vec::new();
        poller.poll_events(&mut events, Some(30)).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_oneshot_interest_fires_once_until_rearmed() {
        let mut poller = EventPoller::new(4).unwrap();
        let timer = Timer::new(0.001, 0.005).unwrap();
        let key = poller.register_source(&timer, InterestType::READ | InterestType::ONESHOT).unwrap();

        let mut events = Vec::new();
        poller.poll_events(&mut events, Some(1_000)).unwrap();
        assert_eq!(events.len(), 1);

        poller.poll_events(&mut events, Some(30)).unwrap();
        assert!(events.is_empty());

        poller.modify(key, InterestType::READ).unwrap();
        poller.poll_events(&mut events, Some(1_000)).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key, key);
    }
}
