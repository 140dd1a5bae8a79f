mod r#type;
mod key;
mod source;

pub (crate) mod poller;

pub use r#type::EventType;
pub use key::Key;
pub use poller::EventPoller;
pub use poller::EventPollerError;
pub use poller::EventPollerRegistry;
pub use poller::EventPollerRegistryError;
pub use poller::InterestType;
pub use source::EventSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub event_type: EventType,
    pub key: Key,
}

impl Event {

    pub (in crate::events) fn from_libc_epoll_event(event: &libc::epoll_event) -> Self {
        let events = event.events;
        let data = event.u64;
        Self {
            event_type: EventType::from_bits_truncate(events as i32),
            key: Key::new(data),
        }
    }

    pub fn is_error(&self) -> bool {
        self.event_type.contains(EventType::ERROR)
    }

    pub fn is_readable(&self) -> bool {
        self.event_type.contains(EventType::READABLE)
    }

    pub fn is_writable(&self) -> bool {
        self.event_type.contains(EventType::WRITABLE)
    }

    pub fn is_hup(&self) -> bool {
        self.event_type.contains(EventType::HUP)
    }

    pub fn is_rdhup(&self) -> bool {
        self.event_type.contains(EventType::RDHUP)
    }
}
