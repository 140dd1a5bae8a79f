use std::fmt;
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventType: i32 {
        const READABLE = libc::EPOLLIN;
        const WRITABLE = libc::EPOLLOUT;
        const ERROR = libc::EPOLLERR;
        const HUP = libc::EPOLLHUP;
        const RDHUP = libc::EPOLLRDHUP;
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        write!(f, "EventType {{ {} }}", flags.join(" | "))
    }
}
