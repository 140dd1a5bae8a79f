use std::{
    fmt,
    sync::{
        atomic::{
            AtomicU64,
            Ordering
        },
        Arc
    }
};

/// Tags a registration; comes back with every event for that source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(u64);

impl Key {
    pub fn new(val: u64) -> Self {
        Self(val)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub (crate) struct KeyGenerator {
    inner: Arc<AtomicU64>
}

impl KeyGenerator {
    pub fn new(first: u64) -> Self {
        Self {
            inner: Arc::new(AtomicU64::new(first)),
        }
    }

    pub fn next(&self) -> Key {
        Key::new(self.inner.fetch_add(1, Ordering::Relaxed))
    }
}
