use std::sync::Arc;

use parking_lot::Mutex;

use crate::timing::Timespec;

/// A source of monotonic time. Timers sample it for their start and elapsed times.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timespec;

    fn now_ms(&self) -> u64 {
        self.now().as_millis()
    }
}

/// `CLOCK_MONOTONIC`, the clock every timer descriptor in this crate is created on.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Timespec {
        let mut now = libc::timespec { tv_sec: 0, tv_nsec: 0 };
        if let Err(e) = syscall!(clock_gettime(libc::CLOCK_MONOTONIC, &mut now)) {
            error!("failed to read the monotonic clock: {}", e);
            return Timespec::ZERO;
        }
        now.into()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Timespec>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self { now: Mutex::new(Timespec::from_millis(start_ms)) }
    }

    pub fn set(&self, now: Timespec) {
        *self.now.lock() = now;
    }

    pub fn advance_ms(&self, ms: u64) {
        let mut now = self.now.lock();
        *now = now.saturating_add_millis(ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timespec {
        *self.now.lock()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timespec {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timespec {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_never_goes_back() {
        let clock = MonotonicClock;
        let mut last = clock.now();
        for _ in 0..1_000 {
            let now = clock.now();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn test_manual_clock_moves_on_demand() {
        let clock = ManualClock::new(1_500);
        assert_eq!(clock.now_ms(), 1_500);
        clock.advance_ms(250);
        assert_eq!(clock.now_ms(), 1_750);
        assert_eq!(clock.now(), Timespec::new(1, 750_000_000));
        clock.set(Timespec::new(10, 0));
        assert_eq!(clock.now_ms(), 10_000);
    }

    #[test]
    fn test_shared_clock_sees_updates() {
        let clock = Arc::new(ManualClock::new(0));
        let shared = Arc::clone(&clock);
        clock.advance_ms(42);
        assert_eq!(shared.now_ms(), 42);
    }
}
