use std::{
    fmt,
    os::fd::{AsRawFd, RawFd},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    atomic_owned_fd::AtomicOwnedFd,
    clock::{Clock, MonotonicClock},
    io::{Pollable, ReadResult},
    OsError,
};

use super::{deadline, TimerError, TimerSpec, Timespec};

/// Width in bytes of the expiration counter a timerfd read produces.
pub const COUNTER_WIDTH: usize = std::mem::size_of::<u64>();

/// A non-blocking, close-on-exec timerfd on `CLOCK_MONOTONIC`.
///
/// The descriptor becomes readable when the timer expires and stays readable until the
/// expiration counter is drained with [`Timer::clear`], [`Timer::read`] or
/// [`Timer::expirations`]. Closing is idempotent and also happens on drop.
///
/// `start` is the `clock` reading (in milliseconds) taken at creation and at every arm.
/// It only feeds [`Timer::elapsed`] and [`Timer::start_time`]; expirations are always
/// scheduled against the kernel's own monotonic clock.
pub struct Timer<C: Clock = MonotonicClock> {
    fd: AtomicOwnedFd,
    start: AtomicU64,
    clock: C,
}

impl Timer<MonotonicClock> {

    /// Creates a timer, arming it right away when `initial_delay` is positive.
    pub fn new(initial_delay: f64, interval: f64) -> Result<Self, TimerError> {
        Self::with_clock(MonotonicClock, initial_delay, interval)
    }
}

impl<C: Clock> Timer<C> {

    pub fn with_clock(clock: C, initial_delay: f64, interval: f64) -> Result<Self, TimerError> {
        let timer = Self {
            fd: Self::open()?,
            start: AtomicU64::new(0),
            clock,
        };

        // On failure the descriptor is released as `timer` drops.
        if initial_delay > 0.0 {
            timer.program(initial_delay, interval)?;
        }
        timer.reset_start();

        Ok(timer)
    }

    fn open() -> Result<AtomicOwnedFd, TimerError> {
        let fd = syscall!(timerfd_create(
            libc::CLOCK_MONOTONIC,
            libc::TFD_NONBLOCK | libc::TFD_CLOEXEC
        )).map_err(|e| TimerError::Create(e.into()))?;

        info!("opened timerfd {}", fd);

        Ok(unsafe { AtomicOwnedFd::new(fd) })
    }

    fn program(&self, delay: f64, interval: f64) -> Result<TimerSpec, TimerError> {
        let fd = self.fd.load();
        let spec = deadline::compute(MonotonicClock.now(), delay, interval);
        let new_value = spec.to_libc();

        syscall!(timerfd_settime(
            fd,
            libc::TFD_TIMER_ABSTIME,
            &new_value,
            std::ptr::null_mut()
        )).map_err(|e| TimerError::Arm(e.into()))?;

        if spec.is_disarmed() {
            info!("disarmed timerfd {}", fd);
        } else {
            info!(
                "armed timerfd {} for {} (interval {})",
                fd,
                spec.value,
                spec.interval
            );
        }

        Ok(spec)
    }

    fn reset_start(&self) {
        self.start.store(self.clock.now_ms(), Ordering::Release);
    }

    /// Re-arms the timer to fire `delay` seconds from now and then every `interval` seconds.
    ///
    /// An `interval` of zero makes the timer one-shot. With neither a positive delay nor a
    /// positive interval, the timer is disarmed. Every successful call moves the start time
    /// to now. Does nothing on a closed timer.
    pub fn arm(&self, delay: f64, interval: f64) -> Result<(), TimerError> {
        if !self.fd.is_valid() { return Ok(()); }
        self.program(delay, interval)?;
        self.reset_start();
        Ok(())
    }

    /// Stops the timer without closing it. Pending expirations stay readable.
    pub fn disarm(&self) -> Result<(), TimerError> {
        self.arm(0.0, 0.0)
    }

    /// Drains the expiration counter, reporting whether a full counter was consumed.
    ///
    /// Returns `false` when the timer is closed or nothing has expired since the last drain.
    pub fn clear(&self) -> bool {
        if !self.fd.is_valid() { return false; }

        let mut counter = [0u8; COUNTER_WIDTH];
        match read_counter(self.fd.load(), &mut counter) {
            Ok(Some(n)) => n == COUNTER_WIDTH,
            Ok(None) => false,
            Err(e) => {
                warn!("failed to drain timerfd {}: {}", self.fd.load(), e);
                false
            }
        }
    }

    /// Reads the raw expiration counter into `buf`.
    ///
    /// A buffer shorter than [`COUNTER_WIDTH`] receives only the leading bytes of the
    /// counter in native byte order; the whole counter is still consumed.
    pub fn read(&self, buf: &mut [u8]) -> Result<ReadResult, TimerError> {
        if !self.fd.is_valid() { return Ok(ReadResult::Closed); }
        let fd = self.fd.load();

        let received = (if buf.len() >= COUNTER_WIDTH {
            read_counter(fd, buf)
        } else {
            let mut scratch = [0u8; COUNTER_WIDTH];
            read_counter(fd, &mut scratch).map(|read| read.map(|n| {
                let n = n.min(buf.len());
                buf[..n].copy_from_slice(&scratch[..n]);
                n
            }))
        }).map_err(TimerError::Read)?;

        Ok(match received {
            Some(n) => ReadResult::Received(n),
            None => ReadResult::WouldBlock,
        })
    }

    /// Drains and returns the number of expirations since the last drain.
    ///
    /// `None` when nothing is pending or the timer is closed.
    pub fn expirations(&self) -> Result<Option<u64>, TimerError> {
        let mut counter = [0u8; COUNTER_WIDTH];
        match self.read(&mut counter)? {
            ReadResult::Received(COUNTER_WIDTH) => Ok(Some(u64::from_ne_bytes(counter))),
            _ => Ok(None),
        }
    }

    /// Time left until the next expiration and the current repeat interval, both relative.
    ///
    /// A disarmed timer reports [`TimerSpec::DISARMED`]. `None` once closed.
    pub fn remaining(&self) -> Result<Option<TimerSpec>, TimerError> {
        if !self.fd.is_valid() { return Ok(None); }

        let mut current = libc::itimerspec {
            it_interval: libc::timespec { tv_sec: 0, tv_nsec: 0 },
            it_value: libc::timespec { tv_sec: 0, tv_nsec: 0 },
        };
        syscall!(timerfd_gettime(self.fd.load(), &mut current))
            .map_err(|e| TimerError::Query(e.into()))?;

        Ok(Some(current.into()))
    }

    /// Seconds since the timer was created or last armed, at millisecond resolution.
    pub fn elapsed(&self) -> f64 {
        let start = self.start.load(Ordering::Acquire);
        Timespec::from_millis(self.clock.now_ms().saturating_sub(start)).as_secs_f64()
    }

    /// The start time in seconds on the timer's clock.
    pub fn start_time(&self) -> f64 {
        Timespec::from_millis(self.start.load(Ordering::Acquire)).as_secs_f64()
    }

    /// The descriptor to register with a poller; `-1` once closed.
    pub fn raw_fd(&self) -> RawFd { self.fd.load() }

    pub fn is_closed(&self) -> bool { !self.fd.is_valid() }

    /// Releases the descriptor. Safe to call any number of times.
    pub fn close(&self) {
        self.fd.close();
    }

    pub fn clock(&self) -> &C { &self.clock }
}

// One read of the counter, retried across signals. `None` when nothing has expired.
fn read_counter(fd: RawFd, buf: &mut [u8]) -> Result<Option<usize>, OsError> {
    match syscall_retry!(read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len())) {
        Ok(n) => Ok(Some(n as usize)),
        Err(e) => match OsError::from(e) {
            error if error.is_would_block() => Ok(None),
            error => Err(error),
        }
    }
}

impl<C: Clock> AsRawFd for Timer<C> {
    fn as_raw_fd(&self) -> RawFd {
        self.raw_fd()
    }
}

impl<C: Clock> Pollable for Timer<C> {
    fn raw_fd(&self) -> RawFd {
        Timer::raw_fd(self)
    }

    fn receive(&self, buf: &mut [u8]) -> Result<ReadResult, OsError> {
        self.read(buf).map_err(|e| e.os_error())
    }

    fn close(&self) {
        Timer::close(self)
    }

    fn is_closed(&self) -> bool {
        Timer::is_closed(self)
    }
}

impl<C: Clock> fmt::Display for Timer<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_closed() {
            write!(f, "timerfd{{closed}}")
        } else {
            write!(f, "timerfd{{client}}: {}", self.raw_fd())
        }
    }
}

impl<C: Clock> fmt::Debug for Timer<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Timer")
            .field("fd", &self.raw_fd())
            .field("start_ms", &self.start.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use super::*;
    use crate::clock::ManualClock;

    fn settle(ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }

    #[test]
    fn test_close_is_idempotent() {
        let timer = Timer::new(0.0, 0.0).unwrap();
        assert!(!timer.is_closed());
        assert!(timer.raw_fd() >= 0);
        for _ in 0..3 {
            timer.close();
            assert!(timer.is_closed());
            assert_eq!(timer.raw_fd(), -1);
        }
    }

    #[test]
    fn test_unarmed_timer_has_nothing_to_drain() {
        let timer = Timer::new(0.0, 0.0).unwrap();
        assert!(!timer.clear());

        let mut buf = [0u8; COUNTER_WIDTH];
        assert_eq!(timer.read(&mut buf).unwrap(), ReadResult::WouldBlock);
        assert_eq!(timer.expirations().unwrap(), None);
        assert_eq!(timer.remaining().unwrap(), Some(TimerSpec::DISARMED));
    }

    #[test]
    fn test_one_shot_fires_once() {
        let timer = Timer::new(0.02, 0.0).unwrap();
        assert!(!timer.clear());
        settle(80);
        assert!(timer.clear());
        assert!(!timer.clear());
        settle(60);
        assert!(!timer.clear());
    }

    #[test]
    fn test_periodic_timer_accumulates_expirations() {
        let timer = Timer::new(0.0, 0.0).unwrap();
        timer.arm(0.0, 0.02).unwrap();
        settle(100);
        let count = timer.expirations().unwrap().unwrap();
        assert!(count > 1, "expected several expirations, got {}", count);

        settle(60);
        assert!(timer.expirations().unwrap().unwrap() >= 1);
    }

    #[test]
    fn test_full_read_returns_counter_bytes() {
        let timer = Timer::new(0.001, 0.0).unwrap();
        settle(30);
        let mut buf = [0xffu8; 16];
        assert_eq!(timer.read(&mut buf).unwrap(), ReadResult::Received(COUNTER_WIDTH));
        let mut counter = [0u8; COUNTER_WIDTH];
        counter.copy_from_slice(&buf[..COUNTER_WIDTH]);
        assert_eq!(u64::from_ne_bytes(counter), 1);
        assert_eq!(&buf[COUNTER_WIDTH..], &[0xffu8; 8]);
    }

    #[test]
    fn test_short_read_copies_leading_counter_bytes() {
        let timer = Timer::new(0.001, 0.0).unwrap();
        settle(30);
        let mut buf = [0xaau8; 3];
        assert_eq!(timer.read(&mut buf).unwrap(), ReadResult::Received(3));
        assert_eq!(buf, 1u64.to_ne_bytes()[..3]);
        // The short read consumed the whole counter.
        assert!(!timer.clear());
    }

    #[test]
    fn test_closed_timer_operations_are_inert() {
        let timer = Timer::new(5.0, 1.0).unwrap();
        let start = timer.start_time();
        timer.close();

        let mut buf = [0u8; COUNTER_WIDTH];
        assert_eq!(timer.read(&mut buf).unwrap(), ReadResult::Closed);
        assert!(!timer.clear());
        assert_eq!(timer.expirations().unwrap(), None);
        assert_eq!(timer.remaining().unwrap(), None);
        timer.arm(0.01, 0.0).unwrap();
        assert_eq!(timer.start_time(), start);
    }

    #[test]
    fn test_remaining_reports_relative_spec() {
        let timer = Timer::new(10.0, 2.5).unwrap();
        let spec = timer.remaining().unwrap().unwrap();
        assert!(spec.value.sec >= 9 && spec.value.sec <= 10);
        assert_eq!(spec.interval, deadline::Timespec::new(2, 500_000_000));

        timer.disarm().unwrap();
        assert_eq!(timer.remaining().unwrap(), Some(TimerSpec::DISARMED));
    }

    #[test]
    fn test_elapsed_tracks_injected_clock() {
        let clock = Arc::new(ManualClock::new(1_000));
        let timer = Timer::with_clock(Arc::clone(&clock), 0.0, 0.0).unwrap();
        assert_eq!(timer.start_time(), 1.0);
        assert_eq!(timer.elapsed(), 0.0);

        clock.advance_ms(1_500);
        assert_eq!(timer.elapsed(), 1.5);
    }

    #[test]
    fn test_elapsed_is_monotonic_without_arm() {
        let clock = Arc::new(ManualClock::new(0));
        let timer = Timer::with_clock(Arc::clone(&clock), 0.0, 0.0).unwrap();
        let mut last = timer.elapsed();
        for step in [0, 3, 17, 0, 250] {
            clock.advance_ms(step);
            let now = timer.elapsed();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn test_arm_resets_start_but_drain_does_not() {
        let clock = Arc::new(ManualClock::new(2_000));
        let timer = Timer::with_clock(Arc::clone(&clock), 0.0, 0.0).unwrap();

        clock.advance_ms(700);
        timer.arm(0.001, 0.0).unwrap();
        assert_eq!(timer.start_time(), 2.7);
        assert_eq!(timer.elapsed(), 0.0);

        settle(20);
        clock.advance_ms(300);
        assert!(timer.clear());
        let mut buf = [0u8; COUNTER_WIDTH];
        let _ = timer.read(&mut buf).unwrap();
        assert_eq!(timer.start_time(), 2.7);
        assert_eq!(timer.elapsed(), 0.3);
    }

    #[test]
    fn test_rearm_cancels_pending_deadline() {
        let timer = Timer::new(0.03, 0.0).unwrap();
        timer.arm(0.0, 0.0).unwrap();
        settle(60);
        assert!(!timer.clear());
    }

    #[test]
    fn test_pollable_receive_matches_read() {
        let timer = Timer::new(0.0, 0.0).unwrap();
        let source: &dyn Pollable = &timer;
        let mut buf = [0u8; COUNTER_WIDTH];
        assert_eq!(source.receive(&mut buf).unwrap(), ReadResult::WouldBlock);
        source.close();
        assert!(source.is_closed());
        assert_eq!(source.receive(&mut buf).unwrap(), ReadResult::Closed);
    }

    #[test]
    fn test_display() {
        let timer = Timer::new(0.0, 0.0).unwrap();
        assert_eq!(timer.to_string(), format!("timerfd{{client}}: {}", timer.raw_fd()));
        timer.close();
        assert_eq!(timer.to_string(), "timerfd{closed}");
    }
}
