use std::{fmt, time::Duration};

pub const NANOS_PER_SEC: i64 = 1_000_000_000;
pub const NANOS_PER_MILLI: i64 = 1_000_000;
pub const MILLIS_PER_SEC: u64 = 1_000;

/// A point on (or span of) a kernel clock, split the way `struct timespec` splits it.
///
/// Values produced by this module always keep `nsec` in `[0, NANOS_PER_SEC)`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timespec {
    pub sec: i64,
    pub nsec: i64,
}

impl Timespec {

    pub const ZERO: Timespec = Timespec { sec: 0, nsec: 0 };

    pub fn new(sec: i64, nsec: i64) -> Self {
        Self { sec, nsec }.normalize()
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::ZERO.saturating_add_millis(ms)
    }

    pub fn is_zero(&self) -> bool { self.sec == 0 && self.nsec == 0 }

    /// Whole milliseconds, truncating sub-millisecond nanoseconds.
    /// Negative instants clamp to zero.
    pub fn as_millis(&self) -> u64 {
        if self.sec < 0 { return 0; }
        (self.sec as u64)
            .saturating_mul(MILLIS_PER_SEC)
            .saturating_add((self.nsec.max(0) / NANOS_PER_MILLI) as u64)
    }

    /// Seconds as a float, rounded once from the exact nanosecond total.
    pub fn as_secs_f64(&self) -> f64 {
        let nanos = self.sec as i128 * NANOS_PER_SEC as i128 + self.nsec as i128;
        nanos as f64 / NANOS_PER_SEC as f64
    }

    /// Adds a whole number of milliseconds, carrying overflowing nanoseconds into seconds.
    pub fn saturating_add_millis(self, ms: u64) -> Self {
        let whole_secs = (ms / MILLIS_PER_SEC) as i64;
        let rem_nanos = (ms % MILLIS_PER_SEC) as i64 * NANOS_PER_MILLI;
        Self {
            sec: self.sec.saturating_add(whole_secs),
            nsec: self.nsec + rem_nanos,
        }.normalize()
    }

    // Folds any amount of excess or negative nanoseconds into seconds in one step.
    fn normalize(self) -> Self {
        Self {
            sec: self.sec.saturating_add(self.nsec.div_euclid(NANOS_PER_SEC)),
            nsec: self.nsec.rem_euclid(NANOS_PER_SEC),
        }
    }

    pub fn to_libc(self) -> libc::timespec {
        libc::timespec {
            tv_sec: self.sec as libc::time_t,
            tv_nsec: self.nsec as libc::c_long,
        }
    }
}

impl From<libc::timespec> for Timespec {
    fn from(ts: libc::timespec) -> Self {
        Self::new(ts.tv_sec as i64, ts.tv_nsec as i64)
    }
}

impl From<Timespec> for Duration {
    fn from(ts: Timespec) -> Self {
        if ts.sec < 0 { return Duration::ZERO; }
        Duration::new(ts.sec as u64, ts.nsec as u32)
    }
}

impl fmt::Display for Timespec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nsec)
    }
}

/// First expiration plus repeat period, as handed to `timerfd_settime`.
///
/// A zero `value` disarms the timer. A zero `interval` makes it one-shot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimerSpec {
    pub value: Timespec,
    pub interval: Timespec,
}

impl TimerSpec {

    pub const DISARMED: TimerSpec = TimerSpec {
        value: Timespec::ZERO,
        interval: Timespec::ZERO,
    };

    pub fn is_disarmed(&self) -> bool { self.value.is_zero() }

    pub fn is_periodic(&self) -> bool { !self.interval.is_zero() }

    pub fn to_libc(self) -> libc::itimerspec {
        libc::itimerspec {
            it_interval: self.interval.to_libc(),
            it_value: self.value.to_libc(),
        }
    }
}

impl From<libc::itimerspec> for TimerSpec {
    fn from(spec: libc::itimerspec) -> Self {
        Self {
            value: spec.it_value.into(),
            interval: spec.it_interval.into(),
        }
    }
}

/// `floor(seconds * 1000)`. NaN and non-positive inputs give zero, huge ones saturate.
pub fn seconds_to_millis(seconds: f64) -> u64 {
    if !(seconds > 0.0) { return 0; }
    (seconds * MILLIS_PER_SEC as f64).floor() as u64
}

/// The absolute instant `delay_seconds` after `now`, at millisecond granularity.
pub fn deadline(now: Timespec, delay_seconds: f64) -> Timespec {
    now.saturating_add_millis(seconds_to_millis(delay_seconds))
}

/// The repeat period for `interval_seconds`; zero when one-shot.
pub fn interval(interval_seconds: f64) -> Timespec {
    Timespec::from_millis(seconds_to_millis(interval_seconds))
}

/// Builds the absolute-time spec for arming a timer at `now + delay`, repeating every `interval`.
///
/// With no positive delay and no positive interval there is nothing to fire, and the
/// result disarms the timer. A non-positive delay with a positive interval fires at once.
pub fn compute(now: Timespec, delay_seconds: f64, interval_seconds: f64) -> TimerSpec {
    let interval = interval(interval_seconds);
    if !(delay_seconds > 0.0) && interval.is_zero() {
        return TimerSpec::DISARMED;
    }

    let mut value = deadline(now, delay_seconds);
    // An all-zero value would read as "disarm".
    if value.is_zero() {
        value.nsec = 1;
    }

    TimerSpec { value, interval }
}
