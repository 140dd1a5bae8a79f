use thiserror::Error;

#[macro_use]
pub (crate) mod sys;

#[macro_use]
pub (crate) mod logging;

mod os_error;
mod atomic_owned_fd;

pub mod clock;
pub mod events;
pub mod io;
pub mod timing;

pub use os_error::OsError;
pub use atomic_owned_fd::AtomicOwnedFd;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use io::{BufferedReader, Pollable, ReadResult, Receive};
pub use timing::{Timer, TimerBuilder, TimerError};


#[derive(Debug, Error)]
pub enum Error {
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    #[error("Event poller error: {0}")]
    EventPoller(#[from] events::EventPollerError),

    #[error("Event registry error: {0}")]
    EventRegistry(#[from] events::EventPollerRegistryError),

    #[error("OS error: {0}")]
    Os(#[from] OsError),
}

pub type Result<T> = std::result::Result<T, Error>;

// Creates a timer on the monotonic clock and returns it with its start time in seconds.
// A positive `initial_delay` arms it at once; `interval` of 0 means one-shot.
pub fn create(
    initial_delay: f64,
    interval: f64
) -> std::result::Result<(Timer, f64), TimerError> {
    let timer = Timer::new(initial_delay, interval)?;
    let start = timer.start_time();
    Ok((timer, start))
}
