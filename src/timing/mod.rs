mod timer;
mod builder;

pub mod deadline;

use thiserror::Error;

use crate::OsError;

pub use timer::Timer;
pub use timer::COUNTER_WIDTH;
pub use builder::TimerBuilder;
pub use builder::IntervalPolicy;
pub use deadline::Timespec;
pub use deadline::TimerSpec;


#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    #[error("Failed to create timerfd: {0}")]
    Create(OsError),

    #[error("Failed to arm timerfd: {0}")]
    Arm(OsError),

    #[error("Failed to read timerfd: {0}")]
    Read(OsError),

    #[error("Failed to query timerfd: {0}")]
    Query(OsError),
}

impl TimerError {
    pub fn os_error(&self) -> OsError {
        match self {
            TimerError::Create(e)
            | TimerError::Arm(e)
            | TimerError::Read(e)
            | TimerError::Query(e) => *e,
        }
    }

    pub fn code(&self) -> i32 { self.os_error().code() }
}
