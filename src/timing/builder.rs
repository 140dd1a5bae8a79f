use crate::clock::{Clock, MonotonicClock};

use super::{Timer, TimerError};

/// What an unset interval means when a timer is built.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum IntervalPolicy {
    /// Fire once.
    #[default]
    OneShot,
    /// Keep firing at the initial delay.
    RepeatDelay,
}

#[derive(Debug, Clone)]
pub struct TimerBuilder<C: Clock = MonotonicClock> {
    delay: f64,
    interval: Option<f64>,
    policy: IntervalPolicy,
    clock: C,
}

impl TimerBuilder<MonotonicClock> {
    pub fn new() -> Self {
        Self {
            delay: 0.0,
            interval: None,
            policy: IntervalPolicy::OneShot,
            clock: MonotonicClock,
        }
    }
}

impl Default for TimerBuilder<MonotonicClock> {
    fn default() -> Self { Self::new() }
}

impl<C: Clock> TimerBuilder<C> {

    pub fn delay(mut self, seconds: f64) -> Self {
        self.delay = seconds;
        self
    }

    pub fn interval(mut self, seconds: f64) -> Self {
        self.interval = Some(seconds);
        self
    }

    pub fn policy(mut self, policy: IntervalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn repeat_delay_when_unset(self) -> Self {
        self.policy(IntervalPolicy::RepeatDelay)
    }

    pub fn clock<D: Clock>(self, clock: D) -> TimerBuilder<D> {
        TimerBuilder {
            delay: self.delay,
            interval: self.interval,
            policy: self.policy,
            clock,
        }
    }

    /// The interval `build` will arm with.
    pub fn resolved_interval(&self) -> f64 {
        match (self.interval, self.policy) {
            (Some(interval), _) => interval,
            (None, IntervalPolicy::OneShot) => 0.0,
            (None, IntervalPolicy::RepeatDelay) => self.delay,
        }
    }

    pub fn build(self) -> Result<Timer<C>, TimerError> {
        let interval = self.resolved_interval();
        Timer::with_clock(self.clock, self.delay, interval)
    }
}
