//! Per-question countdown.
//!
//! The countdown owns its ticker. Starting a new countdown replaces the ticker,
//! canceling drops it, so at most one is ever running.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

const TICK: Duration = Duration::from_secs(1);

/// Result of one elapsed second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still running; seconds left.
    Running(i64),
    /// Reached zero or below. The ticker has been stopped.
    Expired(i64),
}

#[derive(Debug, Default)]
pub struct Countdown {
    remaining: i64,
    ticker: Option<Interval>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting down from `seconds`, canceling any running countdown.
    /// The first decrement happens one second from now.
    pub fn start(&mut self, seconds: i64) {
        let mut ticker = interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.remaining = seconds;
        self.ticker = Some(ticker);
    }

    pub fn cancel(&mut self) {
        self.ticker = None;
    }

    pub fn is_active(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    /// Wait for the next second to elapse. Pending forever while inactive,
    /// which lets it sit in a `select!` next to the socket and input.
    /// Cancel-safe.
    pub async fn tick(&mut self) -> Tick {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
                self.advance()
            }
            None => std::future::pending().await,
        }
    }

    fn advance(&mut self) -> Tick {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining <= 0 {
            self.ticker = None;
            Tick::Expired(self.remaining)
        } else {
            Tick::Running(self.remaining)
        }
    }
}
