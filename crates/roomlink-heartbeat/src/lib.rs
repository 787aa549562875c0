//! Fixed-period keep-alive scheduler for roomlink.
//!
//! The game server drops connections that stay silent, so once the
//! handshake is accepted the client sends an empty heartbeat packet on a
//! fixed period. This crate only decides *when*; the client loop decides
//! what to send.
//!
//! # Integration
//!
//! The scheduler sits inside the client's `tokio::select!` loop, owned
//! through an `Option` so that dropping it is the cancellation:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(ev) = channel_rx.recv() => { /* frames */ }
//!         beat = next_beat(&mut heartbeat) => { /* send keep-alive */ }
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Heartbeat timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Time between beats. Default: 15 s.
    pub period: Duration,
    /// Fire the first beat as soon as the scheduler starts instead of one
    /// period later. Default: `true`.
    pub immediate_first: bool,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            period: Self::DEFAULT_PERIOD,
            immediate_first: true,
        }
    }
}

impl HeartbeatConfig {
    pub const DEFAULT_PERIOD: Duration = Duration::from_secs(15);

    /// Config with a custom period and an immediate first beat.
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    /// Replaces a zero period, which would fire in a tight loop, with the
    /// default.
    pub fn validated(mut self) -> Self {
        if self.period.is_zero() {
            warn!(
                default_secs = Self::DEFAULT_PERIOD.as_secs(),
                "heartbeat period is zero, using default"
            );
            self.period = Self::DEFAULT_PERIOD;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Beat info
// ---------------------------------------------------------------------------

/// Returned by [`Heartbeat::wait_for_beat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeatInfo {
    /// Beat number, starting at 1.
    pub beat: u64,
    /// How far past its deadline the beat fired.
    pub late_by: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Cancellable fixed-period scheduler.
#[derive(Debug)]
pub struct Heartbeat {
    period: Duration,
    next_beat: Instant,
    beat_count: u64,
    stopped: bool,
}

impl Heartbeat {
    pub fn new(config: HeartbeatConfig) -> Self {
        let config = config.validated();
        let now = Instant::now();
        let next_beat = if config.immediate_first {
            now
        } else {
            now + config.period
        };
        debug!(
            period_ms = config.period.as_millis() as u64,
            immediate = config.immediate_first,
            "heartbeat started"
        );
        Self {
            period: config.period,
            next_beat,
            beat_count: 0,
            stopped: false,
        }
    }

    /// Waits for the next beat.
    ///
    /// Once [`stop`](Self::stop) was called the future never resolves, so
    /// a `select!` arm using it simply goes quiet.
    pub async fn wait_for_beat(&mut self) -> BeatInfo {
        if self.stopped {
            std::future::pending::<()>().await;
        }

        let deadline = self.next_beat;
        time::sleep_until(deadline).await;

        let now = Instant::now();
        let late_by = now.saturating_duration_since(deadline);
        self.beat_count += 1;

        if late_by > self.period {
            let missed = late_by.as_nanos() / self.period.as_nanos();
            warn!(
                beat = self.beat_count,
                missed = missed as u64,
                late_ms = late_by.as_millis() as u64,
                "heartbeat late, skipping missed beats"
            );
        }
        // Schedule from now so a stalled loop never bursts beats.
        self.next_beat = now + self.period;

        trace!(beat = self.beat_count, "heartbeat");
        BeatInfo {
            beat: self.beat_count,
            late_by,
        }
    }

    /// Stops the scheduler for good. Idempotent.
    pub fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            debug!(beats = self.beat_count, "heartbeat stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Number of beats fired so far.
    pub fn beat_count(&self) -> u64 {
        self.beat_count
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

/// Waits on an optional scheduler. `None` pends forever.
pub async fn next_beat(heartbeat: &mut Option<Heartbeat>) -> BeatInfo {
    match heartbeat {
        Some(hb) => hb.wait_for_beat().await,
        None => std::future::pending().await,
    }
}
