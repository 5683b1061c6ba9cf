//! Client side rate limiting.
//!
//! A [`RateLimit`] is shared by every request issued through one client. It
//! combines a [`SlidingWindowCounter`] with a circuit: once the window fills up
//! (or the server answers 429) the circuit opens and every caller waits on the
//! same gate until a cooldown elapses.

mod window;

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub use window::SlidingWindowCounter;

/// How long the circuit stays open once the client side window is exhausted.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);

/// Upper bound of the random delay added on top of the cooldown so waiting
/// callers do not all resume in the same instant.
const MAX_COOLDOWN_JITTER_MS: u64 = 250;

#[derive(Debug)]
struct Circuit {
    limited: bool,
    opened_at: Option<Instant>,
    cooldown: Duration,
    /// Released (cancelled) when the circuit closes. Replaced on every open.
    gate: CancellationToken,
}

impl Circuit {
    fn closed() -> Self {
        let gate = CancellationToken::new();
        gate.cancel();

        Self {
            limited: false,
            opened_at: None,
            cooldown: Duration::ZERO,
            gate,
        }
    }
}

#[derive(Debug)]
pub struct RateLimit {
    circuit: Arc<Mutex<Circuit>>,
    window: SlidingWindowCounter,
    max_requests: i64,
    batch_size: i64,
    cooldown: Duration,
}

impl RateLimit {
    /// A limiter that only reacts to [`set_limited`](Self::set_limited), with no
    /// client side window.
    pub fn new() -> Self {
        Self::with_client_limits(0, 0, 0)
    }

    /// Limit to `max_requests` per `window_size` seconds. `batch_size` is added to
    /// the observed count to account for requests already in flight but not yet
    /// recorded.
    pub fn with_client_limits(window_size: i64, max_requests: i64, batch_size: i64) -> Self {
        Self {
            circuit: Arc::new(Mutex::new(Circuit::closed())),
            window: SlidingWindowCounter::new(window_size),
            max_requests,
            batch_size,
            cooldown: DEFAULT_COOLDOWN,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn limited(&self) -> bool {
        self.lock().limited
    }

    pub fn count(&self) -> i64 {
        self.window.count()
    }

    /// How long the circuit has been open, if it is.
    pub fn open_for(&self) -> Option<Duration> {
        self.lock().opened_at.map(|at| at.elapsed())
    }

    /// Records one dispatched request and opens the circuit when the window
    /// (plus the in-flight allowance) exceeds `max_requests`.
    pub fn increment(&self) {
        self.window.increment();

        if self.max_requests <= 0 || !self.window.is_enabled() {
            return;
        }

        let count = self.window.count() + self.batch_size;
        if count > self.max_requests {
            warn!(
                count,
                max_requests = self.max_requests,
                "client rate limit reached max requests"
            );
            let jitter = rand::rng().random_range(0..=MAX_COOLDOWN_JITTER_MS);
            self.set_limited(self.cooldown + Duration::from_millis(jitter));
        }
    }

    /// Opens the circuit for `duration`. Does nothing if it is already open.
    ///
    /// Must be called from within a Tokio runtime: the circuit is closed again
    /// by a detached timer task, so a caller dropping out early never leaves
    /// the circuit stuck open for everybody else.
    pub fn set_limited(&self, duration: Duration) {
        let gate = {
            let mut circuit = self.lock();
            if circuit.limited {
                return;
            }

            circuit.limited = true;
            circuit.opened_at = Some(Instant::now());
            circuit.cooldown = duration;
            circuit.gate = CancellationToken::new();
            circuit.gate.clone()
        };

        debug!(cooldown_ms = duration.as_millis() as u64, "client circuit open");

        let circuit = Arc::clone(&self.circuit);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            {
                let mut circuit = circuit.lock().unwrap_or_else(PoisonError::into_inner);
                circuit.limited = false;
                circuit.opened_at = None;
                circuit.cooldown = Duration::ZERO;
            }
            gate.cancel();
            debug!("client circuit closed");
        });
    }

    /// Waits until the circuit closes or `cancel` fires.
    pub async fn wait_until_open(&self, cancel: &CancellationToken) -> Result<()> {
        let gate = {
            let circuit = self.lock();
            if !circuit.limited {
                return Ok(());
            }
            circuit.gate.clone()
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = gate.cancelled() => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Circuit> {
        self.circuit.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self::new()
    }
}
