//! Circuit breaker wrapping the data-index reads (`getDataAttributes`,
//! `getDataParent`), grounded on the gateway middleware's
//! closed/open/half-open state machine but tripped by failure *rate* over a
//! rolling window rather than a raw failure count, per spec §4.8's
//! "50% error rate over 5s" contract.
//!
//! ```text
//!            failures over window            timeout elapsed
//!    ┌─────────┐ ──────────────────► ┌──────┐ ───────────────► ┌───────────┐
//!    │ Closed  │                     │ Open │                  │ Half-Open │
//!    └─────────┘ ◄────────────────── └──────┘ ◄──────────────── └───────────┘
//!         success in half-open               failure in half-open
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::time::{Duration, Instant};

use cgw_types::constants::{
    CIRCUIT_BREAKER_FAILURE_RATE, CIRCUIT_BREAKER_MIN_SAMPLES, CIRCUIT_BREAKER_OPEN_TIMEOUT, CIRCUIT_BREAKER_WINDOW,
};
use parking_lot::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_rate_threshold: f64,
    pub window: Duration,
    pub open_timeout: Duration,
    pub min_samples: u32,
    pub call_timeout: Option<Duration>,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: CIRCUIT_BREAKER_FAILURE_RATE,
            window: CIRCUIT_BREAKER_WINDOW,
            open_timeout: CIRCUIT_BREAKER_OPEN_TIMEOUT,
            min_samples: CIRCUIT_BREAKER_MIN_SAMPLES,
            call_timeout: None,
        }
    }
}

struct Inner {
    state: BreakerState,
    samples: VecDeque<(Instant, bool)>,
    opened_at: Option<Instant>,
}

/// Wraps a single protected call site (one breaker per subsystem method,
/// unlike the teacher's single manager keyed by subsystem name — this
/// crate's two call sites, `get_data_attributes` and `get_data_parent`, each
/// get their own `CircuitBreaker` instance from the caller).
pub struct CircuitBreaker {
    name: &'static str,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            name,
            config,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                samples: VecDeque::new(),
                opened_at: None,
            }),
        }
    }

    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    fn should_allow(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let opened_at = inner.opened_at.expect("open state always carries opened_at");
                if opened_at.elapsed() >= self.config.open_timeout {
                    debug!(subsystem = self.name, "circuit breaker probing, half-open");
                    inner.state = BreakerState::HalfOpen;
                    inner.samples.clear();
                    true
                } else {
                    false
                }
            }
        }
    }

    fn record(&self, success: bool) {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        match inner.state {
            BreakerState::HalfOpen => {
                if success {
                    debug!(subsystem = self.name, "circuit breaker closing after successful probe");
                    inner.state = BreakerState::Closed;
                    inner.samples.clear();
                } else {
                    warn!(subsystem = self.name, "circuit breaker reopening after failed probe");
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(now);
                    inner.samples.clear();
                }
            }
            BreakerState::Closed => {
                inner.samples.push_back((now, success));
                let window = self.config.window;
                while inner
                    .samples
                    .front()
                    .is_some_and(|(t, _)| now.duration_since(*t) > window)
                {
                    inner.samples.pop_front();
                }
                if inner.samples.len() as u32 >= self.config.min_samples {
                    let failures = inner.samples.iter().filter(|(_, ok)| !ok).count();
                    let rate = failures as f64 / inner.samples.len() as f64;
                    if rate >= self.config.failure_rate_threshold {
                        warn!(subsystem = self.name, rate, "circuit breaker opening on failure rate");
                        inner.state = BreakerState::Open;
                        inner.opened_at = Some(now);
                        inner.samples.clear();
                    }
                }
            }
            BreakerState::Open => {}
        }
    }

    /// Runs `f` if the breaker allows it. `Ok(None)` means the breaker is
    /// open — the caller treats this as "unknown", not as an error (spec
    /// §4.8/§9). `Err(e)` is a real failure from an allowed call.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<BreakerTimeout>,
    {
        if !self.should_allow() {
            return Ok(None);
        }

        let outcome = match self.config.call_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, f()).await {
                Ok(result) => result,
                Err(_) => Err(BreakerTimeout.into()),
            },
            None => f().await,
        };

        match &outcome {
            Ok(_) => self.record(true),
            Err(_) => self.record(false),
        }
        outcome.map(Some)
    }
}

/// Marker error for a call that exceeded `CircuitBreakerConfig::call_timeout`.
/// The protected call's own error type must provide a conversion so
/// `CircuitBreaker::call` can surface it alongside ordinary failures.
#[derive(Debug, Clone, Copy)]
pub struct BreakerTimeout;

impl std::fmt::Display for BreakerTimeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data-index call timed out")
    }
}

impl std::error::Error for BreakerTimeout {}
