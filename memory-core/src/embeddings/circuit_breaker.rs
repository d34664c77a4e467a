//! A small circuit breaker around the embedding oracle.
//!
//! The standard closed/open/half-open pattern: a run of consecutive
//! timeouts trips the breaker to `Open` for a cooldown window,
//! short-circuiting further calls instead of hammering a down oracle on
//! every candidate.

use super::EmbeddingClient;
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: State,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Wraps an [`EmbeddingClient`], tripping to `Open` after
/// `failure_threshold` consecutive failures and staying there for
/// `cooldown` before allowing one trial call through (`HalfOpen`).
pub struct CircuitBreakerClient<C> {
    inner_client: C,
    failure_threshold: u32,
    cooldown: Duration,
    state: Mutex<Inner>,
}

impl<C: EmbeddingClient> CircuitBreakerClient<C> {
    #[must_use]
    pub fn new(client: C, failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            inner_client: client,
            failure_threshold,
            cooldown,
            state: Mutex::new(Inner {
                state: State::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    fn may_call(&self) -> bool {
        let mut guard = self.state.lock();
        match guard.state {
            State::Closed | State::HalfOpen => true,
            State::Open => {
                let elapsed = guard.opened_at.map_or(Duration::MAX, |t| t.elapsed());
                if elapsed >= self.cooldown {
                    guard.state = State::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn record_success(&self) {
        let mut guard = self.state.lock();
        guard.state = State::Closed;
        guard.consecutive_failures = 0;
        guard.opened_at = None;
    }

    fn record_failure(&self) {
        let mut guard = self.state.lock();
        guard.consecutive_failures += 1;
        if guard.state == State::HalfOpen || guard.consecutive_failures >= self.failure_threshold {
            guard.state = State::Open;
            guard.opened_at = Some(Instant::now());
        }
    }

    /// Whether the breaker is currently open (short-circuiting calls).
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.lock().state == State::Open
    }
}

#[async_trait]
impl<C: EmbeddingClient> EmbeddingClient for CircuitBreakerClient<C> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if !self.may_call() {
            return Err(Error::EmbedUnavailable(
                "circuit breaker open: embedding oracle recently failed repeatedly".to_string(),
            ));
        }
        match self.inner_client.embed(texts).await {
            Ok(v) => {
                self.record_success();
                Ok(v)
            }
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        }
    }

    fn dimension(&self) -> usize {
        self.inner_client.dimension()
    }
}
