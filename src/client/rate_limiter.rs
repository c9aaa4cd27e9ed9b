//! Token-bucket rate limiting with FIFO request queuing.
//!
//! Each client owns one limiter. Tokens refill continuously at
//! `max_requests_per_second` up to `burst_size`; a call that finds the bucket
//! empty (or other calls already waiting) parks in a FIFO queue and is woken
//! by a single drain task in strict enqueue order. This is the backpressure
//! mechanism that keeps bursts from hammering upstream rate limits.

use crate::client::types::{ApiError, QueueStats, RateLimitConfig};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, trace};

#[derive(Debug)]
struct QueuedRequest {
    id: u64,
    tx: oneshot::Sender<()>,
}

#[derive(Debug)]
struct LimiterState {
    tokens: f64,
    last_refill: Instant,
    queue: VecDeque<QueuedRequest>,
    next_id: u64,
    processing: bool,
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Arc<Mutex<LimiterState>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let state = LimiterState {
            tokens: f64::from(config.burst_size),
            last_refill: Instant::now(),
            queue: VecDeque::new(),
            next_id: 0,
            processing: false,
        };
        Self {
            config,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Consume one token, suspending in FIFO order when the bucket is empty.
    ///
    /// A `deadline` that expires while queued removes the waiter and rejects
    /// with [`ApiError::Timeout`]; the bucket is left untouched.
    pub async fn acquire(&self, deadline: Option<Instant>) -> Result<(), ApiError> {
        let started = Instant::now();

        let (id, rx) = {
            let mut state = lock(&self.state);
            refill(&mut state, &self.config);

            // Fast path only when nobody is already waiting, so queued
            // callers keep their submission order
            if state.queue.is_empty() && state.tokens >= 1.0 {
                state.tokens -= 1.0;
                return Ok(());
            }

            let (tx, rx) = oneshot::channel();
            let id = state.next_id;
            state.next_id += 1;
            state.queue.push_back(QueuedRequest { id, tx });
            debug!(queue_length = state.queue.len(), "bucket empty, request queued");

            if !state.processing {
                state.processing = true;
                tokio::spawn(drain_queue(self.config.clone(), Arc::clone(&self.state)));
            }
            (id, rx)
        };

        let dispatched = match deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(tokio::time::Instant::from_std(deadline), rx).await {
                    Ok(result) => result,
                    Err(_) => {
                        self.remove(id);
                        return Err(ApiError::Timeout {
                            waited: started.elapsed(),
                        });
                    }
                }
            }
            None => rx.await,
        };

        dispatched.map_err(|_| ApiError::Network("request queue closed".to_string()))
    }

    /// Read-only snapshot of the bucket and queue.
    ///
    /// The reported token count accounts for elapsed refill time but nothing
    /// is written back.
    pub fn queue_stats(&self) -> QueueStats {
        let state = lock(&self.state);
        let elapsed = state.last_refill.elapsed().as_secs_f64();
        let tokens = (state.tokens + elapsed * self.config.max_requests_per_second)
            .min(f64::from(self.config.burst_size));
        QueueStats {
            queue_length: state.queue.len(),
            tokens,
            processing: state.processing,
        }
    }

    fn remove(&self, id: u64) {
        let mut state = lock(&self.state);
        state.queue.retain(|queued| queued.id != id);
    }
}

fn lock(state: &Mutex<LimiterState>) -> std::sync::MutexGuard<'_, LimiterState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn refill(state: &mut LimiterState, config: &RateLimitConfig) {
    let now = Instant::now();
    let elapsed = now.duration_since(state.last_refill).as_secs_f64();
    state.tokens = (state.tokens + elapsed * config.max_requests_per_second)
        .min(f64::from(config.burst_size));
    state.last_refill = now;
}

/// Single writer for the queue: refills, dispatches waiters strictly in
/// enqueue order, and exits once the queue is empty.
async fn drain_queue(config: RateLimitConfig, state: Arc<Mutex<LimiterState>>) {
    loop {
        let sleep_for = {
            let mut state = lock(&state);
            refill(&mut state, &config);

            while state.tokens >= 1.0 {
                let Some(waiter) = state.queue.pop_front() else {
                    break;
                };
                if waiter.tx.is_closed() {
                    // Caller gave up while queued; its slot costs no token
                    trace!(id = waiter.id, "skipping expired queued request");
                    continue;
                }
                state.tokens -= 1.0;
                if waiter.tx.send(()).is_err() {
                    state.tokens += 1.0;
                }
            }

            if state.queue.is_empty() {
                state.processing = false;
                return;
            }

            let deficit = 1.0 - state.tokens;
            Duration::from_secs_f64(deficit / config.max_requests_per_second)
                .max(Duration::from_millis(5))
        };
        tokio::time::sleep(sleep_for).await;
    }
}
