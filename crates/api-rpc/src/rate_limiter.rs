//! Rate Limiter (Token Bucket)
//!
//! Keeps one misbehaving client from saturating the daemon.

use std::sync::Mutex;
use std::time::Instant;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket rate limiter
pub struct RateLimiter {
    state: Mutex<BucketState>,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `max_tokens` - Maximum burst size
    /// * `refill_rate` - Tokens added per second
    pub fn new(max_tokens: u32, refill_rate: u32) -> Self {
        Self {
            state: Mutex::new(BucketState {
                tokens: max_tokens as f64,
                last_refill: Instant::now(),
            }),
            max_tokens: max_tokens as f64,
            refill_rate: refill_rate as f64,
        }
    }

    /// Check if a request is allowed (consumes 1 token)
    pub fn check(&self) -> bool {
        let mut state = self.state.lock().unwrap();

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Remaining tokens (for monitoring)
    #[allow(dead_code)]
    pub fn remaining(&self) -> f64 {
        self.state.lock().unwrap().tokens
    }
}
