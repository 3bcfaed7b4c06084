//! Generic retry with exponential backoff
//!
//! [`RetryingCaller`] wraps any async operation whose error type is
//! [`CallError`]. Transient errors are retried with exponentially increasing
//! delays; permanent errors surface immediately. The caller has no knowledge
//! of what it invokes - the same instance wraps generation and embedding
//! calls alike.

use covenant_domain::CallError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retry policy: attempt budget and backoff shape.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum invocations of the wrapped operation (>= 1)
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each subsequent retry
    pub base_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,

    /// Randomize each delay within [0.5x, 1.5x] to avoid thundering herds
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given zero-based failed attempt.
    ///
    /// Monotonically non-decreasing in `attempt` before jitter is applied,
    /// and capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.min(16); // 2^16 * base already dwarfs any sane cap
        let delay = self
            .base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay);

        if self.jitter {
            let factor = rand::thread_rng().gen_range(0.5..=1.5);
            delay.mul_f64(factor)
        } else {
            delay
        }
    }
}

/// Retry wrapper around external calls.
#[derive(Debug, Clone, Default)]
pub struct RetryingCaller {
    policy: RetryPolicy,
}

impl RetryingCaller {
    /// Create a caller with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The configured policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke `op`, retrying transient errors up to the attempt budget.
    ///
    /// An operation that fails transiently k times and then succeeds
    /// consumes exactly k+1 invocations. A permanent error surfaces on the
    /// invocation that produced it, without further attempts. When the
    /// budget is exhausted on transient errors the result is
    /// [`CallError::Exhausted`] carrying the last transient error.
    pub async fn call<T, F, Fut>(&self, mut op: F) -> Result<T, CallError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() => {
                    attempt += 1;
                    if attempt >= self.policy.max_attempts {
                        return Err(CallError::Exhausted {
                            attempts: attempt,
                            source: Box::new(error),
                        });
                    }
                    let delay = self.policy.delay_for(attempt - 1);
                    debug!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        ?delay,
                        %error,
                        "transient error, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(80),
            jitter: false,
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let caller = RetryingCaller::new(fast_policy(3));
        let calls = AtomicU32::new(0);

        let result: Result<u32, CallError> = caller
            .call(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(42) }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_then_success_consumes_k_plus_one() {
        let caller = RetryingCaller::new(fast_policy(5));
        let calls = AtomicU32::new(0);

        let result: Result<&str, CallError> = caller
            .call(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(CallError::RateLimited)
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_consumes_one_invocation() {
        let caller = RetryingCaller::new(fast_policy(5));
        let calls = AtomicU32::new(0);

        let result: Result<(), CallError> = caller
            .call(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CallError::InvalidRequest("malformed".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(CallError::InvalidRequest(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_last_transient_error() {
        let caller = RetryingCaller::new(fast_policy(3));
        let calls = AtomicU32::new(0);

        let result: Result<(), CallError> = caller
            .call(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CallError::Timeout) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(CallError::Exhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, CallError::Timeout));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_inter_attempt_delay_is_non_decreasing() {
        let caller = RetryingCaller::new(fast_policy(4));
        let calls = AtomicU32::new(0);
        let timestamps = std::sync::Mutex::new(Vec::<Instant>::new());

        let _: Result<(), CallError> = caller
            .call(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                timestamps.lock().unwrap().push(Instant::now());
                async { Err(CallError::RateLimited) }
            })
            .await;

        let stamps = timestamps.lock().unwrap();
        assert_eq!(stamps.len(), 4);
        let gaps: Vec<Duration> = stamps.windows(2).map(|w| w[1] - w[0]).collect();
        for pair in gaps.windows(2) {
            // Allow a little scheduler slop
            assert!(
                pair[1] + Duration::from_millis(2) >= pair[0],
                "delays should not decrease: {:?}",
                gaps
            );
        }
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
            jitter: false,
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::from_secs(4));
        assert_eq!(policy.delay_for(5), Duration::from_secs(10));
        assert_eq!(policy.delay_for(30), Duration::from_secs(10));
    }

    #[test]
    fn test_jittered_delay_stays_near_schedule() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            jitter: true,
        };
        for _ in 0..20 {
            let d = policy.delay_for(1);
            assert!(d >= Duration::from_secs(2) && d <= Duration::from_secs(6));
        }
    }
}
