//! Exponential backoff for rate-limited calls.

use std::{future::Future, time::Duration};

use crate::Result;

/// How many times, and how patiently, to retry a rate-limited call.
///
/// The default allows 5 retries (6 attempts in total), waiting 2 s before
/// the first retry and 1.5 times longer before each following one. There is
/// no jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
  pub retries:       u32,
  pub initial_delay: Duration,
  pub multiplier:    f64,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      retries:       5,
      initial_delay: Duration::from_millis(2000),
      multiplier:    1.5,
    }
  }
}

impl RetryPolicy {
  /// Run `op` until it succeeds, fails with something other than a rate
  /// limit, or the retry budget is spent. The wait is an in-line sleep, so
  /// only the calling future is suspended.
  pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let mut remaining = self.retries;
    let mut delay = self.initial_delay;
    let mut attempt = 1;

    loop {
      match op().await {
        Ok(value) => return Ok(value),
        Err(err) if err.is_rate_limited() && remaining > 0 => {
          tracing::warn!(
            attempt,
            remaining,
            delay_ms = delay.as_millis() as u64,
            "AI call rate limited, backing off: {err}"
          );
          tokio::time::sleep(delay).await;
          delay = delay.mul_f64(self.multiplier);
          remaining -= 1;
          attempt += 1;
        }
        Err(err) => return Err(err),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};

  use tokio::time::Instant;

  use super::*;
  use crate::Error;

  /// Fails with a rate limit `failures` times, then returns the attempt
  /// number.
  async fn flaky(calls: &AtomicU32, failures: u32) -> Result<u32> {
    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
    if n <= failures {
      Err(Error::RateLimited { message: "RESOURCE_EXHAUSTED".into() })
    } else {
      Ok(n)
    }
  }

  #[tokio::test(start_paused = true)]
  async fn succeeds_after_k_rate_limits_with_geometric_wait() {
    for k in 0..5u32 {
      let calls = AtomicU32::new(0);
      let start = Instant::now();

      let attempt = RetryPolicy::default().run(|| flaky(&calls, k)).await.unwrap();

      assert_eq!(attempt, k + 1);
      // 2000 * (1.5^k - 1) / 0.5 ms.
      let expected_ms = 2000.0 * (1.5f64.powi(k as i32) - 1.0) / 0.5;
      let waited_ms = start.elapsed().as_secs_f64() * 1000.0;
      assert!(
        (waited_ms - expected_ms).abs() < 1.0,
        "k={k}: waited {waited_ms}ms, expected {expected_ms}ms"
      );
    }
  }

  #[tokio::test(start_paused = true)]
  async fn gives_up_after_exactly_five_retries() {
    let calls = AtomicU32::new(0);
    let err = RetryPolicy::default().run(|| flaky(&calls, 10)).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(calls.load(Ordering::SeqCst), 6);
  }

  #[tokio::test(start_paused = true)]
  async fn other_errors_are_not_retried() {
    let calls = &AtomicU32::new(0);
    let start = Instant::now();
    let err = RetryPolicy::default().run(move || async move {
      calls.fetch_add(1, Ordering::SeqCst);
      Err::<(), _>(Error::Service { status: 500, message: "internal".into() })
    })
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Service { status: 500, .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
  }

  #[tokio::test(start_paused = true)]
  async fn missing_credential_fails_immediately() {
    let calls = &AtomicU32::new(0);
    let err = RetryPolicy::default().run(move || async move {
      calls.fetch_add(1, Ordering::SeqCst);
      Err::<(), _>(Error::MissingCredential)
    })
    .await
    .unwrap_err();
    assert!(matches!(err, Error::MissingCredential));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
