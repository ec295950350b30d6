use std::{future::Future, time::Duration};

use tokio::time;

use crate::{Error, Result};

/// Bounded exponential backoff around an unreliable provider call. Exhausting
/// the attempts surfaces as [`Error::Exhausted`] wrapping the last failure, so
/// the caller can treat it as a per-item outcome rather than a fatal error.
pub async fn with_backoff<T, F, Fut>(
	label: &str,
	max_attempts: u32,
	base_delay: Duration,
	mut op: F,
) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let mut attempt = 0_u32;

	loop {
		attempt += 1;

		match op().await {
			Ok(value) => return Ok(value),
			Err(err) if attempt >= max_attempts => {
				return Err(Error::Exhausted { attempts: attempt, source: Box::new(err) });
			},
			Err(err) => {
				let delay = base_delay.saturating_mul(1 << (attempt - 1).min(6));

				tracing::warn!(error = %err, %label, attempt, "Provider call failed. Retrying.");
				time::sleep(delay).await;
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicU32, Ordering};

	use super::*;

	#[tokio::test]
	async fn succeeds_after_transient_failures() {
		let calls = AtomicU32::new(0);
		let result = with_backoff("test", 3, Duration::from_millis(1), || {
			let call = calls.fetch_add(1, Ordering::SeqCst);

			async move {
				if call < 2 {
					Err(Error::Status { status: "UNAVAILABLE".to_string() })
				} else {
					Ok(42_u32)
				}
			}
		})
		.await;

		assert_eq!(result.expect("Expected success after retries."), 42);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn exhaustion_reports_attempt_count() {
		let result: Result<()> = with_backoff("test", 2, Duration::from_millis(1), || async {
			Err(Error::Status { status: "UNAVAILABLE".to_string() })
		})
		.await;

		match result {
			Err(Error::Exhausted { attempts, .. }) => assert_eq!(attempts, 2),
			other => panic!("Expected exhaustion, got {other:?}"),
		}
	}
}
