use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a retried operation ultimately gave up.
#[derive(Debug, Error)]
pub enum RetryError<E> {
	#[error("max retries must be at least 1")]
	InvalidMaxRetries,
	/// The caller's cancellation signal fired; distinct from any operation
	/// error so "run was canceled" is never confused with "query failed".
	#[error("operation canceled")]
	Canceled,
	#[error("{0}")]
	Operation(E),
}

/// Invoke `op` until it succeeds, `max_retries` attempts are exhausted, or
/// `cancel` fires.
///
/// Attempt numbering starts at 0. Between attempts (except after the last)
/// the wait is `backoff/2 + uniform_random(0, backoff)`, after which the
/// backoff doubles, capped at `max_backoff`. Cancellation is checked before
/// every attempt and during every wait, and surfaces as
/// [RetryError::Canceled] rather than the last operation error.
pub async fn retry_with_backoff<T, E, F, Fut>(
	cancel: &CancellationToken,
	mut op: F,
	max_retries: u32,
	initial_backoff: Duration,
	max_backoff: Duration,
) -> Result<T, RetryError<E>>
where
	F: FnMut(u32) -> Fut,
	Fut: Future<Output = Result<T, E>>,
{
	if max_retries < 1 {
		return Err(RetryError::InvalidMaxRetries);
	}

	let mut backoff = initial_backoff.min(max_backoff);
	let mut last_err = None;

	for attempt in 0..max_retries {
		if cancel.is_cancelled() {
			return Err(RetryError::Canceled);
		}

		match op(attempt).await {
			Ok(val) => return Ok(val),
			Err(err) => last_err = Some(err),
		}

		if attempt == max_retries - 1 {
			break;
		}

		let wait = backoff / 2 + jitter(backoff);
		tokio::select! {
			_ = cancel.cancelled() => return Err(RetryError::Canceled),
			_ = tokio::time::sleep(wait) => {}
		}

		backoff = (backoff * 2).min(max_backoff);
	}

	match last_err {
		Some(err) => Err(RetryError::Operation(err)),
		// unreachable: the loop ran at least once
		None => Err(RetryError::InvalidMaxRetries),
	}
}

/// Uniform random delay in `[0, backoff)`, millisecond granularity.
fn jitter(backoff: Duration) -> Duration {
	let ms = (backoff.as_millis() as u64).max(1);
	Duration::from_millis(rand::thread_rng().gen_range(0..ms))
}
