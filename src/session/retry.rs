// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bounded retry with caller-supplied backoff.

use std::future::Future;
use std::time::Duration;

/// Result of a bounded retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    /// The operation succeeded on attempt `attempts` (1-based).
    Succeeded { value: T, attempts: u32 },
    /// Every attempt failed; `last_error` is from the final one.
    Exhausted { attempts: u32, last_error: E },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempts, .. } | RetryOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryOutcome::Succeeded { value, .. } => Ok(value),
            RetryOutcome::Exhausted { last_error, .. } => Err(last_error),
        }
    }
}

/// Linear backoff: attempt `n` is followed by a `n * step` pause.
pub fn linear_backoff(step: Duration) -> impl Fn(u32) -> Duration {
    move |attempt| step.saturating_mul(attempt)
}

/// Run `operation` up to `max_attempts` times.
///
/// `operation` receives the 1-based attempt number. After a failed attempt
/// `n` (other than the last) the loop sleeps for `backoff(n)`. No sleep
/// happens after the final attempt. `max_attempts` of zero is treated as one.
pub async fn retry_bounded<T, E, F, Fut, B>(
    max_attempts: u32,
    backoff: B,
    mut operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    B: Fn(u32) -> Duration,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                return RetryOutcome::Succeeded {
                    value,
                    attempts: attempt,
                }
            }
            Err(last_error) if attempt >= max_attempts => {
                return RetryOutcome::Exhausted {
                    attempts: attempt,
                    last_error,
                }
            }
            Err(_) => {
                let delay = backoff(attempt);
                tracing::trace!(attempt, delay_ms = delay.as_millis() as u64, "Retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
