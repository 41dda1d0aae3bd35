//! Bounded retry for contended operations.

use crate::constants::{CONTENTION_RETRY_ATTEMPTS, CONTENTION_RETRY_BACKOFF};
use crate::error::WardResult;

/// Run `op`, retrying with doubling backoff while it fails with a retryable
/// contention error. Attempts are bounded; the final error is surfaced to the
/// caller unchanged.
pub(crate) fn run_contended<T>(mut op: impl FnMut() -> WardResult<T>) -> WardResult<T> {
    let mut backoff = CONTENTION_RETRY_BACKOFF;
    let mut attempt = 1u32;
    loop {
        match op() {
            Err(err) if err.is_retryable() && attempt < CONTENTION_RETRY_ATTEMPTS => {
                tracing::debug!(attempt, "retrying contended ward store operation");
                std::thread::sleep(backoff);
                backoff *= 2;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WardError;

    #[test]
    fn retries_contention_then_succeeds() {
        let mut calls = 0;
        let out = run_contended(|| {
            calls += 1;
            if calls < 3 {
                Err(WardError::ConcurrentUpdate)
            } else {
                Ok(calls)
            }
        })
        .unwrap();
        assert_eq!(out, 3);
    }

    #[test]
    fn attempts_are_bounded() {
        let mut calls = 0;
        let err = run_contended::<()>(|| {
            calls += 1;
            Err(WardError::ConcurrentUpdate)
        })
        .unwrap_err();
        assert!(matches!(err, WardError::ConcurrentUpdate));
        assert_eq!(calls, CONTENTION_RETRY_ATTEMPTS);
    }

    #[test]
    fn non_retryable_errors_surface_immediately() {
        let mut calls = 0;
        let err = run_contended::<()>(|| {
            calls += 1;
            Err(WardError::InvalidInput("bad".into()))
        })
        .unwrap_err();
        assert!(matches!(err, WardError::InvalidInput(_)));
        assert_eq!(calls, 1);
    }
}
