//! Bounded retries for calls into blocking collaborators.
//!
//! The engine itself never blocks, but a leaf processor may consult an
//! external service (geocoding, distance lookup, …) that fails transiently.
//! Those calls go through [`retry_bounded`], which gives up after an injected
//! number of attempts and hands the last error back instead of spinning.

use thiserror::Error;
use tracing::{debug, warn};

/// Why a bounded retry gave up.
#[derive(Debug, Error)]
pub enum RetryError<E: std::fmt::Display> {
    /// Every attempt failed with a transient error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// The call failed in a way retrying cannot fix.
    #[error("permanent failure: {0}")]
    Permanent(E),

    /// Called with a cap of zero attempts.
    #[error("no attempts allowed")]
    NoAttempts,
}

/// Call `op` up to `max_attempts` times until it succeeds.
///
/// `is_transient` decides whether a failure is worth another attempt; a
/// non-transient failure is returned immediately as [`RetryError::Permanent`].
/// `op` receives the 1-based attempt number.
pub fn retry_bounded<T, E, F, P>(
    max_attempts: u32,
    is_transient: P,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Result<T, E>,
    P: Fn(&E) -> bool,
{
    if max_attempts == 0 {
        return Err(RetryError::NoAttempts);
    }

    for attempt in 1..=max_attempts {
        match op(attempt) {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "call succeeded after retrying");
                }
                return Ok(value);
            }
            Err(e) if !is_transient(&e) => return Err(RetryError::Permanent(e)),
            Err(e) if attempt == max_attempts => {
                warn!(attempts = attempt, error = %e, "giving up after bounded retries");
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: e,
                });
            }
            Err(e) => {
                debug!(attempt, max = max_attempts, error = %e, "transient failure, retrying");
            }
        }
    }

    unreachable!("retry loop exited without returning")
}
