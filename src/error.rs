//! Error taxonomy for the outcome algebra.
//!
//! Most anomalies (coerced configuration, unknown profile names, numeric
//! overflow, instability) are *not* represented as
//! `Result` errors: the engine degrades them into weighted buckets so that
//! every component operation remains a total function. Only the two
//! genuinely-fatal, programming-error cases get a real error type.

use std::collections::HashSet;
use std::sync::Mutex;

use once_cell::sync::Lazy;

/// Fatal errors raised by the outcome algebra itself.
///
/// These indicate a programming error at the call site (a missing reducer,
/// or asking for a deterministic value from a distribution that doesn't
/// have one) rather than a data or configuration problem, so they are not
/// swallowed and degraded the way configuration/profile/stability anomalies
/// are.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum SdlError {
    #[error("and() requires a reducer: neither operand carries a default combinator nor was one supplied")]
    ReducerMissing,

    #[error("get_value() called on a distribution with {bucket_count} buckets; exactly one is required")]
    NotDeterministic { bucket_count: usize },
}

pub type SdlResult<T> = Result<T, SdlError>;

/// Dedup set for "reported once" diagnostics (coerced configuration,
/// unknown profile names). Keyed by a short, caller-chosen tag so repeated
/// calls with the same anomaly don't flood logs.
static WARNED_ONCE: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Runs `emit` the first time a given `tag` is seen in this process, then
/// stays silent for subsequent calls with the same tag.
pub fn warn_once(tag: &str, emit: impl FnOnce()) {
    let mut seen = WARNED_ONCE.lock().expect("warn-once set poisoned");
    if seen.insert(tag.to_string()) {
        emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn warn_once_fires_a_single_time_per_tag() {
        let calls = AtomicUsize::new(0);
        for _ in 0..5 {
            warn_once("unit-test-tag-a", || {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn warn_once_tracks_tags_independently() {
        let calls = AtomicUsize::new(0);
        warn_once("unit-test-tag-b1", || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        warn_once("unit-test-tag-b2", || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = SdlError::NotDeterministic { bucket_count: 3 };
        assert!(err.to_string().contains('3'));
        assert_eq!(SdlError::ReducerMissing, SdlError::ReducerMissing);
    }
}
