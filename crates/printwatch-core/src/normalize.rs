//! Pure normalization helpers shared by every adapter.
//!
//! All functions are total: malformed input maps to a safe default rather
//! than an error.

use crate::types::PrinterStatus;

/// Display bound for engine-recorded failure descriptions, in characters.
pub const MAX_ERROR_LEN: usize = 120;

const IDLE_WORDS: &[&str] = &["IDLE", "READY", "OPERATIONAL", "FINISHED"];
const PRINTING_WORDS: &[&str] = &["PRINTING", "BUSY", "WORKING", "PRINTING FROM SD"];
const PAUSED_WORDS: &[&str] = &["PAUSED", "PAUSING"];
const ERROR_WORDS: &[&str] = &["ERROR", "STOPPED", "FAILED"];

/// Map a backend status word onto [`PrinterStatus`].
///
/// Case-insensitive. Unrecognized words map to `Unknown`, never `Error`:
/// `Error` is reserved for explicit device error signals.
pub fn normalize_state(raw: &str) -> PrinterStatus {
    let word = raw.trim().to_ascii_uppercase();
    let word = word.as_str();

    if IDLE_WORDS.contains(&word) {
        PrinterStatus::Idle
    } else if PRINTING_WORDS.contains(&word) {
        PrinterStatus::Printing
    } else if PAUSED_WORDS.contains(&word) {
        PrinterStatus::Paused
    } else if ERROR_WORDS.contains(&word) {
        PrinterStatus::Error
    } else if word == "OFFLINE" {
        PrinterStatus::Offline
    } else {
        PrinterStatus::Unknown
    }
}

/// Standard clamp. NaN maps to `lo`.
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_nan() { lo } else { x.max(lo).min(hi) }
}

/// Progress from a source that may report either a fraction or a percentage.
///
/// Values up to `1.0` are read as fractions, larger values as percentages.
pub fn normalize_progress(raw: f64) -> f64 {
    if raw <= 1.0 {
        clamp(raw, 0.0, 1.0)
    } else {
        percent_to_fraction(raw)
    }
}

/// Progress from a source known to report `0..=100`.
pub fn percent_to_fraction(percent: f64) -> f64 {
    clamp(percent / 100.0, 0.0, 1.0)
}

/// Remaining seconds; negative or non-finite inputs become `None`.
pub fn normalize_eta(raw: f64) -> Option<u64> {
    if raw.is_finite() && raw >= 0.0 {
        Some(raw as u64)
    } else {
        None
    }
}

/// First line of `msg`, cut to at most [`MAX_ERROR_LEN`] characters.
pub fn truncate_error(msg: &str) -> String {
    let first_line = msg.lines().next().unwrap_or("").trim_end();
    first_line.chars().take(MAX_ERROR_LEN).collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Clamped progress never leaves the unit interval.
        #[test]
        fn clamp_stays_in_unit_interval(x in proptest::num::f64::ANY) {
            let y = clamp(x, 0.0, 1.0);
            prop_assert!((0.0..=1.0).contains(&y), "clamp({x}) = {y}");
        }

        #[test]
        fn normalized_progress_in_bounds(x in -1.0e6f64..1.0e6) {
            let y = normalize_progress(x);
            prop_assert!((0.0..=1.0).contains(&y));
        }

        /// Arbitrary text never normalizes to Error unless it is an error word.
        #[test]
        fn arbitrary_words_never_become_error(raw in "[a-zA-Z ]{0,24}") {
            let state = normalize_state(&raw);
            prop_assert!(PrinterStatus::ALL.contains(&state));
            if state == PrinterStatus::Error {
                let upper = raw.trim().to_ascii_uppercase();
                prop_assert!(ERROR_WORDS.contains(&upper.as_str()));
            }
        }

        #[test]
        fn truncated_errors_are_bounded(msg in ".{0,400}") {
            let out = truncate_error(&msg);
            prop_assert!(out.chars().count() <= MAX_ERROR_LEN);
            prop_assert!(!out.contains('\n'));
        }
    }
}
