//! Independent recomputation of the delay a parameter set produces.
//!
//! Walks the levels from the innermost outwards with its own running cost
//! recurrence, so a solver bug shows up as a mismatch instead of being
//! reproduced.

use thiserror::Error;

use crate::depth::required_depth;
use crate::solver::LoopParameters;
use crate::{ITERATIONS, LEVEL_OVERHEAD, LOOP_OVERHEAD, MAX_DEPTH};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("{depth} nested loops exceed the supported maximum of {max}")]
    TooDeep { depth: usize, max: usize },

    #[error("counter {value} at level {level} is outside 1..=256")]
    CounterOutOfRange { level: usize, value: u16 },

    #[error("{depth} nested loops where {required} suffice")]
    NotMinimal { depth: usize, required: usize },

    #[error("{filler} filler cycles exceed the limit of {max} at this depth")]
    FillerTooLarge { filler: u64, max: u64 },

    #[error("expected {expected} cycles, parameters consume {actual}")]
    Mismatch { expected: u64, actual: u128 },
}

/// Cycles consumed by the loop nest and its filler.
///
/// Level `i` (0 = innermost) contributes `3 + (p - 1) * cost(i)`. Counters
/// must already be in `1..=256`; use [`check`] for unvalidated input.
pub fn achieved(params: &LoopParameters) -> u128 {
    let n = params.counters.len();
    let mut total = 0u128;
    let mut level_cost = LEVEL_OVERHEAD as u128;
    for i in 0..n {
        let counter = params.counters[n - 1 - i] as u128;
        total += LEVEL_OVERHEAD as u128 + (counter - 1) * level_cost;
        if i + 1 < n {
            level_cost = level_cost * ITERATIONS as u128 + LOOP_OVERHEAD as u128;
        }
    }
    total + params.filler as u128
}

/// Most `nop`s a solved plan of `depth` levels can need.
///
/// Every saturated inner digit carries at most two cycles inward.
pub fn max_filler(depth: usize) -> u64 {
    if depth == 0 {
        LEVEL_OVERHEAD as u64
    } else {
        LOOP_OVERHEAD as u64 * depth as u64
    }
}

/// Validate parameters that did not come straight from the solver.
///
/// Besides reproducing `expected`, the nest must be as shallow as possible
/// and the filler within [`max_filler`].
pub fn check(params: &LoopParameters, expected: u64) -> Result<(), VerifyError> {
    let depth = params.depth();
    if depth > MAX_DEPTH {
        return Err(VerifyError::TooDeep { depth, max: MAX_DEPTH });
    }
    for (level, &value) in params.counters.iter().enumerate() {
        if !(1..=ITERATIONS as u16).contains(&value) {
            return Err(VerifyError::CounterOutOfRange { level, value });
        }
    }
    let required = required_depth(expected);
    if depth != required {
        return Err(VerifyError::NotMinimal { depth, required });
    }
    let max = max_filler(depth);
    if params.filler > max {
        return Err(VerifyError::FillerTooLarge { filler: params.filler, max });
    }
    let actual = achieved(params);
    if actual != expected as u128 {
        return Err(VerifyError::Mismatch { expected, actual });
    }
    Ok(())
}

/// Hard equality check on freshly solved parameters.
///
/// Any disagreement is a solver defect for this target, so it panics.
pub fn verify(params: &LoopParameters, expected: u64) {
    if let Err(e) = check(params, expected) {
        panic!("loop solver defect for {} cycles ({:?}): {}", expected, params.counters, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(counters: &[u16], filler: u64) -> LoopParameters {
        LoopParameters { counters: counters.to_vec(), filler }
    }

    #[test]
    fn test_achieved_single_level() {
        assert_eq!(achieved(&params(&[166], 2)), 500);
        assert_eq!(achieved(&params(&[1], 0)), 3);
        assert_eq!(achieved(&params(&[256], 0)), 768);
    }

    #[test]
    fn test_achieved_nested() {
        // Inner block 3*p1, outer adds 3 + (p0 - 1) * 770.
        assert_eq!(achieved(&params(&[2, 10], 1)), 30 + 3 + 770 + 1);
        assert_eq!(achieved(&params(&[1, 256], 3)), 774);
    }

    #[test]
    fn test_achieved_filler_only() {
        assert_eq!(achieved(&params(&[], 0)), 0);
        assert_eq!(achieved(&params(&[], 3)), 3);
    }

    #[test]
    fn test_check_accepts_exact() {
        assert_eq!(check(&params(&[166], 2), 500), Ok(()));
    }

    #[test]
    fn test_check_mismatch() {
        assert_eq!(
            check(&params(&[166], 1), 500),
            Err(VerifyError::Mismatch { expected: 500, actual: 499 })
        );
    }

    #[test]
    fn test_check_counter_range() {
        assert_eq!(
            check(&params(&[3, 0], 0), 10),
            Err(VerifyError::CounterOutOfRange { level: 1, value: 0 })
        );
        assert_eq!(
            check(&params(&[257], 0), 771),
            Err(VerifyError::CounterOutOfRange { level: 0, value: 257 })
        );
    }

    #[test]
    fn test_check_depth() {
        let deep = params(&[1; MAX_DEPTH + 1], 0);
        assert!(matches!(check(&deep, 27), Err(VerifyError::TooDeep { .. })));
    }

    #[test]
    fn test_check_rejects_padding_instead_of_loops() {
        assert_eq!(
            check(&params(&[], 500), 500),
            Err(VerifyError::NotMinimal { depth: 0, required: 1 })
        );
        assert_eq!(
            check(&params(&[], u64::MAX), u64::MAX),
            Err(VerifyError::NotMinimal { depth: 0, required: MAX_DEPTH })
        );
        // Right depth, but both counters at 1 and the rest padded with nops.
        assert_eq!(
            check(&params(&[1, 1], 768), 774),
            Err(VerifyError::FillerTooLarge { filler: 768, max: 4 })
        );
    }

    #[test]
    fn test_check_filler_limit() {
        // Same 500 cycles with the counter one short and three extra nops.
        assert_eq!(
            check(&params(&[165], 5), 500),
            Err(VerifyError::FillerTooLarge { filler: 5, max: 2 })
        );
        assert_eq!(check(&params(&[], 3), 3), Ok(()));
        assert_eq!(check(&params(&[1, 256], 3), 774), Ok(()));
    }

    #[test]
    fn test_max_filler() {
        assert_eq!(max_filler(0), 3);
        assert_eq!(max_filler(1), 2);
        assert_eq!(max_filler(8), 16);
    }

    #[test]
    #[should_panic(expected = "loop solver defect")]
    fn test_verify_panics_on_mismatch() {
        verify(&params(&[166], 2), 501);
    }
}
