//! Loop-counter solver.
//!
//! Decomposes a cycle target into nested loop counters plus trailing `nop`s.
//! After subtracting the fixed 3 cycles every level costs at counter 1, the
//! remainder is written in a mixed radix whose place values are
//! `cost(level)` and whose digits are `counter - 1` in `0..=255`. Digits are
//! picked outer to inner, each the largest one that still fits; an inner
//! digit that would exceed 255 saturates and leaves its surplus to the finer
//! levels. Whatever is finer than the innermost place value becomes filler.
//!
//! Since any two digit vectors differ by at least 3 cycles, this picks the
//! unique parameter set with the smallest filler at the given depth.

use serde::{Deserialize, Serialize};

use crate::cost::capacity;
use crate::{ITERATIONS, LEVEL_OVERHEAD};

/// Largest digit a level can take (counter 256, loaded as 0).
const MAX_STEPS: u128 = ITERATIONS as u128 - 1;

/// Counter values for each nesting level plus the `nop` padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopParameters {
    /// Logical counters, outermost first, each in `1..=256`.
    pub counters: Vec<u16>,
    /// Single-cycle pad instructions appended after the loop nest.
    pub filler: u64,
}

impl LoopParameters {
    pub fn depth(&self) -> usize {
        self.counters.len()
    }

    /// Value to load into the counter register: 256 wraps to 0.
    #[inline]
    pub fn register_value(counter: u16) -> u8 {
        (counter % ITERATIONS as u16) as u8
    }
}

/// Compute the loop counters for `depth` nested loops consuming exactly
/// `cycles` cycles.
///
/// `depth` must come from [`crate::depth::required_depth`]. A depth that
/// cannot express the target is a caller defect and panics.
pub fn solve(depth: usize, cycles: u64) -> LoopParameters {
    let target = cycles as u128;

    if depth == 0 {
        assert!(
            target <= capacity(0),
            "{} cycles cannot be padded without a loop",
            cycles
        );
        return LoopParameters { counters: Vec::new(), filler: cycles };
    }

    let overhead = LEVEL_OVERHEAD as u128 * depth as u128;
    assert!(
        target >= overhead,
        "{} cycles are below the fixed cost of {} nested loops",
        cycles,
        depth
    );

    let mut remaining = target - overhead;
    let mut counters = Vec::with_capacity(depth);
    for level in (0..depth).rev() {
        let weight = capacity(level);
        let mut steps = remaining / weight;
        if level == depth - 1 {
            assert!(
                steps <= MAX_STEPS,
                "outer counter {} out of range for {} cycles at depth {}",
                steps + 1,
                cycles,
                depth
            );
        } else if steps > MAX_STEPS {
            log::trace!("level {} saturated, carrying {} cycles inward", level, remaining - MAX_STEPS * weight);
            steps = MAX_STEPS;
        }
        remaining -= steps * weight;
        counters.push(steps as u16 + 1);
    }

    LoopParameters { counters, filler: remaining as u64 }
}
