//! Cycle cost model for nested `dec`/`brne` countdown loops.
//!
//! A single level with counter `p` costs `3p` cycles including its `ldi`
//! (`p` decrements, `p - 1` taken branches at 2 cycles, one fall-through at
//! 1). Wrapping one more level around a fully swept inner block multiplies
//! its capacity by 256 and adds the outer `dec` + `brne` overhead.

use crate::{ITERATIONS, LEVEL_OVERHEAD, LOOP_OVERHEAD, MAX_DEPTH};

/// Maximum cycles consumed by `depth` nested loops with every counter at 256.
///
/// `cost(0) = 3`, `cost(k) = cost(k - 1) * 256 + 2`. Computed iteratively;
/// valid up to depth 15 before `u128` overflows.
pub const fn cost(depth: usize) -> u128 {
    let mut c = LEVEL_OVERHEAD as u128;
    let mut k = 0;
    while k < depth {
        c = c * ITERATIONS as u128 + LOOP_OVERHEAD as u128;
        k += 1;
    }
    c
}

const fn build_table() -> [u128; MAX_DEPTH + 1] {
    let mut table = [0u128; MAX_DEPTH + 1];
    table[0] = LEVEL_OVERHEAD as u128;
    let mut k = 1;
    while k <= MAX_DEPTH {
        table[k] = table[k - 1] * ITERATIONS as u128 + LOOP_OVERHEAD as u128;
        k += 1;
    }
    table
}

/// `cost(k)` for every depth a `u64` target can require.
pub const COST_TABLE: [u128; MAX_DEPTH + 1] = build_table();

/// Table lookup for depths up to [`MAX_DEPTH`].
///
/// Panics past the table: no `u64` target needs a deeper nest, so asking for
/// one means the caller computed the depth wrong.
#[inline]
pub fn capacity(depth: usize) -> u128 {
    match COST_TABLE.get(depth) {
        Some(&c) => c,
        None => panic!("nesting depth {} exceeds the maximum of {}", depth, MAX_DEPTH),
    }
}
