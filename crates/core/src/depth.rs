//! Nesting depth selection.

use crate::cost::capacity;

/// Smallest depth `n` with `cost(n) >= cycles`, found by probing upwards.
///
/// Depth 0 means the delay is short enough (at most 3 cycles) to be padded
/// with `nop`s alone.
pub fn required_depth(cycles: u64) -> usize {
    let target = cycles as u128;
    let mut depth = 0;
    while capacity(depth) < target {
        depth += 1;
    }
    depth
}
