//! Instruction stream for a delay loop.
//!
//! Layout for `n` levels, registers `rB..rB+n-1` (outermost first):
//!
//! ```text
//!     LDI  rB,     p0        ; one per level, outer to inner
//!     ...
//!     LDI  rB+n-1, p(n-1)
//! L:  DEC  rB+n-1            ; innermost first
//!     BRNE L
//!     ...
//!     DEC  rB                ; outermost last
//!     BRNE L
//!     NOP                    ; filler
//! ```
//!
//! Every branch returns to the same label. When an inner counter runs out
//! the next `DEC` steps its outer level and re-enters the whole block, where
//! the exhausted inner register (now 0) counts a full 256 again.

use crate::error::{Error, Result};
use crate::opcodes::Instruction;
use crate::solver::LoopParameters;
use crate::REG_COUNT;

/// Lowest register `LDI` can address.
pub const LDI_MIN_REG: u8 = 16;

/// Check that `depth` counters starting at `base` stay within r16..r31.
pub fn check_registers(base: u8, depth: usize) -> Result<()> {
    if depth == 0 {
        return Ok(());
    }
    let last = base as usize + depth - 1;
    if base < LDI_MIN_REG || last >= REG_COUNT {
        return Err(Error::RegisterRange { base, depth });
    }
    Ok(())
}

/// Build the instruction stream for `params` using registers from `base`.
pub fn build(params: &LoopParameters, base: u8) -> Result<Vec<Instruction>> {
    let n = params.depth();
    check_registers(base, n)?;

    let mut program = Vec::with_capacity(3 * n + params.filler as usize);
    for (level, &counter) in params.counters.iter().enumerate() {
        program.push(Instruction::Ldi {
            d: base + level as u8,
            k: LoopParameters::register_value(counter),
        });
    }
    for j in 0..n {
        program.push(Instruction::Dec { d: base + (n - 1 - j) as u8 });
        // Back to the label: over this pair and every earlier one.
        program.push(Instruction::brne(-(2 * j as i8 + 2)));
    }
    for _ in 0..params.filler {
        program.push(Instruction::Nop);
    }
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::count_cycles;
    use crate::verify::achieved;

    fn params(counters: &[u16], filler: u64) -> LoopParameters {
        LoopParameters { counters: counters.to_vec(), filler }
    }

    #[test]
    fn test_build_single_level() {
        let program = build(&params(&[166], 2), 16).unwrap();
        assert_eq!(program, vec![
            Instruction::Ldi { d: 16, k: 166 },
            Instruction::Dec { d: 16 },
            Instruction::brne(-2),
            Instruction::Nop,
            Instruction::Nop,
        ]);
    }

    #[test]
    fn test_build_nested_register_order() {
        let program = build(&params(&[2, 256, 9], 0), 20).unwrap();
        assert_eq!(&program[..3], &[
            Instruction::Ldi { d: 20, k: 2 },
            Instruction::Ldi { d: 21, k: 0 },
            Instruction::Ldi { d: 22, k: 9 },
        ]);
        assert_eq!(&program[3..], &[
            Instruction::Dec { d: 22 },
            Instruction::brne(-2),
            Instruction::Dec { d: 21 },
            Instruction::brne(-4),
            Instruction::Dec { d: 20 },
            Instruction::brne(-6),
        ]);
    }

    #[test]
    fn test_build_filler_only() {
        let program = build(&params(&[], 3), 0).unwrap();
        assert_eq!(program, vec![Instruction::Nop; 3]);
    }

    #[test]
    fn test_register_range() {
        assert!(check_registers(16, 8).is_ok());
        assert!(check_registers(24, 8).is_ok());
        assert!(check_registers(31, 1).is_ok());
        assert!(matches!(check_registers(25, 8), Err(Error::RegisterRange { base: 25, depth: 8 })));
        assert!(matches!(check_registers(15, 1), Err(Error::RegisterRange { .. })));
        assert!(check_registers(200, 0).is_ok());
    }

    #[test]
    fn test_simulated_cycles_match_cost_formula() {
        for p in [params(&[166], 2), params(&[2, 10], 1), params(&[1, 256], 3), params(&[2, 1, 256], 0)] {
            let program = build(&p, 16).unwrap();
            assert_eq!(count_cycles(&program, 1_000_000).unwrap() as u128, achieved(&p), "{:?}", p);
        }
    }
}
