//! # delayloop-core
//!
//! Cycle-exact busy-wait generator for 8-bit AVR microcontrollers.
//!
//! Given a number of clock cycles, computes the counters of a nest of
//! `dec`/`brne` countdown loops plus a few `nop`s that together burn exactly
//! that many cycles, and renders them as a counter list, GCC inline
//! assembly, a disassembly listing or Intel HEX.
//!
//! ## Architecture
//!
//! - [`cost`]: capacity of `k` fully swept nested loops
//! - [`depth`]: smallest nesting depth covering a target
//! - [`solver`]: mixed-radix decomposition into [`LoopParameters`]
//! - [`verify`]: independent recomputation of the achieved delay
//! - [`program`]: typed AVR instruction stream for a parameter set
//! - [`opcodes`] / [`disasm`]: instruction encoding and disassembly
//! - [`cpu`]: cycle-counting AVR core that runs generated programs
//! - [`render`]: text output in the configured [`OutputMode`]
//! - [`hex`]: Intel HEX writer/reader
//! - [`plan_file`]: save and reload solved plans
//! - [`units`]: time/frequency strings to cycle counts
//!
//! ## Timing model
//!
//! `LDI`, `DEC` and `NOP` take one cycle; `BRNE` takes two when taken and
//! one when it falls through. A level with counter `p` therefore costs `3p`
//! including its `LDI`, and a register loaded with 0 counts 256 times.

pub mod cost;
pub mod cpu;
pub mod depth;
pub mod disasm;
pub mod error;
pub mod hex;
pub mod opcodes;
pub mod plan_file;
pub mod program;
pub mod render;
pub mod solver;
pub mod units;
pub mod verify;

use serde::{Deserialize, Serialize};

pub use error::{Error, Result};
pub use render::{OutputMode, RenderConfig};
pub use solver::LoopParameters;

/// Iterations of one fully swept 8-bit countdown.
pub const ITERATIONS: u32 = 256;
/// Cycles a level costs at counter 1: `LDI` + `DEC` + untaken `BRNE`.
pub const LEVEL_OVERHEAD: u32 = 3;
/// Cycles an outer level adds per inner sweep: its `DEC` and taken `BRNE`.
pub const LOOP_OVERHEAD: u32 = 2;
/// Deepest nest any `u64` cycle count needs.
pub const MAX_DEPTH: usize = 8;
/// First counter register unless configured otherwise.
pub const DEFAULT_REGISTER_BASE: u8 = 16;

/// Number of general-purpose registers (R0..R31)
pub const REG_COUNT: usize = 32;

// SREG bit positions
pub const SREG_Z: u8 = 1;
pub const SREG_N: u8 = 2;
pub const SREG_V: u8 = 3;
pub const SREG_S: u8 = 4;

/// Cycle budget for [`simulate`] when the caller has no better bound.
pub const DEFAULT_SIMULATION_BUDGET: u64 = 100_000_000;

/// A verified solution for one cycle target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayPlan {
    pub cycles: u64,
    pub parameters: LoopParameters,
}

impl DelayPlan {
    pub fn depth(&self) -> usize {
        self.parameters.depth()
    }
}

/// Solve and verify a delay of exactly `cycles` cycles.
///
/// Panics if the solver and the verifier disagree; that is a defect in
/// this crate, never a property of the input.
pub fn plan(cycles: u64) -> DelayPlan {
    let depth = depth::required_depth(cycles);
    let parameters = solver::solve(depth, cycles);
    verify::verify(&parameters, cycles);
    log::debug!(
        "{} cycles: depth {}, counters {:?}, {} nop(s)",
        cycles,
        depth,
        parameters.counters,
        parameters.filler
    );
    DelayPlan { cycles, parameters }
}

/// Run the generated program for `plan` on the simulated core.
///
/// Returns the measured cycle count, which matches `plan.cycles` for every
/// plan produced by [`plan`].
pub fn simulate(plan: &DelayPlan, register_base: u8, budget: u64) -> Result<u64> {
    let program = program::build(&plan.parameters, register_base)?;
    let measured = cpu::count_cycles(&program, budget)?;
    log::info!("simulated {} instructions: {} cycles (target {})", program.len(), measured, plan.cycles);
    Ok(measured)
}
