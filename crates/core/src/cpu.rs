//! Minimal AVR core for cycle-counting generated delay programs.
//!
//! Executes the instruction subset of [`crate::opcodes`] over a register
//! file and SREG, charging datasheet cycle costs: 1 for `LDI`, `DEC` and
//! `NOP`, 2 for a taken conditional branch and 1 for a fall-through. Runs
//! until the program counter leaves the program, which is the point where
//! code following the inline assembly block would resume.
//!
//! `DEC` flag computation follows the ATmega datasheet: Z, N, V (set only
//! when decrementing 0x80) and S = N ^ V; C and H are untouched.

use thiserror::Error;

use crate::opcodes::{self, Instruction};
use crate::{REG_COUNT, SREG_N, SREG_S, SREG_V, SREG_Z};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("unsupported instruction word 0x{word:04X} at 0x{addr:04X}")]
    Unsupported { addr: u32, word: u16 },

    #[error("program did not finish within {budget} cycles")]
    CycleBudget { budget: u64 },

    #[error("branch at 0x{addr:04X} leaves the program")]
    BranchOutOfRange { addr: u32 },
}

/// CPU state: register file, status register, program counter and a cycle
/// counter (`tick`).
pub struct Cpu {
    /// General purpose registers R0..R31
    pub regs: [u8; REG_COUNT],
    /// Status register: I T H S V N Z C (bits 7..0)
    pub sreg: u8,
    /// Program counter (word address, not byte address)
    pub pc: u32,
    /// Monotonic cycle counter (incremented by each instruction's cycle cost)
    pub tick: u64,
    program: Vec<Instruction>,
}

impl Cpu {
    pub fn new(program: Vec<Instruction>) -> Self {
        Cpu { regs: [0; REG_COUNT], sreg: 0, pc: 0, tick: 0, program }
    }

    /// Load a little-endian flash image.
    pub fn from_flash(bytes: &[u8]) -> Self {
        Cpu::new(opcodes::from_flash_bytes(bytes))
    }

    #[inline(always)]
    pub fn flag(&self, bit: u8) -> bool {
        self.sreg & (1 << bit) != 0
    }

    pub fn finished(&self) -> bool {
        self.pc as usize >= self.program.len()
    }

    /// Execute one instruction and return its cycle cost.
    pub fn step(&mut self) -> Result<u8, SimError> {
        let addr = self.pc;
        let inst = self.program[addr as usize];
        self.pc += 1;

        let cycles = match inst {
            Instruction::Nop => 1,
            Instruction::Ldi { d, k } => { self.regs[d as usize] = k; 1 }
            Instruction::Dec { d } => {
                let rd = self.regs[d as usize];
                let res = rd.wrapping_sub(1);
                self.regs[d as usize] = res;
                let n = (res >> 7) & 1;
                let v = if rd == 0x80 { 1u8 } else { 0 };
                let z = if res == 0 { 1u8 } else { 0 };
                let s = n ^ v;
                self.sreg = (self.sreg & 0b1110_0001)
                    | (s << SREG_S) | (v << SREG_V) | (n << SREG_N) | (z << SREG_Z);
                1
            }
            Instruction::Brbc { s, k } => {
                if !self.flag(s) { self.branch(addr, k)?; 2 } else { 1 }
            }
            Instruction::Unknown(word) => {
                return Err(SimError::Unsupported { addr: addr * 2, word });
            }
        };
        self.tick += cycles as u64;
        Ok(cycles)
    }

    fn branch(&mut self, addr: u32, k: i8) -> Result<(), SimError> {
        let target = self.pc as i64 + k as i64;
        if target < 0 || target as usize > self.program.len() {
            return Err(SimError::BranchOutOfRange { addr: addr * 2 });
        }
        self.pc = target as u32;
        Ok(())
    }

    /// Run to the end of the program and return the total cycle count.
    pub fn run(&mut self, budget: u64) -> Result<u64, SimError> {
        while !self.finished() {
            if self.tick > budget {
                return Err(SimError::CycleBudget { budget });
            }
            self.step()?;
        }
        if self.tick > budget {
            return Err(SimError::CycleBudget { budget });
        }
        Ok(self.tick)
    }
}

/// Count the cycles a program takes from entry to fall-through.
///
/// The program is encoded to a flash image and decoded again before it
/// runs, so the count reflects the machine code rather than the typed
/// instruction list.
pub fn count_cycles(program: &[Instruction], budget: u64) -> Result<u64, SimError> {
    Cpu::from_flash(&opcodes::to_flash_bytes(program)).run(budget)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dec_flags() {
        let mut cpu = Cpu::new(vec![Instruction::Dec { d: 20 }]);
        cpu.regs[20] = 1;
        cpu.step().unwrap();
        assert_eq!(cpu.regs[20], 0);
        assert!(cpu.flag(SREG_Z));

        let mut cpu = Cpu::new(vec![Instruction::Dec { d: 20 }]);
        cpu.regs[20] = 0;
        cpu.step().unwrap();
        assert_eq!(cpu.regs[20], 0xFF);
        assert!(!cpu.flag(SREG_Z));
        assert!(cpu.flag(SREG_N));

        let mut cpu = Cpu::new(vec![Instruction::Dec { d: 20 }]);
        cpu.regs[20] = 0x80;
        cpu.step().unwrap();
        assert!(cpu.flag(SREG_V));
        assert!(!cpu.flag(SREG_N));
        assert!(cpu.flag(SREG_S));
    }

    #[test]
    fn test_dec_keeps_carry() {
        let mut cpu = Cpu::new(vec![Instruction::Dec { d: 16 }]);
        cpu.sreg = 0x01;
        cpu.regs[16] = 5;
        cpu.step().unwrap();
        assert_eq!(cpu.sreg & 1, 1);
    }

    #[test]
    fn test_branch_taken() {
        let mut cpu = Cpu::new(vec![Instruction::Nop, Instruction::Nop, Instruction::brne(-2)]);
        cpu.pc = 2;
        let c = cpu.step().unwrap();
        assert_eq!(c, 2);
        assert_eq!(cpu.pc, 1);
    }

    #[test]
    fn test_branch_not_taken() {
        let mut cpu = Cpu::new(vec![Instruction::brne(-1)]);
        cpu.sreg |= 1 << SREG_Z;
        let c = cpu.step().unwrap();
        assert_eq!(c, 1);
        assert_eq!(cpu.pc, 1);
    }

    #[test]
    fn test_single_loop_cycles() {
        // LDI + p * DEC + (p - 1) taken BRNE + 1 fall-through = 3p
        for p in [1u8, 2, 166] {
            let program = vec![Instruction::Ldi { d: 16, k: p }, Instruction::Dec { d: 16 }, Instruction::brne(-2)];
            assert_eq!(count_cycles(&program, 10_000).unwrap(), 3 * p as u64);
        }
        let program = vec![Instruction::Ldi { d: 16, k: 0 }, Instruction::Dec { d: 16 }, Instruction::brne(-2)];
        assert_eq!(count_cycles(&program, 10_000).unwrap(), 768);
    }

    #[test]
    fn test_unsupported() {
        let err = count_cycles(&[Instruction::Nop, Instruction::Unknown(0xC000)], 10).unwrap_err();
        assert_eq!(err, SimError::Unsupported { addr: 2, word: 0xC000 });
    }

    #[test]
    fn test_budget() {
        let program = vec![Instruction::Ldi { d: 16, k: 0 }, Instruction::Dec { d: 16 }, Instruction::brne(-2)];
        assert_eq!(count_cycles(&program, 100), Err(SimError::CycleBudget { budget: 100 }));
    }

    #[test]
    fn test_from_flash_runs_encoded_loop() {
        // LDI R16, 0x02 / DEC R16 / BRNE .-4
        let mut cpu = Cpu::from_flash(&[0x02, 0xE0, 0x0A, 0x95, 0xF1, 0xF7]);
        assert_eq!(cpu.run(100).unwrap(), 6);
        assert_eq!(cpu.regs[16], 0);
    }

    #[test]
    fn test_branch_out_of_range() {
        let err = count_cycles(&[Instruction::brne(-5)], 10).unwrap_err();
        assert_eq!(err, SimError::BranchOutOfRange { addr: 0 });
    }
}
