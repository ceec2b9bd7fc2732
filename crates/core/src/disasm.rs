//! AVR disassembler for generated delay programs.
//!
//! Converts [`Instruction`] values back to assembly text. Backs the listing
//! output mode.

use crate::opcodes::{self, Instruction};

/// Format a decoded instruction as an assembly string.
///
/// The output follows AVR assembly conventions (e.g. `LDI R16, 0xA6`).
/// The `pc` parameter (word address) is used to resolve relative branch targets.
pub fn disassemble(inst: Instruction, pc: u16) -> String {
    match inst {
        Instruction::Nop => "NOP".into(),
        Instruction::Ldi { d, k } => format!("LDI R{}, 0x{:02X}", d, k),
        Instruction::Dec { d } => format!("DEC R{}", d),
        Instruction::Brbc { s, k } => {
            let name = match s {
                0 => "BRCC", 1 => "BRNE", 2 => "BRPL", 3 => "BRVC",
                4 => "BRGE", 5 => "BRHC", 6 => "BRTC", 7 => "BRID",
                _ => "BRBC",
            };
            branch(name, pc, k)
        }
        Instruction::Unknown(w) => format!(".dw 0x{:04X}", w),
    }
}

fn branch(name: &str, pc: u16, k: i8) -> String {
    let target = (pc as i32 + 1 + k as i32) as u16;
    // Displacement printed in bytes, as avr-objdump does.
    format!("{} .{:+} ; 0x{:04X}", name, k as i32 * 2, target * 2)
}

/// Disassemble a program image.
///
/// Returns lines of `"0xAAAA: OPCODE  MNEMONIC"`, one per instruction word.
pub fn disassemble_program(program: &[Instruction]) -> Vec<String> {
    program
        .iter()
        .enumerate()
        .map(|(pc, &inst)| {
            let word = opcodes::encode(inst);
            format!("0x{:04X}: {:04X}  {}", pc * 2, word, disassemble(inst, pc as u16))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disasm_basic() {
        assert_eq!(disassemble(Instruction::Nop, 0), "NOP");
        assert_eq!(disassemble(Instruction::Ldi { d: 16, k: 0xFF }, 0), "LDI R16, 0xFF");
        assert_eq!(disassemble(Instruction::Dec { d: 17 }, 0), "DEC R17");
        assert_eq!(disassemble(Instruction::Unknown(0xC000), 0), ".dw 0xC000");
    }

    #[test]
    fn test_disasm_branch() {
        // BRNE -2 at PC=2 → target = 3 - 2 = 1, byte addr 0x0002
        let s = disassemble(Instruction::brne(-2), 2);
        assert_eq!(s, "BRNE .-4 ; 0x0002");
        let s = disassemble(Instruction::Brbc { s: 0, k: 3 }, 0x10);
        assert_eq!(s, "BRCC .+6 ; 0x0028");
    }

    #[test]
    fn test_disassemble_program() {
        let lines = disassemble_program(&[
            Instruction::Ldi { d: 16, k: 0xA6 },
            Instruction::Dec { d: 16 },
            Instruction::brne(-2),
            Instruction::Nop,
        ]);
        assert_eq!(lines, vec![
            "0x0000: EA06  LDI R16, 0xA6",
            "0x0002: 950A  DEC R16",
            "0x0004: F7F1  BRNE .-4 ; 0x0002",
            "0x0006: 0000  NOP",
        ]);
    }
}
