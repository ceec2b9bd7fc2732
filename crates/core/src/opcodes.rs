//! AVR instruction encoder/decoder for the delay-loop instruction subset.
//!
//! Covers the handful of single-word instructions a countdown delay needs:
//! `LDI`, `DEC`, the branch-if-flag-clear group (`BRNE` is `BRBC 1`) and
//! `NOP`. Anything else decodes to [`Instruction::Unknown`].

/// Decoded AVR instruction with operands.
///
/// `d` is a register index 0..=31 (16..=31 for `Ldi`), `s` an SREG bit and `k`
/// a signed word displacement relative to the following instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Nop,
    Ldi { d: u8, k: u8 },
    Dec { d: u8 },
    Brbc { s: u8, k: i8 },
    Unknown(u16),
}

impl Instruction {
    /// `BRNE k`: branch if the Z flag is clear.
    pub fn brne(k: i8) -> Self {
        Instruction::Brbc { s: crate::SREG_Z, k }
    }
}

/// Encode an instruction into its 16-bit opcode word.
///
/// Operands are masked to their field widths; callers are expected to pass
/// values that fit (`Ldi` needs `d` in 16..=31, branches `k` in -64..=63).
pub fn encode(inst: Instruction) -> u16 {
    match inst {
        Instruction::Nop => 0x0000,
        // LDI: 1110 KKKK dddd KKKK
        Instruction::Ldi { d, k } => {
            let d = (d.wrapping_sub(16) & 0x0F) as u16;
            let k = k as u16;
            0xE000 | ((k & 0xF0) << 4) | (d << 4) | (k & 0x0F)
        }
        // DEC: 1001 010d dddd 1010
        Instruction::Dec { d } => 0x940A | (((d & 0x1F) as u16) << 4),
        // BRBC: 1111 01kk kkkk ksss
        Instruction::Brbc { s, k } => {
            0xF400 | ((((k as u8) & 0x7F) as u16) << 3) | (s & 7) as u16
        }
        Instruction::Unknown(w) => w,
    }
}

/// Decode a 16-bit instruction word.
pub fn decode(word: u16) -> Instruction {
    if word == 0x0000 {
        return Instruction::Nop;
    }
    match word >> 12 {
        // 1110 xxxx - LDI
        0xE => {
            let (d, k) = decode_4_8(word);
            Instruction::Ldi { d: d + 16, k }
        }
        // 1001 010d dddd 1010 - DEC
        0x9 if word & 0xFE0F == 0x940A => Instruction::Dec { d: ((word >> 4) & 0x1F) as u8 },
        // 1111 01kk kkkk ksss - BRBC
        0xF if word & 0xFC00 == 0xF400 => decode_brbc(word),
        _ => Instruction::Unknown(word),
    }
}

fn decode_brbc(word: u16) -> Instruction {
    let s = (word & 7) as u8;
    let k = ((word >> 3) & 0x7F) as u8;
    let k = ((k << 1) as i8) >> 1; // sign extend 7-bit
    Instruction::Brbc { s, k }
}

/// Decode 4-bit d, 8-bit K from: xxxx KKKK dddd KKKK
#[inline(always)]
fn decode_4_8(word: u16) -> (u8, u8) {
    let d = ((word >> 4) & 0x0F) as u8;
    let k = (((word >> 4) & 0xF0) | (word & 0x0F)) as u8;
    (d, k)
}

/// Little-endian byte image of an instruction stream, as stored in flash.
pub fn to_flash_bytes(program: &[Instruction]) -> Vec<u8> {
    program.iter().flat_map(|&inst| encode(inst).to_le_bytes()).collect()
}

/// Decode a little-endian flash image back into instructions.
pub fn from_flash_bytes(bytes: &[u8]) -> Vec<Instruction> {
    bytes
        .chunks_exact(2)
        .map(|w| decode(u16::from_le_bytes([w[0], w[1]])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_nop() {
        assert_eq!(encode(Instruction::Nop), 0x0000);
        assert_eq!(decode(0x0000), Instruction::Nop);
    }

    #[test]
    fn test_encode_ldi() {
        // LDI R16, 0xFF => 1110 1111 0000 1111 = 0xEF0F
        assert_eq!(encode(Instruction::Ldi { d: 16, k: 0xFF }), 0xEF0F);
        // LDI R31, 0xA6 => 1110 1010 1111 0110 = 0xEAF6
        assert_eq!(encode(Instruction::Ldi { d: 31, k: 0xA6 }), 0xEAF6);
        assert_eq!(decode(0xEAF6), Instruction::Ldi { d: 31, k: 0xA6 });
    }

    #[test]
    fn test_encode_dec() {
        // DEC R16 => 1001 0101 0000 1010 = 0x950A
        assert_eq!(encode(Instruction::Dec { d: 16 }), 0x950A);
        assert_eq!(decode(0x950A), Instruction::Dec { d: 16 });
        assert_eq!(decode(0x940A), Instruction::Dec { d: 0 });
    }

    #[test]
    fn test_encode_brne_backwards() {
        // BRNE .-4 => 1111 01 1111110 001 = 0xF7F1
        assert_eq!(encode(Instruction::brne(-2)), 0xF7F1);
        assert_eq!(decode(0xF7F1), Instruction::Brbc { s: 1, k: -2 });
        assert_eq!(decode(encode(Instruction::brne(-16))), Instruction::brne(-16));
    }

    #[test]
    fn test_decode_brbc_forward() {
        // BRNE .+6 => 1111 01 0000011 001 = 0xF419
        assert_eq!(decode(0xF419), Instruction::Brbc { s: 1, k: 3 });
        // BRCC .-128 => most negative displacement
        assert_eq!(decode(0xF600), Instruction::Brbc { s: 0, k: -64 });
    }

    #[test]
    fn test_decode_unknown() {
        // RJMP .+0
        assert_eq!(decode(0xC000), Instruction::Unknown(0xC000));
        // INC R16 shares the 1001 010d group with DEC
        assert_eq!(decode(0x9503), Instruction::Unknown(0x9503));
        // BREQ is outside the emitted subset
        assert_eq!(decode(0xF019), Instruction::Unknown(0xF019));
    }

    #[test]
    fn test_flash_bytes_little_endian() {
        let bytes = to_flash_bytes(&[Instruction::Ldi { d: 16, k: 0xFF }, Instruction::Nop]);
        assert_eq!(bytes, vec![0x0F, 0xEF, 0x00, 0x00]);
        assert_eq!(from_flash_bytes(&bytes), vec![Instruction::Ldi { d: 16, k: 0xFF }, Instruction::Nop]);
    }
}
