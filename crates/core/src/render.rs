//! Output rendering for solved delay loops.

use serde::{Deserialize, Serialize};

use crate::disasm::disassemble_program;
use crate::error::Result;
use crate::hex::write_hex;
use crate::opcodes::{to_flash_bytes, Instruction};
use crate::program::build;
use crate::solver::LoopParameters;
use crate::{DEFAULT_REGISTER_BASE, SREG_Z};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    /// `[p0, p1, ..., filler]`
    Compact,
    /// GCC inline assembly block
    Assembly,
    /// Disassembly with addresses and opcode words
    Listing,
    /// Encoded program as Intel HEX
    IntelHex,
}

impl OutputMode {
    /// Look up a mode by its command-line name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "short" | "compact" => Some(OutputMode::Compact),
            "asm" | "assembly" => Some(OutputMode::Assembly),
            "listing" | "lst" => Some(OutputMode::Listing),
            "hex" | "ihex" => Some(OutputMode::IntelHex),
            _ => None,
        }
    }
}

/// How to present a solved plan. Built once from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub mode: OutputMode,
    /// First counter register; level `i` uses `register_base + i`.
    pub register_base: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig { mode: OutputMode::Assembly, register_base: DEFAULT_REGISTER_BASE }
    }
}

/// Render `params` as text in the configured mode.
///
/// Fails only when the register range cannot hold the loop counters; the
/// compact form does not use registers and always succeeds.
pub fn render(params: &LoopParameters, config: &RenderConfig) -> Result<String> {
    let text = match config.mode {
        OutputMode::Compact => compact(params),
        OutputMode::Assembly => inline_asm(&build(params, config.register_base)?, params.depth()),
        OutputMode::Listing => disassemble_program(&build(params, config.register_base)?).join("\n"),
        OutputMode::IntelHex => {
            let program = build(params, config.register_base)?;
            write_hex(&to_flash_bytes(&program)).trim_end().to_string()
        }
    };
    Ok(text)
}

fn compact(params: &LoopParameters) -> String {
    let values: Vec<String> = params
        .counters
        .iter()
        .map(|c| c.to_string())
        .chain(std::iter::once(params.filler.to_string()))
        .collect();
    format!("[{}]", values.join(", "))
}

/// The loop label sits on the first `DEC`, right after the `LDI` block.
fn inline_asm(program: &[Instruction], label_at: usize) -> String {
    let mut out = String::from("asm volatile (\n");
    for (i, &inst) in program.iter().enumerate() {
        let label = if i == label_at && matches!(inst, Instruction::Dec { .. }) {
            "L:"
        } else {
            ""
        };
        let text = match inst {
            Instruction::Ldi { d, k } => format!("ldi  r{}, {}", d, k),
            Instruction::Dec { d } => format!("dec  r{}\t", d),
            Instruction::Brbc { s: SREG_Z, .. } => "brne L\t\t".to_string(),
            Instruction::Nop => "nop\t\t\t".to_string(),
            other => unreachable!("not part of a delay loop: {:?}", other),
        };
        out.push_str(&format!("\t\"{}\t{}\t\\n\"\n", label, text));
    }
    out.push_str(");");
    out
}
