//! Plan files: persist a solved delay and render it again later.
//!
//! Uses bincode serialization with deflate compression. Loading re-checks
//! the parameters against the stored target, so a hand-edited or damaged
//! file is rejected rather than rendered.
//!
//! ## File format
//!
//! ```text
//! +------------------+
//! | Magic "ADLP"     |  4 bytes
//! +------------------+
//! | Format version   |  u32 little-endian (currently 1)
//! +------------------+
//! | Compressed data  |  deflate-compressed bincode payload
//! +------------------+
//! ```

use std::path::Path;

use crate::error::{Error, Result};
use crate::verify::check;
use crate::DelayPlan;

/// Magic bytes identifying a delay plan file.
const MAGIC: &[u8; 4] = b"ADLP";
/// Current plan file format version.
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;

/// Serialize a plan into the on-disk byte layout.
pub fn encode(plan: &DelayPlan) -> Result<Vec<u8>> {
    let payload = bincode::serialize(plan)
        .map_err(|e| Error::PlanFormat(format!("serialize error: {}", e)))?;

    let compressed = miniz_oxide::deflate::compress_to_vec(&payload, 6);

    let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&compressed);
    Ok(out)
}

/// Parse and validate plan file bytes.
pub fn decode(data: &[u8]) -> Result<DelayPlan> {
    if data.len() < HEADER_LEN {
        return Err(Error::PlanFormat("file too small".into()));
    }
    if &data[0..4] != MAGIC {
        return Err(Error::PlanFormat("not a delay plan (bad magic)".into()));
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != FORMAT_VERSION {
        return Err(Error::PlanFormat(format!(
            "unsupported format version {} (expected {})",
            version, FORMAT_VERSION
        )));
    }

    let decompressed = miniz_oxide::inflate::decompress_to_vec(&data[HEADER_LEN..])
        .map_err(|e| Error::PlanFormat(format!("decompress error: {:?}", e)))?;

    let plan: DelayPlan = bincode::deserialize(&decompressed)
        .map_err(|e| Error::PlanFormat(format!("deserialize error: {}", e)))?;

    check(&plan.parameters, plan.cycles)?;
    Ok(plan)
}

/// Write a plan to `path`.
pub fn save_to_file(plan: &DelayPlan, path: &Path) -> Result<()> {
    let bytes = encode(plan)?;
    std::fs::write(path, bytes)?;
    log::debug!("saved plan for {} cycles to {}", plan.cycles, path.display());
    Ok(())
}

/// Read and validate a plan from `path`.
pub fn load_from_file(path: &Path) -> Result<DelayPlan> {
    let data = std::fs::read(path)?;
    let plan = decode(&data)?;
    log::debug!("loaded plan for {} cycles from {}", plan.cycles, path.display());
    Ok(plan)
}
