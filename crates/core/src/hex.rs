//! Intel HEX writer.
//!
//! Writes a flash image as `:LLAAAATT[DD...]CC` data records followed by an
//! EOF record. Images past 64 KiB get type 04 (extended linear address)
//! records ahead of each new 64 KiB segment.

/// Data bytes per record, as avr-objcopy emits.
const RECORD_LEN: usize = 16;

/// Render a flash image starting at address 0 as Intel HEX text.
pub fn write_hex(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut segment = 0u32;
    for (i, chunk) in bytes.chunks(RECORD_LEN).enumerate() {
        let addr = (i * RECORD_LEN) as u32;
        if addr >> 16 != segment {
            segment = addr >> 16;
            out.push_str(&record(0, 0x04, &(segment as u16).to_be_bytes()));
        }
        out.push_str(&record(addr as u16, 0x00, chunk));
    }
    out.push_str(&record(0, 0x01, &[]));
    out
}

fn record(addr: u16, record_type: u8, data: &[u8]) -> String {
    let mut raw = Vec::with_capacity(data.len() + 4);
    raw.push(data.len() as u8);
    raw.extend_from_slice(&addr.to_be_bytes());
    raw.push(record_type);
    raw.extend_from_slice(data);
    let sum = raw.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    let mut line = String::with_capacity(raw.len() * 2 + 4);
    line.push(':');
    for b in raw {
        line.push_str(&format!("{:02X}", b));
    }
    line.push_str(&format!("{:02X}\n", sum.wrapping_neg()));
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_short_program() {
        // LDI R16, 0xA6 / DEC R16 / BRNE .-4
        let hex = write_hex(&[0x06, 0xEA, 0x0A, 0x95, 0xF1, 0xF7]);
        assert_eq!(hex, ":0600000006EA0A95F1F783\n:00000001FF\n");
    }

    #[test]
    fn test_write_splits_records() {
        let hex = write_hex(&[0u8; 20]);
        let lines: Vec<&str> = hex.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(":10000000"));
        assert!(lines[1].starts_with(":04001000"));
        assert_eq!(lines[2], ":00000001FF");
    }

    #[test]
    fn test_write_extended_linear_address() {
        let hex = write_hex(&vec![0u8; 0x10000 + 2]);
        let lines: Vec<&str> = hex.lines().collect();
        assert_eq!(lines.len(), 0x1000 + 3);
        assert_eq!(lines[0x0FFF], ":10FFF0000000000000000000000000000000000001");
        assert_eq!(lines[0x1000], ":020000040001F9");
        assert_eq!(lines[0x1001], ":020000000000FE");
        assert_eq!(lines[0x1002], ":00000001FF");
    }

    #[test]
    fn test_write_empty() {
        assert_eq!(write_hex(&[]), ":00000001FF\n");
    }
}
