//! CRC-32C (Castagnoli) checksum engine.
//!
//! Output is bit-exact with the SSE4.2 `crc32` instruction family: reflected
//! polynomial `0x82F63B78` (normal form `0x1EDC6F41`), register seeded with
//! `0xFFFF_FFFF`, bytes consumed least-significant first and the final register
//! complemented. On x86_64 CPUs with SSE4.2 the hardware instruction is used;
//! everywhere else a slicing-by-8 table implementation computes the same value.

/// A 32-bit checksum over a byte sequence.
pub type ChecksumValue = u32;

/// CRC-32C polynomial in reflected (LSB-first) form.
const POLY_REFLECTED: u32 = 0x82F6_3B78;

/// Reflected CRC-32C slicing-by-8 lookup tables.
///
/// Table 0 is the classic byte-at-a-time table; table `t` advances a byte
/// through `t` additional zero bytes, which lets the main loop fold 8 input
/// bytes per iteration.
const CRC_TABLES: [[u32; 256]; 8] = {
    let mut tables = [[0u32; 256]; 8];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY_REFLECTED;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        tables[0][i as usize] = crc;
        i += 1;
    }
    let mut t = 1;
    while t < 8 {
        let mut i = 0;
        while i < 256 {
            let prev = tables[t - 1][i];
            tables[t][i] = (prev >> 8) ^ tables[0][(prev & 0xFF) as usize];
            i += 1;
        }
        t += 1;
    }
    tables
};

/// Seam for checksum computation so callers can substitute or instrument it.
pub trait ChecksumEngine {
    /// Computes the checksum of `data`.
    fn checksum(&self, data: &[u8]) -> ChecksumValue;
}

/// The production engine: hardware CRC-32C when available, tables otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32c;

impl ChecksumEngine for Crc32c {
    fn checksum(&self, data: &[u8]) -> ChecksumValue {
        checksum(data)
    }
}

/// Computes the CRC-32C of `data` using the fastest available path.
#[must_use]
pub fn checksum(data: &[u8]) -> ChecksumValue {
    checksum_hardware(data).unwrap_or_else(|| checksum_software(data))
}

/// Computes the CRC-32C of `data` with the slicing-by-8 tables.
#[must_use]
pub fn checksum_software(data: &[u8]) -> ChecksumValue {
    !update_software(0xFFFF_FFFF, data)
}

/// Advances a raw (non-complemented) CRC register over `data`.
fn update_software(mut crc: u32, data: &[u8]) -> u32 {
    let chunks = data.chunks_exact(8);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let one = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) ^ crc;
        let two = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
        crc = CRC_TABLES[7][(one & 0xFF) as usize]
            ^ CRC_TABLES[6][((one >> 8) & 0xFF) as usize]
            ^ CRC_TABLES[5][((one >> 16) & 0xFF) as usize]
            ^ CRC_TABLES[4][(one >> 24) as usize]
            ^ CRC_TABLES[3][(two & 0xFF) as usize]
            ^ CRC_TABLES[2][((two >> 8) & 0xFF) as usize]
            ^ CRC_TABLES[1][((two >> 16) & 0xFF) as usize]
            ^ CRC_TABLES[0][(two >> 24) as usize];
    }

    for &byte in remainder {
        crc = CRC_TABLES[0][((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8);
    }

    crc
}

/// Computes the CRC-32C of `data` with the SSE4.2 instruction.
///
/// Returns `None` when the running CPU (or target) has no hardware CRC-32C.
#[must_use]
pub fn checksum_hardware(data: &[u8]) -> Option<ChecksumValue> {
    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("sse4.2") {
            // SAFETY: the required CPU feature was detected at runtime.
            return Some(unsafe { sse42::crc32c(data) });
        }
    }
    let _ = data;
    None
}

#[cfg(target_arch = "x86_64")]
mod sse42 {
    use std::arch::x86_64::{_mm_crc32_u8, _mm_crc32_u64};

    /// Four chained 8-byte steps per 32-byte block, then single bytes.
    #[target_feature(enable = "sse4.2")]
    #[allow(unused_unsafe)]
    pub(super) unsafe fn crc32c(data: &[u8]) -> u32 {
        let mut crc: u64 = 0xFFFF_FFFF;

        let blocks = data.chunks_exact(32);
        let tail = blocks.remainder();
        for block in blocks {
            for word in block.chunks_exact(8) {
                let mut lane = [0u8; 8];
                lane.copy_from_slice(word);
                crc = unsafe { _mm_crc32_u64(crc, u64::from_le_bytes(lane)) };
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let mut crc = crc as u32;
        for &byte in tail {
            crc = unsafe { _mm_crc32_u8(crc, byte) };
        }

        !crc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_zero() {
        assert_eq!(checksum(b""), 0);
        assert_eq!(checksum_software(b""), 0);
    }

    #[test]
    fn test_check_value() {
        assert_eq!(checksum_software(b"123456789"), 0xE306_9283);
        assert_eq!(checksum(b"123456789"), 0xE306_9283);
    }

    #[test]
    fn test_iscsi_vectors() {
        // RFC 3720 appendix B.4
        assert_eq!(checksum_software(&[0u8; 32]), 0x8A91_36AA);
        assert_eq!(checksum_software(&[0xFFu8; 32]), 0x62A8_AB43);

        let ascending: Vec<u8> = (0u8..32).collect();
        assert_eq!(checksum_software(&ascending), 0x46DD_794E);

        let descending: Vec<u8> = (0u8..32).rev().collect();
        assert_eq!(checksum_software(&descending), 0x5CDB_3F11);
    }

    #[test]
    fn test_hardware_matches_software_across_block_boundaries() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i * 7 + 3) as u8).collect();
        if checksum_hardware(b"").is_none() {
            return;
        }
        for len in [0, 1, 7, 8, 9, 31, 32, 33, 63, 64, 65, 999, 1000] {
            assert_eq!(
                checksum_hardware(&data[..len]),
                Some(checksum_software(&data[..len])),
                "length {len}"
            );
        }
    }

    #[test]
    fn test_unaligned_input() {
        let data: Vec<u8> = (0..100u8).collect();
        for offset in 0..8 {
            assert_eq!(checksum(&data[offset..]), checksum_software(&data[offset..]));
        }
    }

    #[test]
    fn test_engine_trait_uses_same_algorithm() {
        assert_eq!(Crc32c.checksum(b"123456789"), 0xE306_9283);
    }
}
