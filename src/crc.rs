/// Reflected form of the CRC-8 polynomial x^8 + x^5 + x^4 + 1 (0x31).
const CRC8_POLY_REFLECTED: u8 = 0x8C;
/// CRC-16 polynomial x^16 + x^15 + x^2 + 1.
const CRC16_POLY: u16 = 0x8005;
/// Final XOR of the CRC-16, the device sends the complemented remainder.
const CRC16_XOR_OUT: u16 = 0xFFFF;

/// Reverse the order of the low `width` bits of `value`.
///
/// Bits above `width` are dropped, `width` is clamped to 16.
pub const fn reflect_bits(value: u16, width: u32) -> u16 {
    let width = if width > 16 { 16 } else { width };
    let mut reflected = 0;
    let mut bit = 0;

    while bit < width {
        if value & (1 << bit) != 0 {
            reflected |= 1 << (width - 1 - bit);
        }
        bit += 1;
    }

    reflected
}

/// One byte step of the Maxim CRC-8.
pub const fn crc8_maxim_update(mut crc: u8, mut byte: u8) -> u8 {
    let mut bit = 0;
    while bit < 8 {
        let mix = (crc ^ byte) & 0x01;
        crc >>= 1;
        if mix != 0 {
            crc ^= CRC8_POLY_REFLECTED;
        }
        byte >>= 1;
        bit += 1;
    }
    crc
}

/// Maxim/Dallas CRC-8 calculation (1-Wire ROM addresses).
pub const fn crc8_maxim(data: &[u8]) -> u8 {
    let mut crc = 0;
    let mut i = 0;
    while i < data.len() {
        crc = crc8_maxim_update(crc, data[i]);
        i += 1;
    }
    crc
}

/// One byte step of the Maxim CRC-16.
///
/// Works on the raw remainder, use [`crc16_maxim_finish`] to get the value sent on the wire.
pub const fn crc16_maxim_update(mut acc: u16, byte: u8) -> u16 {
    acc ^= reflect_bits(byte as u16, 8) << 8;

    let mut bit = 0;
    while bit < 8 {
        if acc & 0x8000 != 0 {
            acc = (acc << 1) ^ CRC16_POLY;
        } else {
            acc <<= 1;
        }
        bit += 1;
    }
    acc
}

/// Turn a raw CRC-16 remainder into the checksum.
pub const fn crc16_maxim_finish(acc: u16) -> u16 {
    reflect_bits(acc, 16) ^ CRC16_XOR_OUT
}

/// Maxim/Dallas CRC-16 calculation (1-Wire memory commands and pages).
pub const fn crc16_maxim(data: &[u8]) -> u16 {
    let mut acc = 0;
    let mut i = 0;
    while i < data.len() {
        acc = crc16_maxim_update(acc, data[i]);
        i += 1;
    }
    crc16_maxim_finish(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    /// Plain polynomial long division over the reflected byte.
    fn crc8_long_division(byte: u8) -> u8 {
        let mut rem = reflect_bits(u16::from(byte), 8) << 8;
        for i in (8..16).rev() {
            if rem & (1 << i) != 0 {
                rem ^= 0x131 << (i - 8);
            }
        }
        reflect_bits(rem, 8) as u8
    }

    #[test]
    fn crc8_empty_is_init() {
        assert_eq!(crc8_maxim(&[]), 0x00);
    }

    #[test_case(&[0x01], 0x5E; "one")]
    #[test_case(&[0x80], 0x8C; "high_bit")]
    #[test_case(&[0xFF], 0x35; "all_ones")]
    #[test_case(b"123456789", 0xA1; "check")]
    #[test_case(&[0x3A, 0x12, 0x34, 0x56, 0x78, 0x9A, 0x00], 0x0E; "ds2413_rom")]
    fn crc8_vectors(data: &[u8], expect: u8) {
        assert_eq!(crc8_maxim(data), expect);
    }

    #[test]
    fn crc8_is_deterministic() {
        let data = [0x28, 0xFF, 0x4C, 0x3B, 0x91, 0x16, 0x04];
        assert_eq!(crc8_maxim(&data), crc8_maxim(&data));
    }

    #[test]
    fn crc8_single_byte_table() {
        for byte in 0..=u8::MAX {
            assert_eq!(crc8_maxim(&[byte]), crc8_long_division(byte), "byte {:#04x}", byte);
        }
    }

    #[test]
    fn crc8_over_data_and_crc_is_zero() {
        let mut rom = [0x28, 0xFF, 0x4C, 0x3B, 0x91, 0x16, 0x04, 0x00];
        rom[7] = crc8_maxim(&rom[..7]);
        assert_eq!(crc8_maxim(&rom), 0);
    }

    #[test]
    fn crc8_detects_single_bit_errors() {
        let rom = [0x3A, 0x12, 0x34, 0x56, 0x78, 0x9A, 0x00, 0x0E];
        assert_eq!(crc8_maxim(&rom[..7]), rom[7]);

        for (byte, bit) in [(0, 0), (0, 7), (1, 3), (2, 5), (3, 1), (4, 6), (5, 2), (6, 0), (6, 7)] {
            let mut mutated = rom;
            mutated[byte] ^= 1 << bit;
            assert_ne!(crc8_maxim(&mutated[..7]), rom[7], "byte {} bit {}", byte, bit);
        }
    }

    #[test_case(0x01, 8, 0x80)]
    #[test_case(0x0F, 8, 0xF0)]
    #[test_case(0x0001, 16, 0x8000)]
    #[test_case(0x1234, 16, 0x2C48)]
    #[test_case(0xFF01, 8, 0x80; "drops_high_bits")]
    #[test_case(0x0003, 0, 0x0000; "zero_width")]
    fn reflect_vectors(value: u16, width: u32, expect: u16) {
        assert_eq!(reflect_bits(value, width), expect);
    }

    #[test]
    fn reflect_is_involution() {
        for x in 0..=u16::from(u8::MAX) {
            assert_eq!(reflect_bits(reflect_bits(x, 8), 8), x);
        }
        for x in (0..=u16::MAX).step_by(7) {
            assert_eq!(reflect_bits(reflect_bits(x, 16), 16), x);
        }
        assert_eq!(reflect_bits(reflect_bits(u16::MAX, 16), 16), u16::MAX);
    }

    #[test]
    fn crc16_empty() {
        assert_eq!(crc16_maxim(&[]), reflect_bits(0, 16) ^ 0xFFFF);
        assert_eq!(crc16_maxim(&[]), 0xFFFF);
    }

    #[test_case(&[0x69, 0x00], 0xAFD1; "read_memory_page_0")]
    #[test_case(&[0x96, 0x00], 0x5F90; "write_memory_page_0")]
    #[test_case(&[0x96, 0x01], 0x9F51; "write_memory_page_1")]
    #[test_case(b"123456789", 0x44C2; "check")]
    #[test_case(&[0x00; 32], 0xFFFF; "zero_page")]
    fn crc16_vectors(data: &[u8], expect: u16) {
        assert_eq!(crc16_maxim(data), expect);
    }

    #[test]
    fn crc16_command_byte_flip_invalidates() {
        let command = [0x96, 0x00];
        let crc = crc16_maxim(&command);

        for index in 0..command.len() {
            let mut flipped = command;
            flipped[index] = !flipped[index];
            assert_ne!(crc16_maxim(&flipped), crc, "index {}", index);
        }
    }

    #[test]
    fn crc16_incremental_matches_slice() {
        let data: [u8; 32] = core::array::from_fn(|i| (i as u8).wrapping_mul(7).wrapping_add(3));
        let acc = data.iter().fold(0, |acc, &byte| crc16_maxim_update(acc, byte));
        assert_eq!(crc16_maxim_finish(acc), crc16_maxim(&data));
        assert_eq!(crc16_maxim(&data), 0x89D3);
    }

    #[test]
    fn crc16_over_data_and_crc_is_residue() {
        let mut frame = [0x69, 0x00, 0x00, 0x00];
        let crc = crc16_maxim(&frame[..2]);
        frame[2..].copy_from_slice(&crc.to_le_bytes());
        assert_eq!(crc16_maxim(&frame), 0x4FFE);
    }
}
