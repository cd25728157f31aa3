/*!
 * Bit-field extraction and insertion for CAN payload buffers.
 *
 * Bit numbering is big-endian, byte-major, MSB-first: bit 0 is the most
 * significant bit of byte 0, bit 7 its least significant bit, bit 8 the
 * most significant bit of byte 1, and so on. A field may cross any number
 * of byte boundaries, up to the full 64-bit payload.
 */

/// Extract `num_bits` bits starting at `start_bit` as a right-aligned u64.
///
/// Walks the span byte by byte, masking the relevant bits out of each byte
/// and shifting them onto the accumulating result, so the final value reads
/// the bits in order from `start_bit` to `start_bit + num_bits - 1`.
///
/// A range reaching past the end of `buffer` is clamped to the buffer's bit
/// length; bits outside the buffer are never read. `num_bits == 0` returns 0.
pub fn get_bit_field(buffer: &[u8], start_bit: usize, num_bits: usize) -> u64 {
    let total_bits = buffer.len() * 8;
    if start_bit >= total_bits || num_bits == 0 {
        return 0;
    }
    // A u64 result also caps the field width at 64 bits.
    let mut remaining = num_bits.min(total_bits - start_bit).min(64);

    let mut result: u64 = 0;
    let mut byte_index = start_bit / 8;
    let mut bit_in_byte = start_bit % 8;

    while remaining > 0 {
        // Bits available from bit_in_byte down to the end of this byte.
        let available = 8 - bit_in_byte;
        let taken = remaining.min(available);
        let mask = ((1u16 << taken) - 1) as u8;
        let bits = (buffer[byte_index] >> (available - taken)) & mask;
        result = (result << taken) | bits as u64;

        remaining -= taken;
        byte_index += 1;
        bit_in_byte = 0;
    }
    result
}

/// Write the low `num_bits` bits of `value` into `buffer` at `start_bit`.
///
/// Exact inverse of `get_bit_field`: only the targeted bits change, so a
/// single signal can be packed into a multi-signal payload without touching
/// its siblings. Oversized values are truncated to `num_bits`. Ranges past
/// the end of the buffer are clamped the same way as on extraction.
pub fn set_bit_field(buffer: &mut [u8], start_bit: usize, num_bits: usize, value: u64) {
    let total_bits = buffer.len() * 8;
    if start_bit >= total_bits || num_bits == 0 {
        return;
    }
    let mut remaining = num_bits.min(total_bits - start_bit).min(64);

    let mut byte_index = start_bit / 8;
    let mut bit_in_byte = start_bit % 8;

    while remaining > 0 {
        let available = 8 - bit_in_byte;
        let taken = remaining.min(available);
        let mask = ((1u16 << taken) - 1) as u8;
        // The next `taken` bits of the value, counted from its high end
        // relative to the field width.
        let bits = (value >> (remaining - taken)) as u8 & mask;
        let shift = available - taken;
        buffer[byte_index] = (buffer[byte_index] & !(mask << shift)) | (bits << shift);

        remaining -= taken;
        byte_index += 1;
        bit_in_byte = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_byte() {
        // Golden values: 0xFA = 0b1111_1010.
        let data = [0xFAu8];
        assert_eq!(get_bit_field(&data, 0, 4), 0xF);
        assert_eq!(get_bit_field(&data, 4, 4), 0xA);
        assert_eq!(get_bit_field(&data, 0, 8), 0xFA);
    }

    #[test]
    fn test_mid_byte_span() {
        // 0xFA bits 2..6 = 0b1110
        let data = [0xFAu8];
        assert_eq!(get_bit_field(&data, 2, 4), 0b1110);
        assert_eq!(get_bit_field(&data, 7, 1), 0);
        assert_eq!(get_bit_field(&data, 6, 1), 1);
    }

    #[test]
    fn test_byte_boundary_crossing() {
        // 0x12 0x34 = 0b0001_0010 0b0011_0100
        // bits 4..12 = 0b0010_0011 = 0x23
        let data = [0x12u8, 0x34];
        assert_eq!(get_bit_field(&data, 4, 8), 0x23);
        // bits 6..16 spans parts of both bytes: 0b10_0011_0100 = 0x234
        assert_eq!(get_bit_field(&data, 6, 10), 0x234);
    }

    #[test]
    fn test_full_64_bit_payload() {
        let data = [0x11u8, 0x22, 0x33, 0x44, 0xFF, 0x66, 0x77, 0x88];
        assert_eq!(get_bit_field(&data, 0, 64), 0x11223344FF667788);

        let mut out = [0u8; 8];
        set_bit_field(&mut out, 0, 64, 0x11223344FF667788);
        assert_eq!(out, data);
    }

    #[test]
    fn test_zero_width_and_out_of_range() {
        let data = [0xFFu8; 8];
        assert_eq!(get_bit_field(&data, 0, 0), 0);
        // Clamped: only the 8 in-buffer bits of the request are read.
        assert_eq!(get_bit_field(&data, 56, 64), 0xFF);
        assert_eq!(get_bit_field(&data, 64, 8), 0);

        let mut buf = [0u8; 8];
        set_bit_field(&mut buf, 64, 8, 0xFF);
        assert_eq!(buf, [0u8; 8]);
    }

    #[test]
    fn test_set_preserves_sibling_bits() {
        // Write a 4-bit field at offset 0 of an all-ones byte:
        // only the top nibble may change.
        let mut data = [0xFFu8];
        set_bit_field(&mut data, 0, 4, 0x3);
        assert_eq!(data[0], 0x3F);

        let mut data = [0xFFu8; 8];
        set_bit_field(&mut data, 10, 6, 0);
        assert_eq!(data[0], 0xFF);
        assert_eq!(data[1], 0xC0); // bits 10..16 cleared
        assert_eq!(data[2], 0xFF);
    }

    #[test]
    fn test_set_then_get_returns_written_value() {
        let mut data = [0u8; 8];
        set_bit_field(&mut data, 13, 11, 0x5A5);
        assert_eq!(get_bit_field(&data, 13, 11), 0x5A5);

        // Truncation law: oversized values keep only the low num_bits.
        let mut data = [0u8; 8];
        set_bit_field(&mut data, 3, 5, 0xFFFF);
        assert_eq!(get_bit_field(&data, 3, 5), 0x1F);
        assert_eq!(get_bit_field(&data, 0, 3), 0);
        assert_eq!(get_bit_field(&data, 8, 8), 0);
    }

    #[test]
    fn test_get_set_roundtrip_is_idempotent() {
        let original = [0xA5u8, 0xB6, 0xD9, 0x00, 0x13, 0x37, 0xC0, 0xDE];
        for start in 0..64 {
            for width in 1..=(64 - start) {
                let mut buf = original;
                let value = get_bit_field(&buf, start, width);
                set_bit_field(&mut buf, start, width, value);
                assert_eq!(
                    buf, original,
                    "roundtrip changed buffer at start={start} width={width}"
                );
            }
        }
    }
}
