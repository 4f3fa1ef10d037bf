//! Byte-level decoding of register contents.
//!
//! Calibration fields are stored as plain byte runs whose signedness is only
//! documented in the datasheet, so signed values are rebuilt by hand: the run
//! is normalized to little-endian, and if the top bit is set every byte is
//! inverted, decoded as unsigned and mapped to `-value - 1`.

/// Byte order of a multi-byte register field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteOrder {
    Little,
    Big,
}

/// Layout of an integer field inside the register map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldFormat {
    /// Number of bytes, 1 to 3.
    pub len: usize,
    pub order: ByteOrder,
    pub signed: bool,
}

impl FieldFormat {
    pub const fn unsigned(len: usize, order: ByteOrder) -> Self {
        Self {
            len,
            order,
            signed: false,
        }
    }

    pub const fn signed(len: usize, order: ByteOrder) -> Self {
        Self {
            len,
            order,
            signed: true,
        }
    }
}

/// Widest integer field in the register map.
pub const MAX_FIELD_LEN: usize = 3;

/// Copies `bytes` into a little-endian scratch buffer.
fn normalize(bytes: &[u8], order: ByteOrder) -> [u8; MAX_FIELD_LEN] {
    let mut le = [0u8; MAX_FIELD_LEN];
    let len = bytes.len();

    for (i, byte) in bytes.iter().enumerate() {
        match order {
            ByteOrder::Little => le[i] = *byte,
            ByteOrder::Big => le[len - 1 - i] = *byte,
        }
    }

    le
}

fn from_le(le: &[u8]) -> i32 {
    le.iter()
        .rev()
        .fold(0i32, |acc, byte| (acc << 8) | i32::from(*byte))
}

/// Decodes `bytes` as an integer of the given order and signedness.
///
/// Bytes past [`MAX_FIELD_LEN`] are ignored, so every result fits an `i32`.
pub fn decode(bytes: &[u8], order: ByteOrder, signed: bool) -> i32 {
    let bytes = &bytes[..bytes.len().min(MAX_FIELD_LEN)];
    let len = bytes.len();
    let mut le = normalize(bytes, order);

    if !signed || len == 0 || le[len - 1] & 0x80 == 0 {
        return from_le(&le[..len]);
    }

    for byte in le[..len].iter_mut() {
        *byte = !*byte;
    }

    -from_le(&le[..len]) - 1
}

/// Decodes `bytes` according to a field layout.
pub fn decode_field(bytes: &[u8], format: FieldFormat) -> i32 {
    decode(&bytes[..format.len], format.order, format.signed)
}

/// Writes the low `out.len()` bytes of `value` in the given order.
///
/// Bytes above the width of a `u32` are written as zero.
pub fn encode_unsigned(value: u32, order: ByteOrder, out: &mut [u8]) {
    let len = out.len();

    for (i, slot) in out.iter_mut().enumerate() {
        let shift = match order {
            ByteOrder::Little => i,
            ByteOrder::Big => len - 1 - i,
        };
        *slot = u32::try_from(8 * shift)
            .ok()
            .and_then(|bits| value.checked_shr(bits))
            .map_or(0, |shifted| shifted as u8);
    }
}

/// Configuration registers are single bytes written verbatim.
pub const fn encode_byte(value: u8) -> [u8; 1] {
    [value]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_little_and_big_endian() {
        assert_eq!(decode(&[0x0F, 0x66], ByteOrder::Little, false), 0x660F);
        assert_eq!(decode(&[0x0F, 0x66], ByteOrder::Big, false), 0x0F66);
        assert_eq!(decode(&[0x7D, 0x15, 0x90], ByteOrder::Big, false), 0x7D1590);
    }

    #[test]
    fn unsigned_encode_decode() {
        for &(value, len) in &[(0u32, 1usize), (0xFF, 1), (0x1234, 2), (0xFFFF, 2), (0xABCDEF, 3)] {
            for order in [ByteOrder::Little, ByteOrder::Big] {
                let mut buf = [0u8; 3];
                encode_unsigned(value, order, &mut buf[..len]);
                assert_eq!(decode(&buf[..len], order, false) as u32, value);
            }
        }
    }

    #[test]
    fn signed_positive_matches_unsigned() {
        assert_eq!(decode(&[0x7F], ByteOrder::Little, true), 0x7F);
        assert_eq!(decode(&[0xFF, 0x7F], ByteOrder::Little, true), 0x7FFF);
        assert_eq!(decode(&[0x7F, 0xFF], ByteOrder::Big, true), 0x7FFF);
        assert_eq!(
            decode(&[0xFF, 0x7F], ByteOrder::Little, true),
            decode(&[0xFF, 0x7F], ByteOrder::Little, false)
        );
    }

    #[test]
    fn signed_minimum_in_either_order() {
        assert_eq!(decode(&[0x80], ByteOrder::Little, true), -128);
        assert_eq!(decode(&[0x80], ByteOrder::Big, true), -128);
        assert_eq!(decode(&[0x00, 0x80], ByteOrder::Little, true), -32768);
        assert_eq!(decode(&[0x80, 0x00], ByteOrder::Big, true), -32768);
    }

    #[test]
    fn signed_matches_twos_complement() {
        assert_eq!(decode(&[0xFF], ByteOrder::Little, true), -1);
        assert_eq!(decode(&[0x9C], ByteOrder::Little, true), -100);
        assert_eq!(decode(&[0x43, 0xD6], ByteOrder::Little, true), -10685);
        assert_eq!(decode(&[0xD6, 0x43], ByteOrder::Big, true), -10685);
        assert_eq!(decode(&[0xFF, 0xFF, 0xFF], ByteOrder::Big, true), -1);
        assert_eq!(decode(&[0x00, 0x00, 0x80], ByteOrder::Little, true), -(1 << 23));
    }

    #[test]
    fn field_format_uses_declared_length() {
        let bytes = [0x83, 0xFF, 0x55];
        assert_eq!(decode_field(&bytes, FieldFormat::signed(2, ByteOrder::Little)), -125);
        assert_eq!(decode_field(&bytes, FieldFormat::unsigned(1, ByteOrder::Little)), 0x83);
    }

    #[test]
    fn decode_ignores_bytes_past_widest_field() {
        assert_eq!(decode(&[0xFF; 4], ByteOrder::Little, false), 0xFF_FFFF);
        assert_eq!(decode(&[0x01, 0x02, 0x03, 0x04], ByteOrder::Big, false), 0x01_0203);
        assert_eq!(decode(&[0x00, 0x00, 0x80, 0x7F], ByteOrder::Little, true), -(1 << 23));
    }

    #[test]
    fn encode_pads_wide_outputs_with_zero() {
        let mut buf = [0xAAu8; 6];
        encode_unsigned(0xAABB_CCDD, ByteOrder::Little, &mut buf);
        assert_eq!(buf, [0xDD, 0xCC, 0xBB, 0xAA, 0x00, 0x00]);

        encode_unsigned(0xAABB_CCDD, ByteOrder::Big, &mut buf);
        assert_eq!(buf, [0x00, 0x00, 0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn config_bytes_pass_through() {
        assert_eq!(encode_byte(0b101_101_01), [0xB5]);
    }
}
