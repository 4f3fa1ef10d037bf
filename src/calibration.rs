//! Factory calibration coefficients.
//!
//! Each coefficient is read with its own register access instead of one burst
//! read, mirroring the per-field layout table below.

use crate::codec::{self, ByteOrder, FieldFormat};
use crate::error::{Bme680Error, Result};
use crate::transport::RegisterTransport;

/// Factory-fused calibration coefficients read from the sensor.
///
/// Unique to every chip. Loaded once when the driver is initialized and never
/// modified afterwards.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationSet {
    pub par_t1: u16,
    pub par_t2: i16,
    pub par_t3: i8,
    pub par_p1: u16,
    pub par_p2: i16,
    pub par_p3: i8,
    pub par_p4: i16,
    pub par_p5: i16,
    pub par_p6: i8,
    pub par_p7: i8,
    pub par_p8: i16,
    pub par_p9: i16,
    pub par_p10: u8,
    pub par_h1: u16,
    pub par_h2: u16,
    pub par_h3: i8,
    pub par_h4: i8,
    pub par_h5: i8,
    pub par_h6: u8,
    pub par_h7: i8,
}

/// Location and layout of one coefficient.
#[derive(Debug, Clone, Copy)]
struct Field {
    addr: u8,
    format: FieldFormat,
    /// Right shift applied after the raw load.
    shift: u32,
}

const fn le(addr: u8, len: usize, signed: bool) -> Field {
    let format = if signed {
        FieldFormat::signed(len, ByteOrder::Little)
    } else {
        FieldFormat::unsigned(len, ByteOrder::Little)
    };
    Field {
        addr,
        format,
        shift: 0,
    }
}

/// H1 and H2 occupy the upper 12 bits of a 16-bit register pair.
const fn upper12(addr: u8, order: ByteOrder) -> Field {
    Field {
        addr,
        format: FieldFormat::unsigned(2, order),
        shift: 4,
    }
}

// Order: T1-T3, P1-P10, H1-H7.
const FIELDS: [Field; 20] = [
    le(0xE9, 2, false),
    le(0x8A, 2, true),
    le(0x8C, 1, true),
    le(0x8E, 2, false),
    le(0x90, 2, true),
    le(0x92, 1, true),
    le(0x94, 2, true),
    le(0x96, 2, true),
    le(0x99, 1, true),
    le(0x98, 1, true),
    le(0x9C, 2, true),
    le(0x9E, 2, true),
    le(0xA0, 1, false),
    upper12(0xE2, ByteOrder::Little),
    upper12(0xE1, ByteOrder::Big),
    le(0xE4, 1, true),
    le(0xE5, 1, true),
    le(0xE6, 1, true),
    le(0xE7, 1, false),
    le(0xE8, 1, true),
];

fn read_field<T: RegisterTransport>(
    transport: &mut T,
    field: &Field,
) -> Result<i32, T::Error> {
    let mut buffer = [0u8; 3];
    let bytes = &mut buffer[..field.format.len];

    transport
        .read_registers(field.addr, bytes)
        .map_err(Bme680Error::Transport)?;

    Ok(codec::decode_field(bytes, field.format) >> field.shift)
}

impl CalibrationSet {
    /// Reads all twenty coefficients from the device.
    ///
    /// # Errors
    /// Any failed bus read aborts the load; no partially filled set is returned.
    pub fn load<T: RegisterTransport>(transport: &mut T) -> Result<Self, T::Error> {
        let mut v = [0i32; FIELDS.len()];
        for (slot, field) in v.iter_mut().zip(FIELDS.iter()) {
            *slot = read_field(transport, field)?;
        }

        // Every decoded value fits its field width by construction.
        let calib = CalibrationSet {
            par_t1: v[0] as u16,
            par_t2: v[1] as i16,
            par_t3: v[2] as i8,
            par_p1: v[3] as u16,
            par_p2: v[4] as i16,
            par_p3: v[5] as i8,
            par_p4: v[6] as i16,
            par_p5: v[7] as i16,
            par_p6: v[8] as i8,
            par_p7: v[9] as i8,
            par_p8: v[10] as i16,
            par_p9: v[11] as i16,
            par_p10: v[12] as u8,
            par_h1: v[13] as u16,
            par_h2: v[14] as u16,
            par_h3: v[15] as i8,
            par_h4: v[16] as i8,
            par_h5: v[17] as i8,
            par_h6: v[18] as u8,
            par_h7: v[19] as i8,
        };

        log::debug!("calibration loaded: {:?}", calib);
        Ok(calib)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::testing::{golden_image, RegisterImage};

    pub(crate) fn golden_calibration() -> CalibrationSet {
        CalibrationSet {
            par_t1: 26127,
            par_t2: 26284,
            par_t3: 3,
            par_p1: 36477,
            par_p2: -10685,
            par_p3: 88,
            par_p4: 6930,
            par_p5: -125,
            par_p6: 30,
            par_p7: 35,
            par_p8: -3326,
            par_p9: -2700,
            par_p10: 30,
            par_h1: 835,
            par_h2: 1011,
            par_h3: 0,
            par_h4: 45,
            par_h5: 20,
            par_h6: 120,
            par_h7: -100,
        }
    }

    #[test]
    fn loads_every_field_from_the_register_map() {
        let mut bus = golden_image();
        let calib = CalibrationSet::load(&mut bus).unwrap();
        assert_eq!(calib, golden_calibration());
    }

    #[test]
    fn load_is_idempotent() {
        let mut bus = golden_image();
        let first = CalibrationSet::load(&mut bus).unwrap();
        let second = CalibrationSet::load(&mut bus).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn humidity_shift_happens_after_the_16_bit_load() {
        let mut bus = RegisterImage::new();
        bus.set(0xE1, &[0x3F, 0x32, 0x34]);

        let calib = CalibrationSet::load(&mut bus).unwrap();
        // 0x3432 >> 4, not (0x32 >> 4) | (0x34 << 8).
        assert_eq!(calib.par_h1, 0x343);
        // 0x3F32 >> 4, big-endian.
        assert_eq!(calib.par_h2, 0x3F3);
    }

    #[test]
    fn signed_fields_are_sign_extended() {
        let mut bus = RegisterImage::new();
        bus.set(0x8A, &[0x00, 0x80]);
        bus.set(0x8C, &[0xFF]);
        bus.set(0xA0, &[0xFF]);
        bus.set(0xE7, &[0xFF, 0x80]);

        let calib = CalibrationSet::load(&mut bus).unwrap();
        assert_eq!(calib.par_t2, i16::MIN);
        assert_eq!(calib.par_t3, -1);
        assert_eq!(calib.par_p10, 255);
        assert_eq!(calib.par_h6, 255);
        assert_eq!(calib.par_h7, i8::MIN);
    }

    #[test]
    fn bus_failure_aborts_the_load() {
        let mut bus = golden_image();
        bus.fail_reads_at(0x9C);

        let err = CalibrationSet::load(&mut bus).unwrap_err();
        assert!(matches!(err, Bme680Error::Transport(_)));
    }
}
