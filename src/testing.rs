//! In-memory register map used by the unit tests.

use std::collections::VecDeque;
use std::vec::Vec;

use crate::regs;
use crate::transport::RegisterTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeBusError;

/// A 256-byte register file with a scripted status register.
#[derive(Debug)]
pub struct RegisterImage {
    mem: [u8; 256],
    status: VecDeque<u8>,
    pub writes: Vec<(u8, u8)>,
    pub status_reads: usize,
    fail_read: Option<u8>,
    fail_write: Option<u8>,
}

impl RegisterImage {
    pub fn new() -> Self {
        Self {
            mem: [0; 256],
            status: VecDeque::new(),
            writes: Vec::new(),
            status_reads: 0,
            fail_read: None,
            fail_write: None,
        }
    }

    pub fn set(&mut self, addr: u8, bytes: &[u8]) {
        let start = addr as usize;
        self.mem[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Status bytes returned by successive reads of `meas_status_0`.
    /// Once drained, the register file value is returned.
    pub fn script_status(&mut self, bytes: &[u8]) {
        self.status.extend(bytes.iter().copied());
    }

    pub fn fail_reads_at(&mut self, addr: u8) {
        self.fail_read = Some(addr);
    }

    pub fn fail_writes_at(&mut self, addr: u8) {
        self.fail_write = Some(addr);
    }
}

impl RegisterTransport for RegisterImage {
    type Error = FakeBusError;

    fn read_registers(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        if self.fail_read == Some(register) {
            return Err(FakeBusError);
        }
        if register == regs::ADDR_MEAS_STATUS {
            self.status_reads += 1;
            if let Some(status) = self.status.pop_front() {
                buffer[0] = status;
                return Ok(());
            }
        }
        let start = register as usize;
        buffer.copy_from_slice(&self.mem[start..start + buffer.len()]);
        Ok(())
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        if self.fail_write == Some(register) {
            return Err(FakeBusError);
        }
        self.writes.push((register, value));
        Ok(())
    }
}

/// Calibration and ADC contents with known compensated outputs.
///
/// Raw triplet: temperature 512345, pressure 415678, humidity 21000.
pub fn golden_image() -> RegisterImage {
    let mut image = RegisterImage::new();

    image.set(0x1D, &[0x80]);
    image.set(0x1F, &[0x65, 0x7B, 0xE0]);
    image.set(0x22, &[0x7D, 0x15, 0x90]);
    image.set(0x25, &[0x52, 0x08]);

    image.set(0x8A, &[0xAC, 0x66, 0x03]);
    image.set(0x8E, &[0x7D, 0x8E, 0x43, 0xD6, 0x58]);
    image.set(0x94, &[0x12, 0x1B, 0x83, 0xFF, 0x23, 0x1E]);
    image.set(0x9C, &[0x02, 0xF3, 0x74, 0xF5, 0x1E]);
    image.set(0xE1, &[0x3F, 0x32, 0x34, 0x00, 0x2D, 0x14, 0x78, 0x9C, 0x0F, 0x66]);

    image
}
