//! Linux host support: the `/dev/i2c-N` character device and a sleeping delay.

use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use rppal::i2c::{Error, I2c};

use crate::transport::RegisterTransport;
use crate::{Bme680, Uninitialized};

/// Register transport over the kernel I2C device file.
///
/// The slave address is bound when the device is opened. The file descriptor
/// is closed when this value is dropped.
#[derive(Debug)]
pub struct LinuxI2c {
    bus: I2c,
}

impl LinuxI2c {
    /// Opens the primary bus (`/dev/i2c-1` on a Raspberry Pi).
    pub fn open(address: u8) -> Result<Self, Error> {
        Self::from_bus(I2c::new()?, address)
    }

    /// Opens `/dev/i2c-{bus}`.
    pub fn with_bus(bus: u8, address: u8) -> Result<Self, Error> {
        Self::from_bus(I2c::with_bus(bus)?, address)
    }

    fn from_bus(mut bus: I2c, address: u8) -> Result<Self, Error> {
        bus.set_slave_address(u16::from(address))?;
        log::debug!("opened i2c bus {} at address {:#04x}", bus.bus(), address);
        Ok(Self { bus })
    }
}

impl RegisterTransport for LinuxI2c {
    type Error = Error;

    fn read_registers(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.bus.write_read(&[register], buffer)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.bus.write(&[register, value]).map(|_| ())
    }
}

impl Bme680<LinuxI2c, Uninitialized> {
    /// Opens `/dev/i2c-{bus}` and creates a driver on it.
    pub fn open_linux(bus: u8, address: u8) -> Result<Self, Error> {
        LinuxI2c::with_bus(bus, address).map(Self::new)
    }
}

/// Blocking delay backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
