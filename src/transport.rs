//! Register-addressed bus access.
//!
//! The driver only needs two primitives: read `N` bytes starting at a register,
//! and write one byte to a register. Every backend implements
//! [`RegisterTransport`]; the driver itself never touches the bus type.

use core::fmt::Debug;
use embedded_hal::i2c;

/// A channel to one device that supports register reads and writes.
pub trait RegisterTransport {
    /// Error reported by the underlying bus.
    type Error: Debug;

    /// Fills `buffer` with consecutive registers starting at `register`.
    fn read_registers(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Writes a single byte to `register`.
    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error>;
}

impl<T: RegisterTransport + ?Sized> RegisterTransport for &mut T {
    type Error = T::Error;

    fn read_registers(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read_registers(register, buffer)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        (**self).write_register(register, value)
    }
}

/// Adapter for any `embedded-hal` I2C bus.
#[derive(Debug)]
pub struct I2cTransport<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cTransport<I2C>
where
    I2C: i2c::I2c,
{
    /// # Arguments
    /// * `i2c` - The I2C bus object.
    /// * `address` - 7-bit device address (`0x76` or `0x77`).
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Gives the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> RegisterTransport for I2cTransport<I2C>
where
    I2C: i2c::I2c,
{
    type Error = I2C::Error;

    fn read_registers(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.address, &[register], buffer)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &[register, value])
    }
}
