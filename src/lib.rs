#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! # BME680 Temperature / Pressure / Humidity Driver
//!
//! A type-safe, `no_std` driver for the environmental channels of the Bosch
//! BME680. The gas heater is not supported.
//! This driver uses the typestate pattern to ensure calibration data has been
//! loaded before measurements are taken.
//!
//! ## Features
//! - **Pluggable transports**: any `embedded-hal` I2C bus via [`I2cTransport`],
//!   or the Linux `/dev/i2c-N` device via `linux::LinuxI2c` (feature `linux`).
//! - **Reference arithmetic**: double-precision compensation with the vendor's
//!   exact operand order, plus the integer-only path for targets without an FPU.
//! - **Bounded polling**: the wait for a finished conversion is limited by a
//!   [`PollPolicy`] unless explicitly disabled.
//!
//! ## Units
//! - **Temperature**: degrees Celsius (`f64`), or centi-degrees in [`Temperature`]
//! - **Pressure**: Pascal (divide by 100 for hPa)
//! - **Humidity**: percent relative humidity, or milli-percent in [`Humidity`]
//!
//! ## Example
//! ```no_run
//! # fn demo<I2C: embedded_hal::i2c::I2c, D: embedded_hal::delay::DelayNs>(i2c: I2C, mut delay: D) {
//! use bme680_tph::{Bme680, DEFAULT_ADDRESS};
//!
//! let mut sensor = Bme680::new_i2c(i2c, DEFAULT_ADDRESS).init().unwrap();
//! let m = sensor.measure(&mut delay).unwrap();
//! let _ = (m.temperature, m.pressure_hpa(), m.humidity);
//! # }
//! ```

pub mod calc;
pub mod calibration;
pub mod codec;
#[cfg(feature = "linux")]
pub mod linux;
mod measure;
pub mod settings;
pub mod transport;

#[cfg(test)]
mod testing;

use core::marker::PhantomData;
use embedded_hal::i2c;

pub use calibration::CalibrationSet;
pub use measure::{MeasStatus, Phase};
pub use settings::{
    Config, ConfigBuilder, IIRFilter, Oversampling, OversamplingConfig, PollPolicy, Variant,
};
pub use transport::{I2cTransport, RegisterTransport};

/// I2C address with SDO pulled high.
pub const DEFAULT_ADDRESS: u8 = 0x77;

/// Register addresses and bit layouts.
pub(crate) mod regs {
    pub const ADDR_MEAS_STATUS: u8 = 0x1D;
    pub const ADDR_PRESS_ADC: u8 = 0x1F;
    pub const ADDR_TEMP_ADC: u8 = 0x22;
    pub const ADDR_HUM_ADC: u8 = 0x25;
    pub const ADDR_CTRL_HUM: u8 = 0x72;
    pub const ADDR_CTRL_MEAS: u8 = 0x74;
    pub const ADDR_CONFIG: u8 = 0x75;

    pub const STATUS_NEW_DATA: u8 = 0b1000_0000;
    pub const STATUS_MEASURING: u8 = 0b0010_0000;

    pub const CONFIG_FILTER_MASK: u8 = 0b0001_1100;
    pub const CTRL_HUM_OSRS_MASK: u8 = 0b0000_0111;
    pub const MODE_MASK: u8 = 0b0000_0011;
    pub const MODE_FORCED: u8 = 0b01;
}

// --- Typestates ---

/// Driver has been created but calibration data has not been read.
#[derive(Debug)]
pub struct Uninitialized;
/// Calibration is loaded; measurements may be taken.
#[derive(Debug)]
pub struct Ready;

/// Error types for the driver.
pub mod error {
    use core::fmt::Debug;

    /// Errors that can occur during communication or configuration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Bme680Error<E>
    where
        E: Debug,
    {
        /// The bus transport failed to open, read or write.
        #[error("bus transport error: {0:?}")]
        Transport(E),
        /// `new_data` never rose with `measuring` clear within the poll limit.
        #[error("measurement not finished after {polls} status reads")]
        Timeout { polls: u32 },
        /// A raw configuration byte does not encode a valid setting.
        #[error("invalid value {value:#04x} for register {register:#04x}")]
        InvalidConfig { register: u8, value: u8 },
    }

    impl<E: Debug> From<crate::settings::InvalidRegisterValue> for Bme680Error<E> {
        fn from(err: crate::settings::InvalidRegisterValue) -> Self {
            Bme680Error::InvalidConfig {
                register: err.register,
                value: err.value,
            }
        }
    }

    /// Result type alias for driver operations.
    pub type Result<T, E> = core::result::Result<T, Bme680Error<E>>;
}

/// Raw ADC counts read after a conversion.
///
/// Temperature and pressure are 20-bit, humidity is 16-bit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub temp_adc: u32,
    pub press_adc: u32,
    pub hum_adc: u16,
}

/// Compensated measurement in physical units.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Pascal.
    pub pressure: f64,
    /// Percent relative humidity.
    pub humidity: f64,
}

impl Measurement {
    pub fn pressure_hpa(&self) -> f64 {
        self.pressure / 100.0
    }
}

/// Represents temperature in Centigrade (degrees Celsius * 100).
///
/// # Example
/// A value of `2350` represents **23.50 °C**.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature(pub i32);

impl Temperature {
    /// Splits the fixed-point value into integral (degrees) and fractional (decimals) parts.
    ///
    /// ```rust
    /// use bme680_tph::Temperature;
    /// let temp = Temperature(2350);
    /// assert_eq!(temp.split(), (23, 50));
    /// ```
    pub fn split(&self) -> (i32, i32) {
        (self.0 / 100, self.0 % 100)
    }
}

/// Represents relative humidity in milli-percent (percent * 1000).
///
/// # Example
/// A value of `45123` represents **45.123 %rH**.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Humidity(pub i32);

impl Humidity {
    /// Splits the fixed-point value into integral and fractional parts.
    /// The fraction represents 3 decimal places.
    ///
    /// ```rust
    /// use bme680_tph::Humidity;
    /// let hum = Humidity(45123);
    /// assert_eq!(hum.split(), (45, 123));
    /// ```
    pub fn split(&self) -> (i32, i32) {
        (self.0 / 1000, self.0 % 1000)
    }
}

/// Represents atmospheric pressure in Pascal (Pa).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pressure(pub u32);

impl Pressure {
    /// Converts to hectopascal and splits it into parts.
    ///
    /// ```rust
    /// use bme680_tph::Pressure;
    /// let press = Pressure(101325);
    /// assert_eq!(press.as_hpa(), (1013, 25));
    /// ```
    pub fn as_hpa(&self) -> (u32, u32) {
        (self.0 / 100, self.0 % 100)
    }
}

/// Result of the integer compensation path.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixedMeasurement {
    pub temp: Temperature,
    pub pres: Pressure,
    pub hum: Humidity,
}

/// The main driver structure.
///
/// Use `Bme680::new(...)` or `Bme680::new_i2c(...)` to start. The `STATE`
/// generic tracks whether calibration has been loaded.
///
/// Not reentrant: one measurement at a time per instance. Share an instance
/// between threads only behind a mutex.
#[derive(Debug)]
pub struct Bme680<T, STATE> {
    transport: T,
    calib: CalibrationSet,
    config: Config,
    variant: Variant,
    poll: PollPolicy,
    phase: Phase,
    _state: PhantomData<STATE>,
}

impl<T> Bme680<T, Uninitialized>
where
    T: RegisterTransport,
{
    /// Creates a driver over an already opened transport.
    ///
    /// This does not communicate with the sensor yet.
    pub fn new(transport: T) -> Self {
        Bme680 {
            transport,
            calib: CalibrationSet::default(),
            config: Config::default(),
            variant: Variant::default(),
            poll: PollPolicy::default(),
            phase: Phase::Idle,
            _state: PhantomData,
        }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Loads the factory calibration. This transitions the driver to `Ready`.
    ///
    /// # Errors
    /// Returns an error if any calibration read fails. The transport is
    /// dropped with the driver, which closes it.
    pub fn init(mut self) -> error::Result<Bme680<T, Ready>, T::Error> {
        let calib = CalibrationSet::load(&mut self.transport)?;

        Ok(Bme680 {
            transport: self.transport,
            calib,
            config: self.config,
            variant: self.variant,
            poll: self.poll,
            phase: Phase::Idle,
            _state: PhantomData,
        })
    }
}

impl<I2C> Bme680<I2cTransport<I2C>, Uninitialized>
where
    I2C: i2c::I2c,
{
    /// Creates a driver on an `embedded-hal` I2C bus.
    ///
    /// # Arguments
    /// * `i2c` - The I2C bus object.
    /// * `address` - The I2C address of the sensor (`0x76` or [`DEFAULT_ADDRESS`]).
    pub fn new_i2c(i2c: I2C, address: u8) -> Self {
        Self::new(I2cTransport::new(i2c, address))
    }
}

impl<T, STATE> Bme680<T, STATE>
where
    T: RegisterTransport,
{
    /// Current configuration, applied at the start of the next measurement.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        log::debug!("config set: {:?}", config);
        self.config = config;
    }

    /// Sets the `config` register value (IIR filter) verbatim.
    ///
    /// # Errors
    /// [`error::Bme680Error::InvalidConfig`] if bits outside the filter field are set.
    pub fn set_config_byte(&mut self, value: u8) -> error::Result<(), T::Error> {
        self.config.apply_config_byte(value)?;
        log::debug!("config register set to {:#04x}", value);
        Ok(())
    }

    /// Sets the `ctrl_hum` register value (humidity oversampling) verbatim.
    pub fn set_ctrl_hum_byte(&mut self, value: u8) -> error::Result<(), T::Error> {
        self.config.apply_ctrl_hum_byte(value)?;
        log::debug!("ctrl_hum register set to {:#04x}", value);
        Ok(())
    }

    /// Sets the `ctrl_meas` register value (temperature/pressure oversampling
    /// and mode) verbatim. The mode bits must be `01`.
    pub fn set_ctrl_meas_byte(&mut self, value: u8) -> error::Result<(), T::Error> {
        self.config.apply_ctrl_meas_byte(value)?;
        log::debug!("ctrl_meas register set to {:#04x}", value);
        Ok(())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    pub fn set_poll_policy(&mut self, poll: PollPolicy) {
        self.poll = poll;
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Gives the transport back.
    pub fn release(self) -> T {
        self.transport
    }
}

impl<T> Bme680<T, Ready>
where
    T: RegisterTransport,
{
    /// Calibration coefficients read during `init`.
    pub fn calibration(&self) -> &CalibrationSet {
        &self.calib
    }
}
