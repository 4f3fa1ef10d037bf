use crate::regs;

/// Oversampling settings for temperature, pressure and humidity.
///
/// Higher rates average more internal samples, which reduces noise but makes
/// every conversion take longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Oversampling {
    /// No measurement. The channel reads back a fixed placeholder value.
    Skipped = 0,
    X1 = 1,
    X2 = 2,
    X4 = 3,
    X8 = 4,
    /// Maximum precision, longest conversion.
    #[default]
    X16 = 5,
}

impl TryFrom<u8> for Oversampling {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Oversampling::Skipped),
            1 => Ok(Oversampling::X1),
            2 => Ok(Oversampling::X2),
            3 => Ok(Oversampling::X4),
            4 => Ok(Oversampling::X8),
            5 => Ok(Oversampling::X16),
            other => Err(other),
        }
    }
}

/// Grouped oversampling settings for the three channels.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OversamplingConfig {
    pub temp_osrs: Oversampling,
    pub hum_osrs: Oversampling,
    pub pres_osrs: Oversampling,
}

/// IIR filter coefficient.
///
/// Smooths short disturbances (slamming doors, drafts) in pressure and
/// temperature. Humidity is not filtered.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum IIRFilter {
    /// Filter off.
    IIR0 = 0,
    IIR1 = 1,
    IIR3 = 2,
    IIR7 = 3,
    #[default]
    IIR15 = 4,
    IIR31 = 5,
    IIR63 = 6,
    IIR127 = 7,
}

impl From<u8> for IIRFilter {
    /// Only the low three bits are used.
    fn from(value: u8) -> Self {
        match value & 0x07 {
            0 => IIRFilter::IIR0,
            1 => IIRFilter::IIR1,
            2 => IIRFilter::IIR3,
            3 => IIRFilter::IIR7,
            4 => IIRFilter::IIR15,
            5 => IIRFilter::IIR31,
            6 => IIRFilter::IIR63,
            _ => IIRFilter::IIR127,
        }
    }
}

/// Measurement configuration applied at the start of every cycle.
///
/// The default is IIR coefficient 15 with 16x oversampling on every channel.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub osrs_config: OversamplingConfig,
    pub iir_filter: IIRFilter,
}

impl Config {
    /// Value of the `config` register (0x75). Filter lives in bits 4:2.
    pub fn config_byte(&self) -> u8 {
        (self.iir_filter as u8) << 2
    }

    /// Value of the `ctrl_hum` register (0x72).
    pub fn ctrl_hum_byte(&self) -> u8 {
        self.osrs_config.hum_osrs as u8
    }

    /// Value of the `ctrl_meas` register (0x74), including the forced-mode bits
    /// that start a conversion.
    pub fn ctrl_meas_byte(&self) -> u8 {
        ((self.osrs_config.temp_osrs as u8) << 5)
            | ((self.osrs_config.pres_osrs as u8) << 2)
            | regs::MODE_FORCED
    }

    /// Replaces the filter from a raw `config` register value.
    ///
    /// Only bits 4:2 may be set.
    pub fn apply_config_byte(&mut self, value: u8) -> Result<(), InvalidRegisterValue> {
        if value & !regs::CONFIG_FILTER_MASK != 0 {
            return Err(InvalidRegisterValue::new(regs::ADDR_CONFIG, value));
        }
        self.iir_filter = IIRFilter::from(value >> 2);
        Ok(())
    }

    /// Replaces humidity oversampling from a raw `ctrl_hum` register value.
    pub fn apply_ctrl_hum_byte(&mut self, value: u8) -> Result<(), InvalidRegisterValue> {
        let err = InvalidRegisterValue::new(regs::ADDR_CTRL_HUM, value);
        if value & !regs::CTRL_HUM_OSRS_MASK != 0 {
            return Err(err);
        }
        self.osrs_config.hum_osrs = Oversampling::try_from(value).map_err(|_| err)?;
        Ok(())
    }

    /// Replaces temperature/pressure oversampling from a raw `ctrl_meas` value.
    ///
    /// The mode bits must select forced mode; any other mode never produces new data.
    pub fn apply_ctrl_meas_byte(&mut self, value: u8) -> Result<(), InvalidRegisterValue> {
        let err = InvalidRegisterValue::new(regs::ADDR_CTRL_MEAS, value);
        if value & regs::MODE_MASK != regs::MODE_FORCED {
            return Err(err);
        }
        let temp_osrs = Oversampling::try_from(value >> 5).map_err(|_| err)?;
        let pres_osrs = Oversampling::try_from((value >> 2) & 0x07).map_err(|_| err)?;

        self.osrs_config.temp_osrs = temp_osrs;
        self.osrs_config.pres_osrs = pres_osrs;
        Ok(())
    }
}

/// A raw register value that does not encode a valid setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidRegisterValue {
    pub register: u8,
    pub value: u8,
}

impl InvalidRegisterValue {
    fn new(register: u8, value: u8) -> Self {
        Self { register, value }
    }
}

/// Which control registers the chip revision exposes.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Variant {
    /// `ctrl_hum` is written between `config` and `ctrl_meas`.
    #[default]
    WithHumidityControl,
    /// Only `config` and `ctrl_meas` are written.
    WithoutHumidityControl,
}

/// How the driver waits for a conversion to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollPolicy {
    /// Sleep before every status read.
    pub interval_ms: u32,
    /// Give up after this many status reads. `None` waits forever.
    pub max_polls: Option<u32>,
}

impl PollPolicy {
    /// Poll every 10ms with no limit.
    pub const fn unbounded() -> Self {
        Self {
            interval_ms: 10,
            max_polls: None,
        }
    }

    /// Poll every 10ms, at most `max_polls` times.
    pub const fn bounded(max_polls: u32) -> Self {
        Self {
            interval_ms: 10,
            max_polls: Some(max_polls),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::bounded(500)
    }
}

/// Builder for [`Config`].
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temp_oversampling(mut self, os: Oversampling) -> Self {
        self.config.osrs_config.temp_osrs = os;
        self
    }

    pub fn hum_oversampling(mut self, os: Oversampling) -> Self {
        self.config.osrs_config.hum_osrs = os;
        self
    }

    pub fn pres_oversampling(mut self, os: Oversampling) -> Self {
        self.config.osrs_config.pres_osrs = os;
        self
    }

    pub fn iir_filter(mut self, filter: IIRFilter) -> Self {
        self.config.iir_filter = filter;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
