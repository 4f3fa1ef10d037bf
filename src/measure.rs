//! Forced-mode measurement cycle.
//!
//! `Idle -> Triggered -> Polling -> Ready -> Idle`. Triggering writes the
//! control registers with the mode bits last, polling waits for `new_data`
//! with `measuring` clear, and the raw ADC registers are then read and
//! compensated temperature first.

use embedded_hal::delay::DelayNs;

use crate::codec::{self, ByteOrder};
use crate::error::{Bme680Error, Result};
use crate::{calc, regs, Bme680, FixedMeasurement, Measurement, RawSample, Ready};
use crate::{RegisterTransport, Variant};

/// Position of the driver in the measurement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// No conversion in flight.
    Idle,
    /// Control registers written; the conversion has started.
    Triggered,
    /// Waiting for the status register to report completion.
    Polling,
    /// Conversion finished; raw data can be read.
    Ready,
}

/// Decoded `meas_status_0` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeasStatus {
    /// Bit 7.
    pub new_data: bool,
    /// Bit 5.
    pub measuring: bool,
}

impl MeasStatus {
    /// True once new data is available and no conversion is running.
    pub fn is_ready(&self) -> bool {
        self.new_data && !self.measuring
    }
}

impl From<u8> for MeasStatus {
    fn from(value: u8) -> Self {
        Self {
            new_data: value & regs::STATUS_NEW_DATA != 0,
            measuring: value & regs::STATUS_MEASURING != 0,
        }
    }
}

impl<T> Bme680<T, Ready>
where
    T: RegisterTransport,
{
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Triggers a measurement, waits for completion and returns compensated data.
    ///
    /// # Errors
    /// Bus failures and poll timeouts abort the cycle; the driver returns to
    /// `Idle` and no partial measurement is produced.
    pub fn measure(&mut self, delay: &mut impl DelayNs) -> Result<Measurement, T::Error> {
        let raw = self.run_cycle(delay)?;
        Ok(calc::compensate(&self.calib, raw))
    }

    /// Same cycle as [`measure`](Self::measure), compensated with integer arithmetic.
    pub fn measure_fixed(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<FixedMeasurement, T::Error> {
        let raw = self.run_cycle(delay)?;
        Ok(calc::fixed::compensate(&self.calib, raw))
    }

    fn run_cycle(&mut self, delay: &mut impl DelayNs) -> Result<RawSample, T::Error> {
        let result = self
            .trigger()
            .and_then(|_| self.poll_until_ready(delay))
            .and_then(|_| self.read_raw());

        if result.is_err() {
            self.set_phase(Phase::Idle);
        }
        result
    }

    /// Writes `config`, `ctrl_hum` (if the variant has it) and `ctrl_meas`,
    /// in that order. The mode bits in `ctrl_meas` start the conversion.
    pub fn trigger(&mut self) -> Result<(), T::Error> {
        self.write_reg(regs::ADDR_CONFIG, self.config.config_byte())?;

        if self.variant == Variant::WithHumidityControl {
            self.write_reg(regs::ADDR_CTRL_HUM, self.config.ctrl_hum_byte())?;
        }

        self.write_reg(regs::ADDR_CTRL_MEAS, self.config.ctrl_meas_byte())?;
        self.set_phase(Phase::Triggered);
        Ok(())
    }

    /// Sleeps and reads the status register until the conversion has finished.
    ///
    /// # Errors
    /// [`Bme680Error::Timeout`] once the poll policy's limit is reached.
    pub fn poll_until_ready(&mut self, delay: &mut impl DelayNs) -> Result<MeasStatus, T::Error> {
        self.set_phase(Phase::Polling);
        let mut polls: u32 = 0;

        loop {
            delay.delay_ms(self.poll.interval_ms);

            let status_byte = self.read_reg_byte(regs::ADDR_MEAS_STATUS)?;
            let status = MeasStatus::from(status_byte);
            polls = polls.saturating_add(1);
            log::trace!("meas_status_0 = {:#010b} (poll {})", status_byte, polls);

            if status.is_ready() {
                self.set_phase(Phase::Ready);
                return Ok(status);
            }

            if let Some(max_polls) = self.poll.max_polls {
                if polls >= max_polls {
                    log::warn!("measurement did not finish after {} polls", polls);
                    return Err(Bme680Error::Timeout { polls });
                }
            }
        }
    }

    /// Reads the raw temperature, pressure and humidity ADC registers.
    pub fn read_raw(&mut self) -> Result<RawSample, T::Error> {
        let temp_adc = self.read_adc20(regs::ADDR_TEMP_ADC)?;
        let press_adc = self.read_adc20(regs::ADDR_PRESS_ADC)?;

        let mut buffer = [0u8; 2];
        self.read_into(regs::ADDR_HUM_ADC, &mut buffer)?;
        let hum_adc = codec::decode(&buffer, ByteOrder::Big, false) as u16;

        self.set_phase(Phase::Idle);
        Ok(RawSample {
            temp_adc,
            press_adc,
            hum_adc,
        })
    }

    /// 20-bit value left-aligned in three big-endian registers.
    fn read_adc20(&mut self, reg_address: u8) -> Result<u32, T::Error> {
        let mut buffer = [0u8; 3];
        self.read_into(reg_address, &mut buffer)?;
        Ok((codec::decode(&buffer, ByteOrder::Big, false) as u32) >> 4)
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            log::trace!("phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    fn read_into(&mut self, reg_address: u8, buffer: &mut [u8]) -> Result<(), T::Error> {
        self.transport
            .read_registers(reg_address, buffer)
            .map_err(Bme680Error::Transport)
    }

    fn read_reg_byte(&mut self, reg_address: u8) -> Result<u8, T::Error> {
        let mut buffer = [0];
        self.read_into(reg_address, &mut buffer)?;
        Ok(buffer[0])
    }

    fn write_reg(&mut self, reg_address: u8, value: u8) -> Result<(), T::Error> {
        self.transport
            .write_register(reg_address, value)
            .map_err(Bme680Error::Transport)
    }
}
