//! Compensation of raw ADC counts into physical units.
//!
//! Temperature always runs first: it produces a [`TempCompensation`], which is
//! the only way to obtain the fine temperature that pressure and humidity need.
//! The floating-point formulas keep the vendor's operand grouping exactly;
//! reordering them changes the rounding of the result.

use crate::calibration::CalibrationSet;
use crate::{Measurement, RawSample};

/// Temperature step result, carried into pressure and humidity of the same cycle.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TempCompensation {
    fine: f64,
    celsius: f64,
}

impl TempCompensation {
    /// Unit-less fine temperature.
    pub fn fine(&self) -> f64 {
        self.fine
    }

    pub fn celsius(&self) -> f64 {
        self.celsius
    }
}

pub fn temperature(calib: &CalibrationSet, temp_adc: u32) -> TempCompensation {
    let adc = f64::from(temp_adc);
    let t1 = f64::from(calib.par_t1);

    let var1 = (adc / 16384.0 - t1 / 1024.0) * f64::from(calib.par_t2);
    let var2 = (adc / 131072.0 - t1 / 8192.0)
        * (adc / 131072.0 - t1 / 8192.0)
        * f64::from(calib.par_t3)
        * 16.0;
    let fine = var1 + var2;

    TempCompensation {
        fine,
        celsius: fine / 5120.0,
    }
}

/// Pressure in Pascal.
pub fn pressure(calib: &CalibrationSet, temp: &TempCompensation, press_adc: u32) -> f64 {
    let p1 = f64::from(calib.par_p1);
    let p2 = f64::from(calib.par_p2);
    let p3 = f64::from(calib.par_p3);
    let p4 = f64::from(calib.par_p4);
    let p5 = f64::from(calib.par_p5);
    let p6 = f64::from(calib.par_p6);
    let p7 = f64::from(calib.par_p7);
    let p8 = f64::from(calib.par_p8);
    let p9 = f64::from(calib.par_p9);
    let p10 = f64::from(calib.par_p10);

    let mut var1 = temp.fine / 2.0 - 64000.0;
    let mut var2 = var1 * var1 * (p6 / 131072.0);
    var2 += var1 * p5 * 2.0;
    var2 = var2 / 4.0 + p4 * 65536.0;
    // 524188 is the vendor constant, not 2^19.
    var1 = (p3 * var1 * var1 / 16384.0 + p2 * var1) / 524188.0;
    var1 = (1.0 + var1 / 32768.0) * p1;

    let mut press = 1048576.0 - f64::from(press_adc);
    press = ((press - var2 / 4096.0) * 6250.0) / var1;

    let var1 = (p9 * press * press) / 2147483648.0;
    let var2 = press * (p8 / 32768.0);
    let var3 = (press / 256.0) * (press / 256.0) * (press / 256.0) * (p10 / 131072.0);

    press + (var1 + var2 + var3 + p7 * 128.0) / 16.0
}

/// Relative humidity in percent. Not clamped to 0..=100.
pub fn humidity(calib: &CalibrationSet, temp: &TempCompensation, hum_adc: u16) -> f64 {
    let temp_comp = temp.celsius;
    let h1 = f64::from(calib.par_h1);
    let h2 = f64::from(calib.par_h2);
    let h3 = f64::from(calib.par_h3);
    let h4 = f64::from(calib.par_h4);
    let h5 = f64::from(calib.par_h5);
    let h6 = f64::from(calib.par_h6);
    let h7 = f64::from(calib.par_h7);

    let var1 = f64::from(hum_adc) - (h1 * 16.0 + (h3 / 2.0) * temp_comp);
    let var2 = var1
        * (h2 / 262144.0)
        * (1.0 + (h4 / 16384.0) * temp_comp + (h5 / 1048576.0) * temp_comp * temp_comp);
    let var3 = h6 / 16384.0;
    let var4 = h7 / 2097152.0;

    var2 + (var3 + var4 * temp_comp) * var2 * var2
}

/// Compensates one raw sample: temperature, then pressure, then humidity.
pub fn compensate(calib: &CalibrationSet, raw: RawSample) -> Measurement {
    let temp = temperature(calib, raw.temp_adc);
    let pressure = pressure(calib, &temp, raw.press_adc);
    let humidity = humidity(calib, &temp, raw.hum_adc);

    Measurement {
        temperature: temp.celsius,
        pressure,
        humidity,
    }
}

/// Integer-only compensation from the vendor API, for targets without an FPU.
pub mod fixed {
    use crate::calibration::CalibrationSet;
    use crate::{FixedMeasurement, Humidity, Pressure, RawSample, Temperature};

    /// Intermediate temperature values required by pressure and humidity.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct CalcTempData {
        pub(crate) temp_fine: i32,
        /// Centi-degrees Celsius.
        pub(crate) temp_comp: i32,
    }

    impl CalcTempData {
        pub fn temp_fine(&self) -> i32 {
            self.temp_fine
        }

        pub fn temp_comp(&self) -> i32 {
            self.temp_comp
        }
    }

    pub fn temperature(calib: &CalibrationSet, temp_adc: u32) -> CalcTempData {
        let var1 = (i64::from(temp_adc) >> 3) - (i64::from(calib.par_t1) << 1);
        let var2 = (var1 * i64::from(calib.par_t2)) >> 11;
        let var3 = ((((var1 >> 1) * (var1 >> 1)) >> 12) * (i64::from(calib.par_t3) << 4)) >> 14;
        let temp_fine = var2 + var3;

        // A 20-bit ADC and 16-bit coefficients keep both results well inside i32.
        CalcTempData {
            temp_fine: temp_fine as i32,
            temp_comp: (((temp_fine * 5) + 128) >> 8) as i32,
        }
    }

    /// Pressure in Pascal. Returns 0 when the calibration would divide by zero.
    pub fn pressure(calib: &CalibrationSet, temp: &CalcTempData, press_adc: u32) -> u32 {
        let mut var1 = (i64::from(temp.temp_fine) >> 1) - 64_000;
        let mut var2 = ((((var1 >> 2) * (var1 >> 2)) >> 11) * i64::from(calib.par_p6)) >> 2;
        var2 += (var1 * i64::from(calib.par_p5)) << 1;
        var2 = (var2 >> 2) + (i64::from(calib.par_p4) << 16);
        var1 = (((((var1 >> 2) * (var1 >> 2)) >> 13) * (i64::from(calib.par_p3) << 5)) >> 3)
            + ((i64::from(calib.par_p2) * var1) >> 1);
        var1 >>= 18;
        var1 = ((32768 + var1) * i64::from(calib.par_p1)) >> 15;

        if var1 == 0 {
            return 0;
        }

        let mut press_comp = 1_048_576 - i64::from(press_adc);
        press_comp = (press_comp - (var2 >> 12)) * 3125;

        if press_comp >= (1 << 30) {
            press_comp = (press_comp / var1) << 1;
        } else {
            press_comp = (press_comp << 1) / var1;
        }

        let var1 = (i64::from(calib.par_p9) * (((press_comp >> 3) * (press_comp >> 3)) >> 13)) >> 12;
        let var2 = ((press_comp >> 2) * i64::from(calib.par_p8)) >> 13;
        let var3 = ((press_comp >> 8)
            * (press_comp >> 8)
            * (press_comp >> 8)
            * i64::from(calib.par_p10))
            >> 17;

        press_comp += (var1 + var2 + var3 + (i64::from(calib.par_p7) << 7)) >> 4;
        press_comp.clamp(0, i64::from(u32::MAX)) as u32
    }

    /// Relative humidity in milli-percent, clamped to 0..=100000.
    pub fn humidity(calib: &CalibrationSet, temp: &CalcTempData, hum_adc: u16) -> i32 {
        let temp_comp = i64::from(temp.temp_comp);
        let par_h3 = i64::from(calib.par_h3);
        let par_h4 = i64::from(calib.par_h4);
        let par_h5 = i64::from(calib.par_h5);
        let par_h7 = i64::from(calib.par_h7);

        let var1 = i64::from(hum_adc)
            - (i64::from(calib.par_h1) << 4)
            - (((temp_comp * par_h3) / 100) >> 1);
        let var2 = (i64::from(calib.par_h2)
            * (((temp_comp * par_h4) / 100)
                + (((temp_comp * ((temp_comp * par_h5) / 100)) >> 6) / 100)
                + (1 << 14)))
            >> 10;
        let var3 = var1 * var2;
        let var4 = ((i64::from(calib.par_h6) << 7) + ((temp_comp * par_h7) / 100)) >> 4;
        let var5 = ((var3 >> 14) * (var3 >> 14)) >> 10;
        let var6 = (var4 * var5) >> 1;

        let hum_comp = (((var3 + var6) >> 10) * 1000) >> 12;
        hum_comp.clamp(0, 100_000) as i32
    }

    pub fn compensate(calib: &CalibrationSet, raw: RawSample) -> FixedMeasurement {
        let temp = temperature(calib, raw.temp_adc);

        FixedMeasurement {
            temp: Temperature(temp.temp_comp),
            pres: Pressure(pressure(calib, &temp, raw.press_adc)),
            hum: Humidity(humidity(calib, &temp, raw.hum_adc)),
        }
    }
}
