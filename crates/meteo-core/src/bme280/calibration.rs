//! Factory trimming parameters and the datasheet compensation formulas.
//!
//! The integer formulas follow section 4.2.3 of the BME280 datasheet. The
//! intermediates are widened to `i64` so out-of-range ADC values saturate
//! through the final clamp instead of overflowing; for every input the
//! datasheet formulas can represent, the results are bit-identical.

use super::registers::{CALIB_BANK1_LEN, CALIB_BANK2_LEN, RAW_DATA_LEN};
use crate::measurement::Measurement;

/// ADC value of a temperature or pressure channel whose oversampling is skipped.
const SKIPPED_20BIT: u32 = 0x8_0000;
/// ADC value of a skipped humidity channel.
const SKIPPED_16BIT: u32 = 0x8000;

/// Upper clamp of the humidity accumulator: 100 %RH in Q22.10 shifted by 12.
const HUMIDITY_MAX: i64 = 419_430_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibrationData {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
    pub dig_h1: u8,
    pub dig_h2: i16,
    pub dig_h3: u8,
    pub dig_h4: i16,
    pub dig_h5: i16,
    pub dig_h6: i8,
}

/// Uncompensated ADC counts from one burst read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawData {
    pub temperature: u32,
    pub pressure: u32,
    pub humidity: u32,
}

impl RawData {
    /// Decode the 0xF7..=0xFE burst.
    pub fn from_bytes(bytes: &[u8; RAW_DATA_LEN]) -> Self {
        let adc20 = |msb: u8, lsb: u8, xlsb: u8| {
            ((msb as u32) << 12) | ((lsb as u32) << 4) | ((xlsb as u32) >> 4)
        };
        Self {
            pressure: adc20(bytes[0], bytes[1], bytes[2]),
            temperature: adc20(bytes[3], bytes[4], bytes[5]),
            humidity: ((bytes[6] as u32) << 8) | bytes[7] as u32,
        }
    }
}

fn u16_le(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn i16_le(bytes: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([bytes[at], bytes[at + 1]])
}

impl CalibrationData {
    /// Parse the two calibration banks (0x88..=0xA1 and 0xE1..=0xE7).
    pub fn parse(bank1: &[u8; CALIB_BANK1_LEN], bank2: &[u8; CALIB_BANK2_LEN]) -> Self {
        // dig_H4 and dig_H5 share the nibbles of 0xE5, with signed high bytes.
        let dig_h4 = ((bank2[3] as i8 as i16) << 4) | (bank2[4] & 0x0F) as i16;
        let dig_h5 = ((bank2[5] as i8 as i16) << 4) | (bank2[4] >> 4) as i16;

        Self {
            dig_t1: u16_le(bank1, 0),
            dig_t2: i16_le(bank1, 2),
            dig_t3: i16_le(bank1, 4),
            dig_p1: u16_le(bank1, 6),
            dig_p2: i16_le(bank1, 8),
            dig_p3: i16_le(bank1, 10),
            dig_p4: i16_le(bank1, 12),
            dig_p5: i16_le(bank1, 14),
            dig_p6: i16_le(bank1, 16),
            dig_p7: i16_le(bank1, 18),
            dig_p8: i16_le(bank1, 20),
            dig_p9: i16_le(bank1, 22),
            // 0xA0 is reserved
            dig_h1: bank1[25],
            dig_h2: i16_le(bank2, 0),
            dig_h3: bank2[2],
            dig_h4,
            dig_h5,
            dig_h6: bank2[6] as i8,
        }
    }

    /// Temperature in 0.01 °C, plus the `t_fine` carry used by the other channels.
    pub fn compensate_temperature(&self, adc_t: u32) -> (i32, i32) {
        let adc_t = adc_t as i64;
        let t1 = self.dig_t1 as i64;
        let t2 = self.dig_t2 as i64;
        let t3 = self.dig_t3 as i64;

        let var1 = (((adc_t >> 3) - (t1 << 1)) * t2) >> 11;
        let var2 = (((((adc_t >> 4) - t1) * ((adc_t >> 4) - t1)) >> 12) * t3) >> 14;
        let t_fine = var1 + var2;
        let centi_celsius = (t_fine * 5 + 128) >> 8;

        (centi_celsius as i32, t_fine as i32)
    }

    /// Pressure in Pa as unsigned Q24.8 (`25767233` is 100653.25 Pa).
    pub fn compensate_pressure(&self, adc_p: u32, t_fine: i32) -> u32 {
        let mut var1 = t_fine as i64 - 128_000;
        let mut var2 = var1 * var1 * self.dig_p6 as i64;
        var2 += (var1 * self.dig_p5 as i64) << 17;
        var2 += (self.dig_p4 as i64) << 35;
        var1 = ((var1 * var1 * self.dig_p3 as i64) >> 8) + ((var1 * self.dig_p2 as i64) << 12);
        var1 = (((1_i64 << 47) + var1) * self.dig_p1 as i64) >> 33;
        if var1 == 0 {
            // dig_P1 of zero, never seen on a healthy part
            return 0;
        }

        let mut p = 1_048_576 - adc_p as i64;
        p = (((p << 31) - var2) * 3125) / var1;
        var1 = (self.dig_p9 as i64 * (p >> 13) * (p >> 13)) >> 25;
        var2 = (self.dig_p8 as i64 * p) >> 19;
        p = ((p + var1 + var2) >> 8) + ((self.dig_p7 as i64) << 4);

        p as u32
    }

    /// Relative humidity in %RH as unsigned Q22.10 (`47445` is 46.333 %RH).
    pub fn compensate_humidity(&self, adc_h: u32, t_fine: i32) -> u32 {
        let adc_h = adc_h as i64;
        let h1 = self.dig_h1 as i64;
        let h2 = self.dig_h2 as i64;
        let h3 = self.dig_h3 as i64;
        let h4 = self.dig_h4 as i64;
        let h5 = self.dig_h5 as i64;
        let h6 = self.dig_h6 as i64;

        let mut v = t_fine as i64 - 76_800;
        v = ((((adc_h << 14) - (h4 << 20) - (h5 * v)) + 16_384) >> 15)
            * (((((((v * h6) >> 10) * (((v * h3) >> 11) + 32_768)) >> 10) + 2_097_152) * h2
                + 8_192)
                >> 14);
        v -= ((((v >> 15) * (v >> 15)) >> 7) * h1) >> 4;
        v = v.clamp(0, HUMIDITY_MAX);

        (v >> 12) as u32
    }

    /// Compensate all three channels into physical units.
    ///
    /// A channel that was skipped by its oversampling setting reads back the
    /// reset pattern and is reported as `NaN`.
    pub fn compensate(&self, raw: &RawData) -> Measurement {
        let (centi_celsius, t_fine) = self.compensate_temperature(raw.temperature);

        if raw.temperature == SKIPPED_20BIT {
            // Pressure and humidity need t_fine, so nothing is usable.
            return Measurement::new(f32::NAN, f32::NAN, f32::NAN);
        }

        let pressure = if raw.pressure == SKIPPED_20BIT {
            f32::NAN
        } else {
            // Q24.8 Pa -> hPa
            self.compensate_pressure(raw.pressure, t_fine) as f32 / 256.0 / 100.0
        };

        let humidity = if raw.humidity == SKIPPED_16BIT {
            f32::NAN
        } else {
            self.compensate_humidity(raw.humidity, t_fine) as f32 / 1024.0
        };

        Measurement::new(centi_celsius as f32 / 100.0, humidity, pressure)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // Reference trimming values published with the Bosch driver, bank 1 as it
    // sits in the register file (0x88..=0xA1).
    pub(crate) const BANK1: [u8; CALIB_BANK1_LEN] = [
        0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC, 0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, 0x27, 0x0B,
        0x8C, 0x00, 0xF9, 0xFF, 0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17, 0x00, 0x4B,
    ];
    // H2 = 362, H3 = 0, H4 = 313, H5 = 50, H6 = 30
    pub(crate) const BANK2: [u8; CALIB_BANK2_LEN] = [0x6A, 0x01, 0x00, 0x13, 0x29, 0x03, 0x1E];

    // adc_P = 415148, adc_T = 519888, adc_H = 30000
    pub(crate) const RAW: [u8; RAW_DATA_LEN] = [0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00, 0x75, 0x30];

    fn calibration() -> CalibrationData {
        CalibrationData::parse(&BANK1, &BANK2)
    }

    #[test]
    fn parse_banks() {
        let cal = calibration();
        assert_eq!(cal.dig_t1, 27504);
        assert_eq!(cal.dig_t2, 26435);
        assert_eq!(cal.dig_t3, -1000);
        assert_eq!(cal.dig_p1, 36477);
        assert_eq!(cal.dig_p2, -10685);
        assert_eq!(cal.dig_p3, 3024);
        assert_eq!(cal.dig_p4, 2855);
        assert_eq!(cal.dig_p5, 140);
        assert_eq!(cal.dig_p6, -7);
        assert_eq!(cal.dig_p7, 15500);
        assert_eq!(cal.dig_p8, -14600);
        assert_eq!(cal.dig_p9, 6000);
        assert_eq!(cal.dig_h1, 75);
        assert_eq!(cal.dig_h2, 362);
        assert_eq!(cal.dig_h3, 0);
        assert_eq!(cal.dig_h4, 313);
        assert_eq!(cal.dig_h5, 50);
        assert_eq!(cal.dig_h6, 30);
    }

    #[test]
    fn parse_negative_h4_h5() {
        // H4 = -3 -> 0xFF_D, H5 = -2 -> 0xFF_E, H6 = -5
        let bank2 = [0x00, 0x00, 0x00, 0xFF, 0xED, 0xFF, 0xFB];
        let cal = CalibrationData::parse(&BANK1, &bank2);
        assert_eq!(cal.dig_h4, -3);
        assert_eq!(cal.dig_h5, -2);
        assert_eq!(cal.dig_h6, -5);
    }

    #[test]
    fn raw_data_layout() {
        let raw = RawData::from_bytes(&RAW);
        assert_eq!(raw.pressure, 415_148);
        assert_eq!(raw.temperature, 519_888);
        assert_eq!(raw.humidity, 30_000);
    }

    #[test]
    fn temperature_reference_point() {
        let (centi, t_fine) = calibration().compensate_temperature(519_888);
        assert_eq!(centi, 2508);
        assert_eq!(t_fine, 128_422);
    }

    #[test]
    fn pressure_reference_point() {
        let p = calibration().compensate_pressure(415_148, 128_422);
        assert_eq!(p, 25_767_233);
    }

    #[test]
    fn pressure_with_zero_p1_does_not_divide() {
        let cal = CalibrationData {
            dig_p1: 0,
            ..calibration()
        };
        assert_eq!(cal.compensate_pressure(415_148, 128_422), 0);
    }

    #[test]
    fn humidity_reference_point() {
        assert_eq!(calibration().compensate_humidity(30_000, 128_422), 56_317);
    }

    #[test]
    fn humidity_is_clamped() {
        let cal = calibration();
        assert_eq!(cal.compensate_humidity(0, 128_422), 0);
        assert_eq!(cal.compensate_humidity(65_535, 128_422), 100 * 1024);
    }

    #[test]
    fn compensate_to_physical_units() {
        let m = calibration().compensate(&RawData::from_bytes(&RAW));
        assert!((m.temperature - 25.08).abs() < 0.001);
        assert!((m.pressure - 1006.5325).abs() < 0.01);
        assert!((m.humidity - 54.997).abs() < 0.01);
    }

    #[test]
    fn skipped_channels_are_nan() {
        let cal = calibration();

        let no_humidity = RawData {
            humidity: SKIPPED_16BIT,
            ..RawData::from_bytes(&RAW)
        };
        let m = cal.compensate(&no_humidity);
        assert!(m.humidity.is_nan());
        assert!(!m.pressure.is_nan());

        let nothing = RawData {
            temperature: SKIPPED_20BIT,
            pressure: SKIPPED_20BIT,
            humidity: SKIPPED_16BIT,
        };
        let m = cal.compensate(&nothing);
        assert!(m.temperature.is_nan());
        assert!(m.pressure.is_nan());
        assert!(m.humidity.is_nan());
    }
}
