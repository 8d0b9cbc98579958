use super::registers::{Filter, Mode, Oversampling, Standby};

/// Measurement settings written to the control registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    pub mode: Mode,
    pub filter: Filter,
    pub standby: Standby,
    pub temperature: Oversampling,
    pub pressure: Oversampling,
    pub humidity: Oversampling,
}

impl Default for Params {
    /// Weather monitoring profile: one forced conversion per request, no
    /// oversampling, no filtering.
    fn default() -> Self {
        Self {
            mode: Mode::Forced,
            filter: Filter::Off,
            standby: Standby::Ms1000,
            temperature: Oversampling::X1,
            pressure: Oversampling::X1,
            humidity: Oversampling::X1,
        }
    }
}

impl Params {
    /// Value of the `config` register (0xF5). Bit 0 (3-wire SPI) stays clear.
    pub const fn config(&self) -> u8 {
        ((self.standby as u8) << 5) | ((self.filter as u8) << 2)
    }

    /// Value of the `ctrl_meas` register (0xF4) for the given mode.
    pub const fn ctrl_meas(&self, mode: Mode) -> u8 {
        ((self.temperature as u8) << 5) | ((self.pressure as u8) << 2) | mode as u8
    }

    /// Value of the `ctrl_hum` register (0xF2).
    pub const fn ctrl_hum(&self) -> u8 {
        self.humidity as u8
    }

    /// Worst-case duration of one conversion, in microseconds (datasheet 9.1).
    pub const fn measurement_time_us(&self) -> u32 {
        let mut t = 1250 + 2300 * self.temperature.factor();
        if self.pressure.factor() > 0 {
            t += 2300 * self.pressure.factor() + 575;
        }
        if self.humidity.factor() > 0 {
            t += 2300 * self.humidity.factor() + 575;
        }
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_packing() {
        let params = Params {
            mode: Mode::Normal,
            filter: Filter::X4,
            standby: Standby::Ms500,
            temperature: Oversampling::X4,
            pressure: Oversampling::X4,
            humidity: Oversampling::X4,
        };
        assert_eq!(params.config(), 0b100_010_00);
        assert_eq!(params.ctrl_meas(Mode::Normal), 0b011_011_11);
        assert_eq!(params.ctrl_meas(Mode::Sleep), 0b011_011_00);
        assert_eq!(params.ctrl_hum(), 0b011);
    }

    #[test]
    fn default_profile() {
        let params = Params::default();
        assert_eq!(params.mode, Mode::Forced);
        assert_eq!(params.ctrl_meas(Mode::Forced), 0b001_001_01);
        assert_eq!(params.ctrl_hum(), 0b001);
        assert_eq!(params.config(), 0b101_000_00);
    }

    #[test]
    fn measurement_time() {
        assert_eq!(Params::default().measurement_time_us(), 9300);

        let temperature_only = Params {
            pressure: Oversampling::Skipped,
            humidity: Oversampling::Skipped,
            ..Params::default()
        };
        assert_eq!(temperature_only.measurement_time_us(), 3550);

        let max = Params {
            temperature: Oversampling::X16,
            pressure: Oversampling::X16,
            humidity: Oversampling::X16,
            ..Params::default()
        };
        assert_eq!(max.measurement_time_us(), 112_800);
    }
}
