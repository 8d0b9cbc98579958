use core::fmt;

use serde::{Deserialize, Serialize};

/// One calibrated BME280 reading.
///
/// Field order is the wire order of the meteo frame: temperature (°C),
/// relative humidity (%RH), pressure (hPa).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurement {
    pub temperature: f32,
    pub humidity: f32,
    pub pressure: f32,
}

impl Measurement {
    pub const fn new(temperature: f32, humidity: f32, pressure: f32) -> Self {
        Self {
            temperature,
            humidity,
            pressure,
        }
    }
}

/// Console block printed by the periodic monitor for every measurement.
#[derive(Debug, Clone, Copy)]
pub struct Report {
    pub count: u32,
    pub measurement: Measurement,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-------------------------")?;
        writeln!(f, "measure     : {:07}", self.count)?;
        writeln!(f, "temperature : {:7.2} C", self.measurement.temperature)?;
        writeln!(f, "humidity    : {:7.2}", self.measurement.humidity)?;
        write!(f, "pressure    : {:7.2} hPa", self.measurement.pressure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_layout() {
        let report = Report {
            count: 1,
            measurement: Measurement::new(21.5, 45.12, 1013.25),
        };
        let expected = "-------------------------\n\
                        measure     : 0000001\n\
                        temperature :   21.50 C\n\
                        humidity    :   45.12\n\
                        pressure    : 1013.25 hPa";
        assert_eq!(report.to_string(), expected);
    }

    #[test]
    fn report_negative_temperature() {
        let report = Report {
            count: 1234567,
            measurement: Measurement::new(-7.25, 90.0, 987.5),
        };
        let text = report.to_string();
        assert!(text.contains("measure     : 1234567"));
        assert!(text.contains("temperature :   -7.25 C"));
    }
}
