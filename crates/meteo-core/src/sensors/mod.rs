mod bme280;
mod fixed;

use log::debug;
use thiserror_no_std::Error;

use crate::measurement::Measurement;

pub use bme280::Bme280Sensor;
pub use fixed::FixedSensor;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor}: {operation} failed ({details})")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
    #[error("{sensor}: initialization failed ({details})")]
    InitializationFailed {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("{sensor}: timed out during {operation}")]
    Timeout {
        sensor: &'static str,
        operation: &'static str,
    },
}

/// Kind of sensor behind a [`Sensor`], with its one-byte tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SensorKind {
    Bme280 = 0x50,
}

impl SensorKind {
    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bme280 => "BME280",
        }
    }
}

/// Trait for sensors that produce a calibrated [`Measurement`].
pub trait Sensor {
    fn kind(&self) -> SensorKind;

    /// Take one measurement.
    fn read(&mut self) -> impl Future<Output = Result<Measurement, SensorError>>;
}

pub fn log_sensor_info(kind: SensorKind) {
    debug!("sensor type = {} ({:#04x})", kind.name(), kind.tag());
    debug!(
        "sensor reading len = {}",
        core::mem::size_of::<Measurement>()
    );
}
