use super::{Sensor, SensorError, SensorKind};
use crate::measurement::Measurement;

/// Sensor that always reports the same values.
///
/// Stands in for the BME280 on boards where nothing is wired to the bus.
pub struct FixedSensor {
    measurement: Measurement,
}

impl FixedSensor {
    pub const fn new(measurement: Measurement) -> Self {
        Self { measurement }
    }

    /// The canned reading sent by the demo node.
    pub const fn demo() -> Self {
        Self::new(Measurement::new(19.73, 13.89, 1013.25))
    }
}

impl Sensor for FixedSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Bme280
    }

    async fn read(&mut self) -> Result<Measurement, SensorError> {
        Ok(self.measurement)
    }
}
