//! Periodic measurement printer behind the `bme280_sensor` program.

use log::error;

use crate::measurement::Report;
use crate::sensors::{Sensor, SensorError};

pub struct Monitor<S> {
    sensor: S,
    count: u32,
}

impl<S: Sensor> Monitor<S> {
    pub const fn new(sensor: S) -> Self {
        Self { sensor, count: 0 }
    }

    /// Number of successful measurements so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn sensor(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Take one measurement. Failed reads do not advance the counter.
    pub async fn tick(&mut self) -> Result<Report, SensorError> {
        let measurement = self.sensor.read().await.map_err(|e| {
            error!("failed to read data: {}", e);
            e
        })?;
        self.count = self.count.wrapping_add(1);
        Ok(Report {
            count: self.count,
            measurement,
        })
    }
}
