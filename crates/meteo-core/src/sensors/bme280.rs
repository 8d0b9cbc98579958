use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::{error, info};

use super::{Sensor, SensorError, SensorKind};
use crate::bme280::{Bme280, Bme280Error, Params};
use crate::measurement::Measurement;

pub struct Bme280Sensor<I, D> {
    sensor: Bme280<I, D>,
    params: Params,
    initialized: bool,
}

impl<I: I2c, D: DelayNs> Bme280Sensor<I, D> {
    pub fn new(i2c: I, delay: D, address: impl Into<u8>, params: Params) -> Self {
        Self {
            sensor: Bme280::new(i2c, delay, address),
            params,
            initialized: false,
        }
    }

    /// Access the underlying driver, e.g. to read its calibration.
    pub fn driver(&mut self) -> &mut Bme280<I, D> {
        &mut self.sensor
    }

    pub fn release(self) -> I {
        self.sensor.release()
    }

    async fn initialize(&mut self) -> Result<(), SensorError> {
        self.sensor.init(self.params).await.map_err(|e| {
            error!("BME280 init failed: {:?}", e);
            SensorError::InitializationFailed {
                sensor: "BME280",
                details: match e {
                    Bme280Error::UnexpectedChipId(_) => "chip id mismatch, wrong part or address",
                    Bme280Error::Timeout => "NVM copy did not finish after reset",
                    _ => "I2C communication error or sensor not responding",
                },
            }
        })?;

        self.sensor.device_info();
        info!("BME280: initialized with {:?}", self.params);
        self.initialized = true;
        Ok(())
    }
}

impl<I: I2c, D: DelayNs> Sensor for Bme280Sensor<I, D> {
    fn kind(&self) -> SensorKind {
        SensorKind::Bme280
    }

    async fn read(&mut self) -> Result<Measurement, SensorError> {
        // Initialize sensor on first read
        if !self.initialized {
            self.initialize().await?;
        }

        self.sensor.measure().await.map_err(|e| {
            error!("BME280 measurement failed: {:?}", e);
            match e {
                Bme280Error::Timeout => SensorError::Timeout {
                    sensor: "BME280",
                    operation: "forced measurement",
                },
                _ => {
                    // Bring the part up again on the next read.
                    self.initialized = false;
                    SensorError::ReadFailed {
                        sensor: "BME280",
                        operation: "measure temperature/humidity/pressure",
                        details: "I2C communication error or sensor not responding",
                    }
                }
            }
        })
    }
}
