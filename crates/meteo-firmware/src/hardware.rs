//! Peripheral initialization shared by the firmware binaries
//!
//! - I2C bus for the BME280 (SDA GPIO2, SCL GPIO1)
//! - Wi-Fi station + ESP-NOW on a fixed channel

use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use esp_radio::wifi::{ClientConfig, ModeConfig};
use log::{error, info};
use static_cell::StaticCell;
use thiserror_no_std::Error;

use crate::radio::EspNowRadio;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    #[error("I2C bus configuration rejected")]
    I2cConfig,
    #[error("radio controller initialization failed")]
    RadioInit,
    #[error("Wi-Fi station setup failed")]
    Wifi,
    #[error("ESP-NOW setup failed")]
    EspNow,
}

/// Create the async I2C bus the BME280 is wired to.
pub fn create_i2c_bus(
    i2c0: esp_hal::peripherals::I2C0<'static>,
    sda: esp_hal::peripherals::GPIO2<'static>,
    scl: esp_hal::peripherals::GPIO1<'static>,
    frequency_khz: u32,
) -> Result<I2c<'static, esp_hal::Async>, HardwareError> {
    let i2c = I2c::new(
        i2c0,
        I2cConfig::default().with_frequency(Rate::from_khz(frequency_khz)),
    )
    .map_err(|e| {
        error!("I2C config error: {:?}", e);
        HardwareError::I2cConfig
    })?;

    info!("I2C bus ready at {} kHz", frequency_khz);
    Ok(i2c.with_sda(sda).with_scl(scl).into_async())
}

/// Bring up Wi-Fi in station mode and hand out ESP-NOW on `channel`.
pub fn init_radio(
    wifi: esp_hal::peripherals::WIFI<'static>,
    channel: u8,
) -> Result<EspNowRadio<'static>, HardwareError> {
    static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
    let radio_init = RADIO.init(esp_radio::init().map_err(|e| {
        error!("radio init error: {:?}", e);
        HardwareError::RadioInit
    })?);

    let (mut controller, interfaces) = esp_radio::wifi::new(radio_init, wifi, Default::default())
        .map_err(|e| {
            error!("Wi-Fi init error: {:?}", e);
            HardwareError::Wifi
        })?;

    controller
        .set_config(&ModeConfig::Client(ClientConfig::default()))
        .and_then(|_| controller.start())
        .map_err(|e| {
            error!("Wi-Fi start error: {:?}", e);
            HardwareError::Wifi
        })?;

    let esp_now = interfaces.esp_now;
    esp_now.set_channel(channel).map_err(|e| {
        error!("ESP-NOW channel {} rejected: {:?}", channel, e);
        HardwareError::EspNow
    })?;
    info!("ESP-NOW ready on channel {}", channel);

    Ok(EspNowRadio::new(esp_now, controller))
}
