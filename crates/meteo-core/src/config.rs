use core::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::bme280::Address;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub bus: BusConfig,
    pub node: NodeConfig,
    pub monitor: MonitorConfig,
}

/// I2C bus the BME280 sits on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct BusConfig {
    pub address: u8,
    pub frequency_khz: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            address: Address::Primary as u8,
            frequency_khz: 100,
        }
    }
}

/// Wireless sensor node settings.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct NodeConfig {
    /// Wi-Fi channel shared by node and gateway
    pub channel: u8,
    /// Deep sleep between two transmissions
    pub sleep_secs: u32,
    /// How long to wait for the gateway to answer a ping
    pub reply_timeout_ms: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            channel: 1,
            sleep_secs: 30,
            reply_timeout_ms: 5000,
        }
    }
}

/// Periodic console monitor settings.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval_ms: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { interval_ms: 5000 }
    }
}

/// Parse a textual setting, falling back to `default` when it is absent or
/// malformed.
pub fn parse_or<T: FromStr>(name: &str, value: Option<&str>, default: T) -> T {
    match value.map(str::parse) {
        Some(Ok(parsed)) => parsed,
        Some(Err(_)) => {
            warn!("{} is not a valid value, using the default", name);
            default
        }
        None => default,
    }
}

/// Like [`parse_or`] for I2C addresses, which are usually written in hex.
pub fn address_or(name: &str, value: Option<&str>, default: u8) -> u8 {
    let Some(value) = value else {
        return default;
    };
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.unwrap_or_else(|_| {
        warn!("{} {} is not a valid address, using {:#04x}", name, value, default);
        default
    })
}
