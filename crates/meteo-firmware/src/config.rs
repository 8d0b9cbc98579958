//! Settings baked in at build time.
//!
//! `build.rs` exports every `METEO_*` entry of `.env` as a compile-time
//! environment variable. Missing or malformed values fall back to the
//! defaults of [`meteo_core::config`].

use meteo_core::config::{
    BusConfig, Config, MonitorConfig, NodeConfig, address_or, parse_or,
};

pub fn load() -> Config {
    Config {
        bus: bus_config(),
        node: node_config(),
        monitor: monitor_config(),
    }
}

pub fn bus_config() -> BusConfig {
    let defaults = BusConfig::default();
    BusConfig {
        address: address_or(
            "METEO_I2C_ADDRESS",
            option_env!("METEO_I2C_ADDRESS"),
            defaults.address,
        ),
        frequency_khz: parse_or(
            "METEO_I2C_FREQUENCY_KHZ",
            option_env!("METEO_I2C_FREQUENCY_KHZ"),
            defaults.frequency_khz,
        ),
    }
}

pub fn node_config() -> NodeConfig {
    let defaults = NodeConfig::default();
    NodeConfig {
        channel: parse_or("METEO_CHANNEL", option_env!("METEO_CHANNEL"), defaults.channel),
        sleep_secs: parse_or(
            "METEO_SLEEP_SECS",
            option_env!("METEO_SLEEP_SECS"),
            defaults.sleep_secs,
        ),
        reply_timeout_ms: parse_or(
            "METEO_REPLY_TIMEOUT_MS",
            option_env!("METEO_REPLY_TIMEOUT_MS"),
            defaults.reply_timeout_ms,
        ),
    }
}

pub fn monitor_config() -> MonitorConfig {
    let defaults = MonitorConfig::default();
    MonitorConfig {
        interval_ms: parse_or(
            "METEO_MONITOR_INTERVAL_MS",
            option_env!("METEO_MONITOR_INTERVAL_MS"),
            defaults.interval_ms,
        ),
    }
}
