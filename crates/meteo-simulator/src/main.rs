//! Desktop simulator for the meteo programs.
//!
//! Runs the `bme280_sensor` monitor against a simulated BME280 register
//! file, then a few wake cycles of the ESP-NOW sensor node talking to the
//! gateway over an in-memory air.
//!
//! ```text
//! meteo-simulator [config.json]
//! ```
//!
//! The optional JSON file uses the layout of [`meteo_core::config::Config`];
//! missing keys keep their defaults. Set `RUST_LOG=debug` to see the frame
//! dumps.

mod air;
mod bme280;

use std::path::Path;

use embassy_futures::block_on;
use embassy_futures::select::select;
use embassy_time::{Delay, Duration, Timer};
use log::{debug, error, info, warn};

use meteo_core::Report;
use meteo_core::bme280::Params;
use meteo_core::config::Config;
use meteo_core::gateway::{Gateway, GatewayEvent};
use meteo_core::link::MacAddress;
use meteo_core::monitor::Monitor;
use meteo_core::node::{EventQueue, SensorNode};
use meteo_core::sensors::{Bme280Sensor, FixedSensor};

use crate::air::Air;
use crate::bme280::SimulatedBme280;

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Reports printed by the monitor before moving on to the radio demo.
const MONITOR_TICKS: u32 = 5;

/// Wake cycles of the sensor node.
const NODE_CYCLES: u32 = 3;

/// Simulated deep sleep is shortened to keep the demo snappy.
const SLEEP_SCALE: u32 = 100;

const NODE_MAC: MacAddress = MacAddress([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
const GATEWAY_MAC: MacAddress = MacAddress([0x02, 0x00, 0x00, 0x00, 0x00, 0x02]);

static AIR: Air<2> = Air::new([NODE_MAC, GATEWAY_MAC]);
static NODE_EVENTS: EventQueue = EventQueue::new();

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str(&text).map_err(|e| e.to_string()));
    match parsed {
        Ok(config) => {
            info!("configuration loaded from {}", path.display());
            config
        }
        Err(e) => {
            warn!("ignoring {}: {}", path.display(), e);
            Config::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Programs
// ---------------------------------------------------------------------------

async fn run_monitor(config: &Config) {
    info!("--- bme280_sensor ---");
    let i2c = SimulatedBme280::new(config.bus.address);
    let sensor = Bme280Sensor::new(i2c, Delay, config.bus.address, Params::default());
    let mut monitor = Monitor::new(sensor);

    let interval = Duration::from_millis(u64::from(config.monitor.interval_ms / SLEEP_SCALE));
    for _ in 0..MONITOR_TICKS {
        if let Ok(report) = monitor.tick().await {
            println!("{report}");
        }
        Timer::after(interval).await;
    }
}

async fn run_espnow(config: &Config) {
    info!("--- espnow_gateway / espnow_sensor ---");
    let mut gateway = match Gateway::init(AIR.radio(GATEWAY_MAC)) {
        Ok(gateway) => gateway,
        Err(e) => {
            error!("gateway init failed: {}", e);
            return;
        }
    };

    let mut received = 0u32;
    let gateway_side = gateway.serve(|event| {
        if let GatewayEvent::Meteo { from, measurement } = event {
            received += 1;
            println!("[{from}]");
            println!(
                "{}",
                Report {
                    count: received,
                    measurement
                }
            );
        }
    });

    let node_side = async {
        // Survives "deep sleep" the way RTC memory does on the board.
        let mut retained = MacAddress::NULL;
        for cycle in 1..=NODE_CYCLES {
            info!("node wake cycle {}", cycle);
            let mut node = SensorNode::new(
                AIR.radio(NODE_MAC),
                FixedSensor::demo(),
                Delay,
                config.node,
                &NODE_EVENTS,
            )
            .with_gateway(retained);

            if let Ok(measurement) = node.run().await {
                debug!("node sent {:?}", measurement);
            }
            while let Ok(event) = NODE_EVENTS.try_receive() {
                println!("{event}");
            }
            retained = node.gateway();

            let sleep_ms = u64::from(config.node.sleep_secs) * 1000 / u64::from(SLEEP_SCALE);
            info!("node sleeping {} ms", sleep_ms);
            Timer::after(Duration::from_millis(sleep_ms)).await;
        }
    };

    // The gateway never returns; the demo ends with the node.
    select(gateway_side, node_side).await;
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args().nth(1);
    let config = load_config(path.as_deref().map(Path::new));
    info!("starting with {:?}", config);

    block_on(async {
        run_monitor(&config).await;
        run_espnow(&config).await;
    });

    info!("simulation finished");
}
