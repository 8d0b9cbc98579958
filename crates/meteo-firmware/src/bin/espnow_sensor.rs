//! ESP-NOW sensor node.
//!
//! Each boot is one wake cycle: find the gateway (or reuse the one kept in
//! RTC memory), send one measurement, then deep-sleep.

#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use embassy_executor::Spawner;
use embassy_time::Delay;
use esp_hal::clock::CpuClock;
use esp_hal::rtc_cntl::Rtc;
use esp_hal::timer::timg::TimerGroup;
use log::info;
use rtt_target::rprintln;

use meteo_core::node::{EventQueue, SensorNode};
use meteo_firmware::{config, hardware, sleep};

esp_bootloader_esp_idf::esp_app_desc!();

static NODE_EVENTS: EventQueue = EventQueue::new();

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let settings = config::load();
    info!("starting with {:?}", settings);

    let radio = hardware::init_radio(peripherals.WIFI, settings.node.channel)
        .expect("Failed to initialize ESP-NOW");

    #[cfg(feature = "fixed-sensor")]
    let sensor = meteo_core::sensors::FixedSensor::demo();

    #[cfg(not(feature = "fixed-sensor"))]
    let sensor = {
        let i2c = hardware::create_i2c_bus(
            peripherals.I2C0,
            peripherals.GPIO2,
            peripherals.GPIO1,
            settings.bus.frequency_khz,
        )
        .expect("Failed to create I2C bus");
        meteo_core::sensors::Bme280Sensor::new(
            i2c,
            Delay,
            settings.bus.address,
            meteo_core::bme280::Params::default(),
        )
    };

    let mut node = SensorNode::new(radio, sensor, Delay, settings.node, &NODE_EVENTS)
        .with_gateway(sleep::retained_gateway());

    // Errors are logged by the node; sleep anyway and retry next cycle.
    if let Ok(measurement) = node.run().await {
        info!("cycle done: {:?}", measurement);
    }

    while let Ok(event) = NODE_EVENTS.try_receive() {
        rprintln!("{}", event);
    }

    sleep::retain_gateway(node.gateway());

    let mut rtc = Rtc::new(peripherals.LPWR);
    sleep::deep_sleep(&mut rtc, settings.node.sleep_secs)
}
