//! Periodically measures temperature, humidity and pressure with a BME280
//! and prints a report over RTT.

#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use log::info;
use rtt_target::rprintln;

use meteo_core::bme280::Params;
use meteo_core::monitor::Monitor;
use meteo_core::sensors::{Bme280Sensor, Sensor, log_sensor_info};
use meteo_firmware::{config, hardware};

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let settings = config::load();
    info!("starting with {:?}", settings);

    let i2c = hardware::create_i2c_bus(
        peripherals.I2C0,
        peripherals.GPIO2,
        peripherals.GPIO1,
        settings.bus.frequency_khz,
    )
    .expect("Failed to create I2C bus");

    let sensor = Bme280Sensor::new(i2c, Delay, settings.bus.address, Params::default());
    log_sensor_info(sensor.kind());
    let mut monitor = Monitor::new(sensor);

    let interval = Duration::from_millis(u64::from(settings.monitor.interval_ms));
    loop {
        // Failures are logged by the monitor; try again next period.
        if let Ok(report) = monitor.tick().await {
            rprintln!("{}", report);
        }
        Timer::after(interval).await;
    }
}
