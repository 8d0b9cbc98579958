//! ESP-NOW gateway: answers sensor node pings and prints their readings.

#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use embassy_executor::Spawner;
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use log::info;
use rtt_target::rprintln;

use meteo_core::Report;
use meteo_core::gateway::{Gateway, GatewayEvent};
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

    let radio = hardware::init_radio(peripherals.WIFI, settings.node.channel)
        .expect("Failed to initialize ESP-NOW");
    let mut gateway = Gateway::init(radio).expect("Failed to register broadcast peer");

    let mut count = 0u32;
    gateway
        .serve(|event| {
            if let GatewayEvent::Meteo { from, measurement } = event {
                count = count.wrapping_add(1);
                rprintln!("[{}]", from);
                rprintln!("{}", Report { count, measurement });
            }
        })
        .await
}
