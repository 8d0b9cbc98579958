//! ESP32-S3 firmware-specific modules for meteo
//!
//! This crate contains the hardware-specific code shared by the three
//! firmware binaries: peripheral initialization, the ESP-NOW radio behind
//! [`meteo_core::link::Radio`], deep sleep with RTC-retained state, and the
//! build-time settings.

#![no_std]

pub mod config;
pub mod hardware;
pub mod radio;
pub mod sleep;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}
