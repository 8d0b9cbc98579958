//! Hardware-independent core library for meteo
//!
//! This crate contains all platform-agnostic logic for the meteo sensing
//! programs: the BME280 register-level driver and its fixed-point
//! compensation, the ESP-NOW frame format, and the sensor node and gateway
//! handshakes.
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32-S3) and
//! desktop hosts (for the simulator and tests). Everything that touches a bus
//! or a radio goes through `embedded-hal-async` traits or the [`link::Radio`]
//! trait.

#![cfg_attr(not(test), no_std)]

pub mod bme280;
pub mod config;
pub mod gateway;
pub mod link;
pub mod measurement;
pub mod monitor;
pub mod node;
pub mod sensors;

pub use measurement::{Measurement, Report};
