//! Deep sleep between node wake cycles.
//!
//! The gateway address survives deep sleep in RTC fast memory. It is only
//! trusted after a timer wakeup; after a power-on or reset the node pings
//! for a gateway again.

use core::time::Duration;

use esp_hal::rtc_cntl::sleep::TimerWakeupSource;
use esp_hal::rtc_cntl::{Rtc, SleepSource, wakeup_cause};
use log::info;
use meteo_core::link::{MAC_LEN, MacAddress};

#[esp_hal::ram(unstable(rtc_fast, persistent))]
static mut RETAINED_GATEWAY: [u8; MAC_LEN] = [0; MAC_LEN];

/// Gateway learned before the last deep sleep, or [`MacAddress::NULL`].
pub fn retained_gateway() -> MacAddress {
    if !matches!(wakeup_cause(), SleepSource::Timer) {
        return MacAddress::NULL;
    }
    // SAFETY: single core access before any task is spawned.
    MacAddress(unsafe { core::ptr::read_volatile(&raw const RETAINED_GATEWAY) })
}

pub fn retain_gateway(gateway: MacAddress) {
    // SAFETY: see `retained_gateway`.
    unsafe { core::ptr::write_volatile(&raw mut RETAINED_GATEWAY, gateway.0) };
}

pub fn deep_sleep(rtc: &mut Rtc<'_>, secs: u32) -> ! {
    info!("entering deep sleep for {} s", secs);
    let timer = TimerWakeupSource::new(Duration::from_secs(u64::from(secs)));
    rtc.sleep_deep(&[&timer])
}
