//! [`Radio`] over the ESP-NOW driver of `esp-radio`.

use esp_radio::esp_now::{EspNow, EspNowWifiInterface, PeerInfo};
use esp_radio::wifi::WifiController;
use log::{error, warn};
use meteo_core::link::{LinkError, MacAddress, Radio, ReceivedFrame};

pub struct EspNowRadio<'d> {
    esp_now: EspNow<'d>,
    // Wi-Fi must stay started for ESP-NOW to work.
    _controller: WifiController<'d>,
}

impl<'d> EspNowRadio<'d> {
    pub fn new(esp_now: EspNow<'d>, controller: WifiController<'d>) -> Self {
        Self {
            esp_now,
            _controller: controller,
        }
    }
}

impl Radio for EspNowRadio<'_> {
    fn peer_exists(&self, addr: &MacAddress) -> bool {
        self.esp_now.peer_exists(addr.as_bytes())
    }

    fn add_peer(&mut self, addr: &MacAddress) -> Result<(), LinkError> {
        self.esp_now
            .add_peer(PeerInfo {
                interface: EspNowWifiInterface::Sta,
                peer_address: addr.0,
                lmk: None,
                channel: None,
                encrypt: false,
            })
            .map_err(|e| {
                error!("ESP-NOW add peer {} failed: {:?}", addr, e);
                LinkError::PeerTable(*addr)
            })
    }

    async fn send(&mut self, dst: &MacAddress, payload: &[u8]) -> Result<(), LinkError> {
        self.esp_now
            .send_async(dst.as_bytes(), payload)
            .await
            .map_err(|e| {
                error!("ESP-NOW send to {} failed: {:?}", dst, e);
                LinkError::SendFailed(*dst)
            })
    }

    async fn receive(&mut self) -> ReceivedFrame {
        loop {
            let received = self.esp_now.receive_async().await;
            let src = MacAddress(received.info.src_address);
            let dst = MacAddress(received.info.dst_address);
            match ReceivedFrame::new(src, dst, received.data()) {
                Ok(frame) => return frame,
                Err(e) => warn!("dropping frame from {}: {}", src, e),
            }
        }
    }
}
