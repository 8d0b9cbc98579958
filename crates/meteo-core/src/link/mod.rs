//! ESP-NOW link abstractions
//!
//! The radio itself lives behind the [`Radio`] trait so the node and gateway
//! handshakes run unchanged on the ESP32 (over `esp-radio`) and in the
//! desktop simulator.

pub mod frame;

use core::fmt;

use log::debug;
use thiserror_no_std::Error;

pub use frame::{Frame, MAX_PAYLOAD, PING_CODE, PONG_CODE};

/// Length of an IEEE 802.11 MAC address.
pub const MAC_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; MAC_LEN]);

impl MacAddress {
    pub const BROADCAST: Self = Self([0xFF; MAC_LEN]);
    pub const NULL: Self = Self([0x00; MAC_LEN]);

    pub const fn is_null(&self) -> bool {
        matches!(self.0, [0, 0, 0, 0, 0, 0])
    }

    pub const fn is_broadcast(&self) -> bool {
        matches!(self.0, [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF])
    }

    pub const fn as_bytes(&self) -> &[u8; MAC_LEN] {
        &self.0
    }
}

impl From<[u8; MAC_LEN]> for MacAddress {
    fn from(value: [u8; MAC_LEN]) -> Self {
        Self(value)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    #[error("send to {0} failed")]
    SendFailed(MacAddress),
    #[error("peer table rejected {0}")]
    PeerTable(MacAddress),
    #[error("payload of {0} bytes does not fit a frame")]
    PayloadTooLarge(usize),
    #[error("frame cannot be encoded")]
    Encode,
}

/// A frame as delivered by the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFrame {
    pub src: MacAddress,
    pub dst: MacAddress,
    pub data: heapless::Vec<u8, MAX_PAYLOAD>,
}

impl ReceivedFrame {
    pub fn new(src: MacAddress, dst: MacAddress, data: &[u8]) -> Result<Self, LinkError> {
        let data = heapless::Vec::from_slice(data)
            .map_err(|_| LinkError::PayloadTooLarge(data.len()))?;
        Ok(Self { src, dst, data })
    }

    pub fn frame(&self) -> Frame {
        Frame::decode(&self.data)
    }
}

/// A peer-to-peer 2.4 GHz link with a peer table.
pub trait Radio {
    fn peer_exists(&self, addr: &MacAddress) -> bool;

    fn add_peer(&mut self, addr: &MacAddress) -> Result<(), LinkError>;

    /// Send `payload` and wait for the delivery status.
    fn send(
        &mut self,
        dst: &MacAddress,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), LinkError>>;

    /// Wait for the next incoming frame.
    fn receive(&mut self) -> impl Future<Output = ReceivedFrame>;

    /// Add `addr` to the peer table unless it is already there.
    fn ensure_peer(&mut self, addr: &MacAddress) -> Result<(), LinkError> {
        if self.peer_exists(addr) {
            debug!("peer {} already added", addr);
            return Ok(());
        }
        self.add_peer(addr)?;
        debug!("peer {} added", addr);
        Ok(())
    }
}

/// Register the broadcast peer, and `peer` when one is already known.
pub fn init_link<R: Radio>(radio: &mut R, peer: Option<&MacAddress>) -> Result<(), LinkError> {
    radio.ensure_peer(&MacAddress::BROADCAST)?;
    if let Some(peer) = peer {
        radio.ensure_peer(peer)?;
    }
    Ok(())
}

/// Hex dump of a payload, 16 bytes per line, for debug logs.
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (line, chunk) in self.0.chunks(16).enumerate() {
            if line > 0 {
                writeln!(f)?;
            }
            write!(f, "{:04x}:", line * 16)?;
            for byte in chunk {
                write!(f, " {byte:02x}")?;
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedRadio;
    use super::*;

    #[test]
    fn mac_address_classification() {
        assert!(MacAddress::NULL.is_null());
        assert!(!MacAddress::NULL.is_broadcast());
        assert!(MacAddress::BROADCAST.is_broadcast());
        assert!(!MacAddress([0, 0, 0, 0, 0, 1]).is_null());
        assert!(!MacAddress([0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE]).is_broadcast());
    }

    #[test]
    fn mac_address_display() {
        let addr = MacAddress([0x24, 0x0A, 0xC4, 0x00, 0xBE, 0xEF]);
        assert_eq!(addr.to_string(), "24:0a:c4:00:be:ef");
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let data = [0u8; MAX_PAYLOAD + 1];
        let err = ReceivedFrame::new(MacAddress::NULL, MacAddress::BROADCAST, &data).unwrap_err();
        assert_eq!(err, LinkError::PayloadTooLarge(MAX_PAYLOAD + 1));
    }

    #[test]
    fn init_link_registers_peers_once() {
        let gateway = MacAddress([1, 2, 3, 4, 5, 6]);
        let mut radio = ScriptedRadio::new();

        init_link(&mut radio, Some(&gateway)).unwrap();
        init_link(&mut radio, Some(&gateway)).unwrap();

        assert_eq!(radio.peers, vec![MacAddress::BROADCAST, gateway]);
    }

    #[test]
    fn hexdump_lines() {
        let data: Vec<u8> = (0u8..18).collect();
        assert_eq!(
            HexDump(&data).to_string(),
            "0000: 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f\n0010: 10 11"
        );
        assert_eq!(HexDump(&[]).to_string(), "");
    }
}
