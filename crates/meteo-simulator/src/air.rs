//! In-memory ESP-NOW air shared by the simulated stations.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{trace, warn};
use meteo_core::link::{HexDump, LinkError, MacAddress, Radio, ReceivedFrame};

/// Frames a station can have in flight before new ones are dropped.
const INBOX_DEPTH: usize = 8;

struct Station {
    mac: MacAddress,
    inbox: Channel<CriticalSectionRawMutex, ReceivedFrame, INBOX_DEPTH>,
}

pub struct Air<const N: usize> {
    stations: [Station; N],
}

impl<const N: usize> Air<N> {
    pub const fn new(macs: [MacAddress; N]) -> Self {
        // `array::map` is not const yet.
        let mut stations = [const {
            Station {
                mac: MacAddress::NULL,
                inbox: Channel::new(),
            }
        }; N];
        let mut i = 0;
        while i < N {
            stations[i].mac = macs[i];
            i += 1;
        }
        Self { stations }
    }

    /// Radio of the station with address `mac`.
    pub fn radio(&self, mac: MacAddress) -> AirRadio<'_, N> {
        AirRadio {
            air: self,
            mac,
            peers: Vec::new(),
        }
    }

    fn station(&self, mac: &MacAddress) -> Option<&Station> {
        self.stations.iter().find(|s| s.mac == *mac)
    }
}

pub struct AirRadio<'a, const N: usize> {
    air: &'a Air<N>,
    mac: MacAddress,
    peers: Vec<MacAddress>,
}

impl<const N: usize> AirRadio<'_, N> {
    fn deliver(&self, station: &Station, dst: &MacAddress, payload: &[u8]) -> Result<(), LinkError> {
        let frame = ReceivedFrame::new(self.mac, *dst, payload)?;
        if station.inbox.try_send(frame).is_err() {
            warn!("air: inbox of {} full, frame dropped", station.mac);
        }
        Ok(())
    }
}

impl<const N: usize> Radio for AirRadio<'_, N> {
    fn peer_exists(&self, addr: &MacAddress) -> bool {
        self.peers.contains(addr)
    }

    fn add_peer(&mut self, addr: &MacAddress) -> Result<(), LinkError> {
        self.peers.push(*addr);
        Ok(())
    }

    async fn send(&mut self, dst: &MacAddress, payload: &[u8]) -> Result<(), LinkError> {
        if !self.peer_exists(dst) {
            warn!("air: {} is not a peer of {}", dst, self.mac);
            return Err(LinkError::SendFailed(*dst));
        }
        trace!("air: {} -> {}\n{}", self.mac, dst, HexDump(payload));

        if dst.is_broadcast() {
            for station in self.air.stations.iter().filter(|s| s.mac != self.mac) {
                self.deliver(station, dst, payload)?;
            }
            return Ok(());
        }

        // Unicast needs an acknowledgement from a station that exists.
        match self.air.station(dst) {
            Some(station) => self.deliver(station, dst, payload),
            None => Err(LinkError::SendFailed(*dst)),
        }
    }

    async fn receive(&mut self) -> ReceivedFrame {
        match self.air.station(&self.mac) {
            Some(station) => station.inbox.receive().await,
            None => core::future::pending().await,
        }
    }
}
