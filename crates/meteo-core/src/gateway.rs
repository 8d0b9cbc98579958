//! ESP-NOW gateway: answers node pings and collects their measurements.

use log::{debug, info, warn};

use crate::link::{
    self, Frame, HexDump, LinkError, MacAddress, PING_CODE, PONG_CODE, Radio, ReceivedFrame,
};
use crate::measurement::Measurement;

/// What the gateway made of an incoming frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GatewayEvent {
    /// A node delivered a measurement.
    Meteo {
        from: MacAddress,
        measurement: Measurement,
    },
    /// A node pinged and was answered.
    Pinged(MacAddress),
    Ignored,
}

pub struct Gateway<R> {
    radio: R,
}

impl<R: Radio> Gateway<R> {
    /// Register the broadcast peer and wrap the radio.
    pub fn init(mut radio: R) -> Result<Self, LinkError> {
        link::init_link(&mut radio, None)?;
        info!("gateway ready");
        Ok(Self { radio })
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub async fn handle(&mut self, frame: &ReceivedFrame) -> Result<GatewayEvent, LinkError> {
        info!(
            "event received from [{}] with {} byte(s)",
            frame.src,
            frame.data.len()
        );
        debug!("payload:\n{}", HexDump(&frame.data));

        match frame.frame() {
            Frame::Meteo(measurement) => {
                info!(
                    "meteo from [{}]: {:.2} C, {:.2} %, {:.2} hPa",
                    frame.src, measurement.temperature, measurement.humidity, measurement.pressure
                );
                Ok(GatewayEvent::Meteo {
                    from: frame.src,
                    measurement,
                })
            }
            Frame::Ping(PING_CODE) => {
                self.radio.ensure_peer(&frame.src)?;
                let pong = Frame::Ping(PONG_CODE).encode()?;
                self.radio.send(&MacAddress::BROADCAST, &pong).await?;
                info!("event sent to [{}]", MacAddress::BROADCAST);
                Ok(GatewayEvent::Pinged(frame.src))
            }
            Frame::Ping(code) => {
                warn!("unexpected ping code {} from [{}]", code, frame.src);
                Ok(GatewayEvent::Ignored)
            }
            Frame::Unknown(len) => {
                warn!("unknown frame of {} byte(s) from [{}]", len, frame.src);
                Ok(GatewayEvent::Ignored)
            }
        }
    }

    /// Receive and handle frames forever, passing each event to `on_event`.
    pub async fn serve<F: FnMut(GatewayEvent)>(&mut self, mut on_event: F) -> ! {
        loop {
            let frame = self.radio.receive().await;
            match self.handle(&frame).await {
                Ok(event) => on_event(event),
                Err(e) => warn!("failed to handle frame from [{}]: {}", frame.src, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::testing::ScriptedRadio;
    use embassy_futures::block_on;

    const NODE: MacAddress = MacAddress([0x24, 0x0A, 0xC4, 0x00, 0x00, 0x01]);

    fn received(data: &[u8]) -> ReceivedFrame {
        ReceivedFrame::new(NODE, MacAddress::BROADCAST, data).unwrap()
    }

    #[test]
    fn init_registers_broadcast() {
        let gateway = Gateway::init(ScriptedRadio::new()).unwrap();
        assert_eq!(gateway.radio().peers, vec![MacAddress::BROADCAST]);
    }

    #[test]
    fn ping_is_answered() {
        let mut gateway = Gateway::init(ScriptedRadio::new()).unwrap();

        let event = block_on(gateway.handle(&received(&PING_CODE.to_le_bytes()))).unwrap();

        assert_eq!(event, GatewayEvent::Pinged(NODE));
        let radio = gateway.radio();
        assert_eq!(radio.peers, vec![MacAddress::BROADCAST, NODE]);
        assert_eq!(radio.sent, vec![(MacAddress::BROADCAST, vec![0x6D, 0x05])]);
    }

    #[test]
    fn meteo_is_decoded() {
        let mut gateway = Gateway::init(ScriptedRadio::new()).unwrap();
        let measurement = Measurement::new(22.5, 40.0, 998.75);
        let payload = Frame::Meteo(measurement).encode().unwrap();

        let event = block_on(gateway.handle(&received(&payload))).unwrap();

        assert_eq!(
            event,
            GatewayEvent::Meteo {
                from: NODE,
                measurement
            }
        );
        assert!(gateway.radio().sent.is_empty());
    }

    #[test]
    fn other_frames_are_ignored() {
        let mut gateway = Gateway::init(ScriptedRadio::new()).unwrap();

        let wrong_code = block_on(gateway.handle(&received(&PONG_CODE.to_le_bytes()))).unwrap();
        let odd_length = block_on(gateway.handle(&received(&[1, 2, 3]))).unwrap();

        assert_eq!(wrong_code, GatewayEvent::Ignored);
        assert_eq!(odd_length, GatewayEvent::Ignored);
        assert!(gateway.radio().sent.is_empty());
        assert_eq!(gateway.radio().peers, vec![MacAddress::BROADCAST]);
    }

    #[test]
    fn failed_pong_is_an_error() {
        let mut radio = ScriptedRadio::new();
        radio.fail_sends = true;
        let mut gateway = Gateway::init(radio).unwrap();

        let err = block_on(gateway.handle(&received(&PING_CODE.to_le_bytes()))).unwrap_err();
        assert_eq!(err, LinkError::SendFailed(MacAddress::BROADCAST));
    }
}
