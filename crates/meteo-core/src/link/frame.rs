//! Wire format of the sensor → gateway exchange.
//!
//! Frames carry no header; the gateway tells them apart by length:
//!
//! | length | frame   | layout                                       |
//! |--------|---------|----------------------------------------------|
//! | 2      | `Ping`  | `u16` code, little-endian                    |
//! | 12     | `Meteo` | temperature, humidity, pressure as LE `f32`  |
//!
//! The meteo body is written with `postcard`, which encodes `f32` as four
//! little-endian bytes, so it matches a packed C struct of three floats.

use log::warn;

use super::LinkError;
use crate::measurement::Measurement;

/// Largest ESP-NOW payload.
pub const MAX_PAYLOAD: usize = 250;

/// Code a node broadcasts to find a gateway.
pub const PING_CODE: u16 = 1973;
/// Code the gateway answers with.
pub const PONG_CODE: u16 = 1389;

pub const PING_LEN: usize = 2;
pub const METEO_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    Ping(u16),
    Meteo(Measurement),
    /// Any other length
    Unknown(usize),
}

impl Frame {
    pub fn decode(bytes: &[u8]) -> Self {
        match bytes.len() {
            PING_LEN => Self::Ping(u16::from_le_bytes([bytes[0], bytes[1]])),
            METEO_LEN => match postcard::from_bytes::<Measurement>(bytes) {
                Ok(measurement) => Self::Meteo(measurement),
                Err(e) => {
                    warn!("meteo frame rejected: {:?}", e);
                    Self::Unknown(METEO_LEN)
                }
            },
            len => Self::Unknown(len),
        }
    }

    pub fn encode(&self) -> Result<heapless::Vec<u8, METEO_LEN>, LinkError> {
        let mut out = heapless::Vec::new();
        match self {
            Self::Ping(code) => out
                .extend_from_slice(&code.to_le_bytes())
                .map_err(|_| LinkError::Encode)?,
            Self::Meteo(measurement) => {
                let mut buf = [0u8; METEO_LEN];
                let used = postcard::to_slice(measurement, &mut buf).map_err(|e| {
                    warn!("meteo frame encoding failed: {:?}", e);
                    LinkError::Encode
                })?;
                out.extend_from_slice(used).map_err(|_| LinkError::Encode)?;
            }
            Self::Unknown(_) => return Err(LinkError::Encode),
        }
        Ok(out)
    }
}
