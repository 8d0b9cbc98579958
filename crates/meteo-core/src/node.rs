//! Wireless sensor node.
//!
//! One call to [`SensorNode::run`] is one wake cycle of the node: find the
//! gateway if none is known yet, take a measurement, send it, and hand
//! control back so the caller can deep-sleep.
//!
//! ```text
//! NotConfigured ──ping/reply──▶ Configured ──▶ CapturingData ──▶ CaptureDone
//!                                                                   │
//!                         SendDataDone ◀── SendingData ◀────────────┘
//! ```

use core::fmt;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embedded_hal_async::delay::DelayNs;
use log::{debug, error, info, warn};
use thiserror_no_std::Error;

use crate::config::NodeConfig;
use crate::link::{self, Frame, HexDump, LinkError, MacAddress, PING_CODE, Radio};
use crate::measurement::Measurement;
use crate::sensors::{Sensor, SensorError, log_sensor_info};

/// Depth of the state transition queue.
pub const EVENT_QUEUE_DEPTH: usize = 20;

/// Queue the node reports its state transitions on.
pub type EventQueue = Channel<CriticalSectionRawMutex, SensorEvent, EVENT_QUEUE_DEPTH>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Undefined,
    NotConfigured,
    Configured,
    CapturingData,
    CaptureDone,
    SendingData,
    SendDataDone,
}

/// A state transition, `prev` → `state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorEvent {
    pub prev: NodeState,
    pub state: NodeState,
}

impl fmt::Display for SensorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "------------- <NEW SENSOR EVENT> ---------------")?;
        write!(f, "sensor state changed {:?} -> {:?}", self.prev, self.state)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeError {
    #[error("no gateway answered within {0} ms")]
    NoGateway(u32),
    #[error("link error: {0}")]
    Link(#[from] LinkError),
    #[error("sensor error: {0}")]
    Sensor(#[from] SensorError),
}

pub struct SensorNode<'a, R, S, D> {
    radio: R,
    sensor: S,
    delay: D,
    config: NodeConfig,
    gateway: MacAddress,
    state: NodeState,
    events: &'a EventQueue,
}

impl<'a, R: Radio, S: Sensor, D: DelayNs> SensorNode<'a, R, S, D> {
    pub fn new(radio: R, sensor: S, delay: D, config: NodeConfig, events: &'a EventQueue) -> Self {
        Self {
            radio,
            sensor,
            delay,
            config,
            gateway: MacAddress::NULL,
            state: NodeState::Undefined,
            events,
        }
    }

    /// Start from a gateway learned in an earlier wake cycle.
    pub fn with_gateway(mut self, gateway: MacAddress) -> Self {
        self.gateway = gateway;
        self
    }

    /// Gateway address, [`MacAddress::NULL`] until one has answered.
    pub fn gateway(&self) -> MacAddress {
        self.gateway
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Run one wake cycle and return the measurement that was sent.
    pub async fn run(&mut self) -> Result<Measurement, NodeError> {
        let result = self.cycle().await;
        if let Err(e) = &result {
            error!("sensor node stopped in {:?}: {}", self.state, e);
        }
        result
    }

    async fn cycle(&mut self) -> Result<Measurement, NodeError> {
        link::init_link(&mut self.radio, None)?;
        log_sensor_info(self.sensor.kind());

        self.transition(NodeState::NotConfigured);
        if self.gateway.is_null() {
            self.discover().await?;
        } else {
            info!("gateway {} retained from previous cycle", self.gateway);
        }
        self.transition(NodeState::Configured);
        self.radio.ensure_peer(&self.gateway)?;

        self.transition(NodeState::CapturingData);
        let measurement = self.sensor.read().await?;
        info!(
            "captured {:.2} C, {:.2} %, {:.2} hPa",
            measurement.temperature, measurement.humidity, measurement.pressure
        );
        self.transition(NodeState::CaptureDone);

        self.transition(NodeState::SendingData);
        let payload = Frame::Meteo(measurement).encode()?;
        debug!("meteo payload:\n{}", HexDump(&payload));
        self.radio.send(&self.gateway, &payload).await?;
        info!("event sent to [{}]", self.gateway);
        self.transition(NodeState::SendDataDone);

        Ok(measurement)
    }

    /// Broadcast a ping and adopt the sender of the first reply as gateway.
    async fn discover(&mut self) -> Result<(), NodeError> {
        let ping = Frame::Ping(PING_CODE).encode()?;
        self.radio.send(&MacAddress::BROADCAST, &ping).await?;
        info!("ping {} broadcast, waiting for a gateway", PING_CODE);

        let timeout_ms = self.config.reply_timeout_ms;
        match select(self.radio.receive(), self.delay.delay_ms(timeout_ms)).await {
            Either::First(reply) => {
                info!(
                    "event received from [{}] with {} byte(s)",
                    reply.src,
                    reply.data.len()
                );
                self.gateway = reply.src;
                info!("gateway set to {}", self.gateway);
                Ok(())
            }
            Either::Second(()) => Err(NodeError::NoGateway(timeout_ms)),
        }
    }

    /// Move to `state` and queue the transition for whoever drains `events`.
    fn transition(&mut self, state: NodeState) {
        let event = SensorEvent {
            prev: self.state,
            state,
        };
        self.state = state;
        if let Err(TrySendError::Full(event)) = self.events.try_send(event) {
            warn!("event queue full, dropping {:?}", event);
        }
    }
}
