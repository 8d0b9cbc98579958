//! Register-level BME280 driver over an async I2C bus.
//!
//! The bring-up sequence is the one the datasheet prescribes:
//!
//! ```text
//!   chip id (0xD0) == 0x60 ?
//!            │
//!            ▼
//!   soft reset (0xE0 <- 0xB6), wait 2 ms
//!            │
//!            ▼
//!   status.im_update == 0 ?  ◄── wait 1 ms
//!            │
//!            ▼
//!   calibration banks 0x88..=0xA1, 0xE1..=0xE7
//!            │
//!            ▼
//!   sleep, then config (0xF5), ctrl_hum (0xF2), ctrl_meas (0xF4)
//! ```
//!
//! A forced measurement rewrites `ctrl_meas` with the forced mode, waits the
//! worst-case conversion time, polls `status.measuring` and burst-reads
//! 0xF7..=0xFE.

pub mod calibration;
pub mod params;
pub mod registers;

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::{debug, info, trace, warn};
use thiserror_no_std::Error;

pub use calibration::{CalibrationData, RawData};
pub use params::Params;
pub use registers::{Address, Filter, Mode, Oversampling, Standby, Status};

use crate::measurement::Measurement;
use registers::*;

/// Time the part needs after a soft reset before it answers again.
const RESET_DELAY_MS: u32 = 2;
/// Upper bound on status polls, 1 ms apart, before giving up.
const MAX_STATUS_POLLS: u32 = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Bme280Error<E> {
    #[error("I2C bus error: {0:?}")]
    I2c(E),
    #[error("unexpected chip id {0:#04x}, not a BME280")]
    UnexpectedChipId(u8),
    #[error("device stayed busy")]
    Timeout,
    #[error("driver used before init")]
    NotInitialized,
}

pub struct Bme280<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    params: Params,
    calibration: Option<CalibrationData>,
    chip_id: Option<u8>,
}

impl<I: I2c, D: DelayNs> Bme280<I, D> {
    pub fn new(i2c: I, delay: D, address: impl Into<u8>) -> Self {
        Self {
            i2c,
            delay,
            address: address.into(),
            params: Params::default(),
            calibration: None,
            chip_id: None,
        }
    }

    /// Give the bus back.
    pub fn release(self) -> I {
        self.i2c
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn calibration(&self) -> Option<&CalibrationData> {
        self.calibration.as_ref()
    }

    /// Chip id verified by the last successful [`Bme280::init`].
    pub fn device_id(&self) -> Option<u8> {
        self.chip_id
    }

    pub fn device_info(&self) {
        trace!("BME280 device: addr = {}, {:#04x}", self.address, self.address);
        match self.chip_id {
            Some(id) => trace!("BME280 device: chip id = {:#04x}", id),
            None => trace!("BME280 device: chip id not read yet"),
        }
    }

    async fn read_registers(
        &mut self,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Bme280Error<I::Error>> {
        self.i2c
            .write_read(self.address, &[register], buf)
            .await
            .map_err(Bme280Error::I2c)
    }

    async fn write_register(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<(), Bme280Error<I::Error>> {
        self.i2c
            .write(self.address, &[register, value])
            .await
            .map_err(Bme280Error::I2c)
    }

    /// Verify the part, reset it, load its calibration and apply `params`.
    pub async fn init(&mut self, params: Params) -> Result<(), Bme280Error<I::Error>> {
        let id = self.chip_id().await?;
        if id != CHIP_ID {
            warn!("BME280: chip id {:#04x} does not match {:#04x}", id, CHIP_ID);
            return Err(Bme280Error::UnexpectedChipId(id));
        }
        debug!("BME280: chip id {:#04x}", id);
        self.chip_id = Some(id);

        self.soft_reset().await?;
        self.read_calibration().await?;
        self.configure(params).await?;

        info!("BME280 ready at {:#04x}", self.address);
        Ok(())
    }

    pub async fn chip_id(&mut self) -> Result<u8, Bme280Error<I::Error>> {
        let mut id = [0u8; 1];
        self.read_registers(REG_CHIP_ID, &mut id).await?;
        Ok(id[0])
    }

    pub async fn status(&mut self) -> Result<Status, Bme280Error<I::Error>> {
        let mut status = [0u8; 1];
        self.read_registers(REG_STATUS, &mut status).await?;
        Ok(Status(status[0]))
    }

    /// Power-on reset, then wait for the NVM copy to finish.
    pub async fn soft_reset(&mut self) -> Result<(), Bme280Error<I::Error>> {
        self.write_register(REG_RESET, RESET_WORD).await?;
        self.delay.delay_ms(RESET_DELAY_MS).await;

        for _ in 0..MAX_STATUS_POLLS {
            if !self.status().await?.is_updating() {
                return Ok(());
            }
            self.delay.delay_ms(1).await;
        }

        warn!("BME280: NVM copy still running after reset");
        Err(Bme280Error::Timeout)
    }

    pub async fn read_calibration(&mut self) -> Result<CalibrationData, Bme280Error<I::Error>> {
        let mut bank1 = [0u8; CALIB_BANK1_LEN];
        let mut bank2 = [0u8; CALIB_BANK2_LEN];
        self.read_registers(REG_CALIB_BANK1, &mut bank1).await?;
        self.read_registers(REG_CALIB_BANK2, &mut bank2).await?;

        let calibration = CalibrationData::parse(&bank1, &bank2);
        debug!("BME280 calibration: {:?}", calibration);
        self.calibration = Some(calibration);
        Ok(calibration)
    }

    /// Write the control registers.
    ///
    /// `config` is only writable in sleep mode, so the part is put to sleep
    /// first. `ctrl_hum` only latches on a `ctrl_meas` write, so `ctrl_meas`
    /// always goes last: normal mode starts cycling, any other mode stays
    /// asleep until a forced conversion is triggered.
    pub async fn configure(&mut self, params: Params) -> Result<(), Bme280Error<I::Error>> {
        self.write_register(REG_CTRL_MEAS, params.ctrl_meas(Mode::Sleep))
            .await?;
        self.write_register(REG_CONFIG, params.config()).await?;
        self.write_register(REG_CTRL_HUM, params.ctrl_hum()).await?;
        let mode = match params.mode {
            Mode::Normal => Mode::Normal,
            Mode::Forced | Mode::Sleep => Mode::Sleep,
        };
        self.write_register(REG_CTRL_MEAS, params.ctrl_meas(mode))
            .await?;

        self.params = params;
        Ok(())
    }

    /// Burst read of the data registers, whatever the current mode.
    pub async fn read_raw(&mut self) -> Result<RawData, Bme280Error<I::Error>> {
        let mut data = [0u8; RAW_DATA_LEN];
        self.read_registers(REG_PRESS_MSB, &mut data).await?;
        Ok(RawData::from_bytes(&data))
    }

    /// Trigger one forced conversion and read its result.
    pub async fn read_raw_forced(&mut self) -> Result<RawData, Bme280Error<I::Error>> {
        self.write_register(REG_CTRL_MEAS, self.params.ctrl_meas(Mode::Forced))
            .await?;
        self.delay
            .delay_us(self.params.measurement_time_us())
            .await;

        for _ in 0..MAX_STATUS_POLLS {
            if !self.status().await?.is_measuring() {
                return self.read_raw().await;
            }
            self.delay.delay_ms(1).await;
        }

        warn!("BME280: forced conversion did not complete");
        Err(Bme280Error::Timeout)
    }

    /// Read and compensate one measurement.
    pub async fn measure(&mut self) -> Result<Measurement, Bme280Error<I::Error>> {
        let calibration = self.calibration.ok_or(Bme280Error::NotInitialized)?;

        let raw = match self.params.mode {
            Mode::Normal => self.read_raw().await?,
            Mode::Forced | Mode::Sleep => self.read_raw_forced().await?,
        };
        trace!("BME280 raw: {:?}", raw);

        Ok(calibration.compensate(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::calibration::tests::{BANK1, BANK2, RAW};
    use super::*;
    use embassy_futures::block_on;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    const ADDR: u8 = Address::Primary as u8;

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    /// Remembers every wait, in nanoseconds.
    #[derive(Default)]
    struct RecordingDelay(Vec<u32>);

    impl DelayNs for RecordingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.0.push(ns);
        }
    }

    fn read(register: u8, response: &[u8]) -> Transaction {
        Transaction::write_read(ADDR, vec![register], response.to_vec())
    }

    fn write(register: u8, value: u8) -> Transaction {
        Transaction::write(ADDR, vec![register, value])
    }

    fn init_transactions(params: &Params) -> Vec<Transaction> {
        let mut t = vec![
            read(REG_CHIP_ID, &[CHIP_ID]),
            write(REG_RESET, RESET_WORD),
            read(REG_STATUS, &[0x00]),
            read(REG_CALIB_BANK1, &BANK1),
            read(REG_CALIB_BANK2, &BANK2),
            write(REG_CTRL_MEAS, params.ctrl_meas(Mode::Sleep)),
            write(REG_CONFIG, params.config()),
            write(REG_CTRL_HUM, params.ctrl_hum()),
        ];
        let mode = match params.mode {
            Mode::Normal => Mode::Normal,
            _ => Mode::Sleep,
        };
        t.push(write(REG_CTRL_MEAS, params.ctrl_meas(mode)));
        t
    }

    #[test]
    fn init_loads_calibration() {
        let params = Params::default();
        let i2c = I2cMock::new(&init_transactions(&params));
        let mut bme = Bme280::new(i2c, NoDelay, Address::Primary);

        block_on(bme.init(params)).unwrap();

        let calibration = bme.calibration().unwrap();
        assert_eq!(calibration.dig_t1, 27504);
        assert_eq!(calibration.dig_h4, 313);
        assert_eq!(bme.device_id(), Some(CHIP_ID));
        bme.release().done();
    }

    #[test]
    fn init_rejects_other_chips() {
        // 0x58 is a BMP280, which has no humidity channel
        let i2c = I2cMock::new(&[read(REG_CHIP_ID, &[0x58])]);
        let mut bme = Bme280::new(i2c, NoDelay, Address::Primary);

        let err = block_on(bme.init(Params::default())).unwrap_err();
        assert_eq!(err, Bme280Error::UnexpectedChipId(0x58));
        assert_eq!(bme.device_id(), None);
        bme.release().done();
    }

    #[test]
    fn forced_configure_ends_asleep_with_ctrl_meas() {
        let params = Params::default();
        let i2c = I2cMock::new(&[
            write(REG_CTRL_MEAS, params.ctrl_meas(Mode::Sleep)),
            write(REG_CONFIG, params.config()),
            write(REG_CTRL_HUM, params.ctrl_hum()),
            write(REG_CTRL_MEAS, params.ctrl_meas(Mode::Sleep)),
        ]);
        let mut bme = Bme280::new(i2c, NoDelay, Address::Primary);

        block_on(bme.configure(params)).unwrap();
        assert_eq!(bme.params().mode, Mode::Forced);
        bme.release().done();
    }

    #[test]
    fn waits_for_reset_and_conversion() {
        let params = Params::default();
        let mut expectations = init_transactions(&params);
        expectations.extend([
            write(REG_CTRL_MEAS, params.ctrl_meas(Mode::Forced)),
            read(REG_STATUS, &[0x00]),
            read(REG_PRESS_MSB, &RAW),
        ]);
        let i2c = I2cMock::new(&expectations);
        let mut delay = RecordingDelay::default();
        let mut bme = Bme280::new(i2c, &mut delay, Address::Primary);

        block_on(bme.init(params)).unwrap();
        block_on(bme.measure()).unwrap();
        bme.release().done();

        // 2 ms after the reset, then the 9.3 ms worst case of the default profile
        assert_eq!(delay.0, vec![2_000_000, 9_300_000]);
    }

    #[test]
    fn busy_status_polls_every_millisecond() {
        let i2c = I2cMock::new(&[
            write(REG_RESET, RESET_WORD),
            read(REG_STATUS, &[0x01]),
            read(REG_STATUS, &[0x00]),
        ]);
        let mut delay = RecordingDelay::default();
        let mut bme = Bme280::new(i2c, &mut delay, Address::Primary);

        block_on(bme.soft_reset()).unwrap();
        bme.release().done();
        assert_eq!(delay.0, vec![2_000_000, 1_000_000]);
    }

    #[test]
    fn reset_waits_for_nvm_copy() {
        let i2c = I2cMock::new(&[
            write(REG_RESET, RESET_WORD),
            read(REG_STATUS, &[0x01]),
            read(REG_STATUS, &[0x01]),
            read(REG_STATUS, &[0x00]),
        ]);
        let mut bme = Bme280::new(i2c, NoDelay, Address::Primary);

        block_on(bme.soft_reset()).unwrap();
        bme.release().done();
    }

    #[test]
    fn measure_before_init() {
        let i2c = I2cMock::new(&[]);
        let mut bme = Bme280::new(i2c, NoDelay, Address::Primary);

        assert_eq!(
            block_on(bme.measure()).unwrap_err(),
            Bme280Error::NotInitialized
        );
        bme.release().done();
    }

    #[test]
    fn forced_measurement() {
        let params = Params::default();
        let mut expectations = init_transactions(&params);
        expectations.extend([
            write(REG_CTRL_MEAS, params.ctrl_meas(Mode::Forced)),
            read(REG_STATUS, &[0b0000_1000]),
            read(REG_STATUS, &[0x00]),
            read(REG_PRESS_MSB, &RAW),
        ]);
        let i2c = I2cMock::new(&expectations);
        let mut bme = Bme280::new(i2c, NoDelay, Address::Primary);

        block_on(bme.init(params)).unwrap();
        let m = block_on(bme.measure()).unwrap();

        assert!((m.temperature - 25.08).abs() < 0.001);
        assert!((m.pressure - 1006.5325).abs() < 0.01);
        assert!((m.humidity - 54.997).abs() < 0.01);
        bme.release().done();
    }

    #[test]
    fn forced_measurement_times_out() {
        let params = Params::default();
        let mut expectations = init_transactions(&params);
        expectations.push(write(REG_CTRL_MEAS, params.ctrl_meas(Mode::Forced)));
        for _ in 0..MAX_STATUS_POLLS {
            expectations.push(read(REG_STATUS, &[0b0000_1000]));
        }
        let i2c = I2cMock::new(&expectations);
        let mut bme = Bme280::new(i2c, NoDelay, Address::Primary);

        block_on(bme.init(params)).unwrap();
        assert_eq!(block_on(bme.measure()).unwrap_err(), Bme280Error::Timeout);
        bme.release().done();
    }

    #[test]
    fn normal_mode_reads_without_trigger() {
        let params = Params {
            mode: Mode::Normal,
            filter: Filter::X16,
            standby: Standby::Ms62_5,
            ..Params::default()
        };
        let mut expectations = init_transactions(&params);
        expectations.push(read(REG_PRESS_MSB, &RAW));
        let i2c = I2cMock::new(&expectations);
        let mut bme = Bme280::new(i2c, NoDelay, Address::Primary);

        block_on(bme.init(params)).unwrap();
        let m = block_on(bme.measure()).unwrap();
        assert!((m.temperature - 25.08).abs() < 0.001);
        bme.release().done();
    }
}
