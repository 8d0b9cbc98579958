//! A BME280 register file behind the async I2C trait.
//!
//! Answers the chip id, holds the reference trimming values published with
//! the Bosch driver, and latches a new slowly drifting raw sample whenever a
//! forced conversion is triggered (or on every data read in normal mode).

use embedded_hal_async::i2c::{
    ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation, SevenBitAddress,
};
use log::trace;
use meteo_core::bme280::registers::{
    CHIP_ID, REG_CALIB_BANK1, REG_CALIB_BANK2, REG_CHIP_ID, REG_CTRL_MEAS, REG_PRESS_MSB,
    REG_RESET, RESET_WORD,
};

const CALIBRATION_BANK1: [u8; 26] = [
    0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC, 0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, 0x27, 0x0B, 0x8C,
    0x00, 0xF9, 0xFF, 0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17, 0x00, 0x4B,
];
const CALIBRATION_BANK2: [u8; 7] = [0x6A, 0x01, 0x00, 0x13, 0x29, 0x03, 0x1E];

// Raw counts around 25 °C, 1006 hPa, 55 %RH with these trimming values.
const BASE_ADC_T: f64 = 519_888.0;
const BASE_ADC_P: f64 = 415_148.0;
const BASE_ADC_H: f64 = 30_000.0;

const MODE_MASK: u8 = 0b11;
const MODE_NORMAL: u8 = 0b11;

pub struct SimulatedBme280 {
    address: u8,
    registers: [u8; 256],
    pointer: u8,
    samples: u32,
}

impl SimulatedBme280 {
    pub fn new(address: u8) -> Self {
        let mut sim = Self {
            address,
            registers: [0; 256],
            pointer: 0,
            samples: 0,
        };
        sim.power_on();
        sim
    }

    fn power_on(&mut self) {
        self.registers = [0; 256];
        self.registers[REG_CHIP_ID as usize] = CHIP_ID;
        let bank1 = REG_CALIB_BANK1 as usize;
        self.registers[bank1..bank1 + CALIBRATION_BANK1.len()].copy_from_slice(&CALIBRATION_BANK1);
        let bank2 = REG_CALIB_BANK2 as usize;
        self.registers[bank2..bank2 + CALIBRATION_BANK2.len()].copy_from_slice(&CALIBRATION_BANK2);
    }

    /// Write a new raw sample into 0xF7..=0xFE.
    fn convert(&mut self) {
        let t = f64::from(self.samples);
        self.samples = self.samples.wrapping_add(1);

        let adc_t = (BASE_ADC_T + 6_000.0 * (t / 11.0).sin()) as u32;
        let adc_p = (BASE_ADC_P + 1_500.0 * (t / 17.0).cos()) as u32;
        let adc_h = (BASE_ADC_H + 2_500.0 * (t / 7.0).sin()) as u32;

        let base = REG_PRESS_MSB as usize;
        self.registers[base..base + 3].copy_from_slice(&pack_20bit(adc_p));
        self.registers[base + 3..base + 6].copy_from_slice(&pack_20bit(adc_t));
        self.registers[base + 6..base + 8].copy_from_slice(&(adc_h as u16).to_be_bytes());
        trace!("sim BME280: adc_T={} adc_P={} adc_H={}", adc_t, adc_p, adc_h);
    }

    fn write_registers(&mut self, bytes: &[u8]) {
        let Some((&register, values)) = bytes.split_first() else {
            return;
        };
        self.pointer = register;
        for &value in values {
            self.store(self.pointer, value);
            self.pointer = self.pointer.wrapping_add(1);
        }
    }

    fn store(&mut self, register: u8, value: u8) {
        match register {
            REG_RESET if value == RESET_WORD => self.power_on(),
            REG_RESET => {}
            REG_CTRL_MEAS => match value & MODE_MASK {
                0b00 | MODE_NORMAL => self.registers[register as usize] = value,
                _ => {
                    // Forced: convert once and drop back to sleep.
                    self.convert();
                    self.registers[register as usize] = value & !MODE_MASK;
                }
            },
            _ => self.registers[register as usize] = value,
        }
    }

    fn read_registers(&mut self, buffer: &mut [u8]) {
        let normal = self.registers[REG_CTRL_MEAS as usize] & MODE_MASK == MODE_NORMAL;
        if normal && self.pointer == REG_PRESS_MSB {
            self.convert();
        }
        for byte in buffer {
            *byte = self.registers[self.pointer as usize];
            self.pointer = self.pointer.wrapping_add(1);
        }
    }
}

fn pack_20bit(adc: u32) -> [u8; 3] {
    [(adc >> 12) as u8, (adc >> 4) as u8, ((adc & 0x0F) << 4) as u8]
}

impl ErrorType for SimulatedBme280 {
    type Error = ErrorKind;
}

impl I2c<SevenBitAddress> for SimulatedBme280 {
    async fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for operation in operations {
            match operation {
                Operation::Write(bytes) => self.write_registers(bytes),
                Operation::Read(buffer) => self.read_registers(buffer),
            }
        }
        Ok(())
    }
}
