//! BME280 register map (Bosch Sensortec BME280 datasheet, revision 1.6).
//!
//! Key groups:
//! - **Measurement results** - 0xF7–0xFE (8 bytes): pressure (20-bit),
//!   temperature (20-bit), humidity (16-bit)
//! - **Control registers** - 0xF2 (humidity), 0xF4 (temperature/pressure/mode),
//!   0xF5 (IIR filter + standby)
//! - **Status** - 0xF3 (measuring / NVM copy bits)
//! - **Reset & ID** - 0xE0 (soft reset), 0xD0 (chip ID)
//! - **Calibration** - 0x88–0xA1 (26 bytes) and 0xE1–0xE7 (7 bytes)

pub const REG_CALIB_BANK1: u8 = 0x88;
pub const REG_CHIP_ID: u8 = 0xD0;
pub const REG_RESET: u8 = 0xE0;
pub const REG_CALIB_BANK2: u8 = 0xE1;
pub const REG_CTRL_HUM: u8 = 0xF2;
pub const REG_STATUS: u8 = 0xF3;
pub const REG_CTRL_MEAS: u8 = 0xF4;
pub const REG_CONFIG: u8 = 0xF5;
/// First register of the pressure/temperature/humidity burst.
pub const REG_PRESS_MSB: u8 = 0xF7;

pub const CALIB_BANK1_LEN: usize = 26;
pub const CALIB_BANK2_LEN: usize = 7;
pub const RAW_DATA_LEN: usize = 8;

/// Value of the chip ID register on every BME280.
pub const CHIP_ID: u8 = 0x60;
/// Writing this word to `REG_RESET` runs the complete power-on-reset procedure.
pub const RESET_WORD: u8 = 0xB6;

/// I2C slave address, selected by the level of the SDO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Address {
    /// SDO tied to GND
    Primary = 0x76,
    /// SDO tied to VDDIO
    Secondary = 0x77,
}

impl From<Address> for u8 {
    fn from(value: Address) -> Self {
        value as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Oversampling {
    /// Channel disabled, its data register holds the reset pattern
    Skipped = 0,
    X1 = 1,
    X2 = 2,
    X4 = 3,
    X8 = 4,
    X16 = 5,
}

impl Oversampling {
    /// Number of conversions averaged for one result.
    pub const fn factor(self) -> u32 {
        match self {
            Self::Skipped => 0,
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 4,
            Self::X8 => 8,
            Self::X16 => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    Sleep = 0b00,
    Forced = 0b01,
    Normal = 0b11,
}

/// IIR filter coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Filter {
    Off = 0,
    X2 = 1,
    X4 = 2,
    X8 = 3,
    X16 = 4,
}

/// Inactive duration between two conversions in normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Standby {
    Ms0_5 = 0,
    Ms62_5 = 1,
    Ms125 = 2,
    Ms250 = 3,
    Ms500 = 4,
    Ms1000 = 5,
    Ms10 = 6,
    Ms20 = 7,
}

/// Content of the status register (0xF3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    const IM_UPDATE: u8 = 1 << 0;
    const MEASURING: u8 = 1 << 3;

    /// NVM data is being copied to the image registers.
    pub const fn is_updating(self) -> bool {
        self.0 & Self::IM_UPDATE != 0
    }

    /// A conversion is running.
    pub const fn is_measuring(self) -> bool {
        self.0 & Self::MEASURING != 0
    }
}
