use bitfield_struct::bitfield;
use embedded_hal::i2c::{I2c, SevenBitAddress};

use crate::{Error, core::Ccs811};

pub(crate) const CCS811_HW_ID: u8 = 0x81; // ams CCS811
pub(crate) const CCS811_RESET_KEY: [u8; 4] = [0x11, 0xE5, 0x72, 0x8A];

pub(crate) trait Ccs811Register: Default {
    const ADDRESS: u8;
    const REGISTER_LEN: usize;

    fn read<T: I2c<SevenBitAddress>>(
        &mut self,
        _dev: &mut Ccs811<T>,
    ) -> Result<(), Error<T::Error>> {
        Err(Error::WriteOnly)
    }
    fn write<T: I2c<SevenBitAddress>>(
        &mut self,
        _dev: &mut Ccs811<T>,
    ) -> Result<(), Error<T::Error>> {
        Err(Error::ReadOnly)
    }
}

#[bitfield(u8)]
/// Decoded contents of the status register.
pub struct Status {
    /// A fault exists; the device latches its source internally.
    #[bits(1, access=RO)]
    pub error: bool,
    #[bits(2, access=RO)]
    rsvd: u8,
    /// A new result pair is waiting in the algorithm result register.
    #[bits(1, access=RO)]
    pub data_ready: bool,
    /// A valid application firmware image is loaded.
    #[bits(1, access=RO)]
    pub app_valid: bool,
    #[bits(2, access=RO)]
    rsvd2: u8,
    /// The firmware is running in the application phase rather than boot.
    #[bits(1, access=RO)]
    pub fw_mode: bool,
}

impl Ccs811Register for Status {
    const ADDRESS: u8 = 0x00;
    const REGISTER_LEN: usize = 1;

    fn read<T: I2c<SevenBitAddress>>(
        &mut self,
        dev: &mut Ccs811<T>,
    ) -> Result<(), Error<T::Error>> {
        let mut buffer = [0u8; Self::REGISTER_LEN];
        dev.i2c
            .write_read(dev.address, &[Self::ADDRESS], &mut buffer)?;
        *self = buffer[0].into();
        Ok(())
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Sampling cadence of the measurement engine.
pub enum DriveMode {
    #[default]
    /// No measurements are taken; lowest power.
    Idle = 0,
    /// One measurement per second.
    OneSecond = 1,
    /// One measurement every 10 seconds.
    TenSeconds = 2,
    /// One measurement every 60 seconds.
    SixtySeconds = 3,
    /// One raw-data measurement every 250 ms.
    Raw = 4,
}

impl DriveMode {
    pub(crate) const fn from_bits(bits: u8) -> Self {
        match bits {
            0 => DriveMode::Idle,
            1 => DriveMode::OneSecond,
            2 => DriveMode::TenSeconds,
            3 => DriveMode::SixtySeconds,
            // any value above the fastest defined mode is clamped to it
            _ => DriveMode::Raw,
        }
    }

    pub(crate) const fn into_bits(self) -> u8 {
        match self {
            DriveMode::Idle => 0,
            DriveMode::OneSecond => 1,
            DriveMode::TenSeconds => 2,
            DriveMode::SixtySeconds => 3,
            DriveMode::Raw => 4,
        }
    }
}

impl From<u8> for DriveMode {
    /// Converts a raw mode ordinal, clamping values above [`DriveMode::Raw`] to `Raw`.
    fn from(value: u8) -> Self {
        Self::from_bits(value)
    }
}

#[bitfield(u8)]
pub struct MeasMode {
    #[bits(2, access=RO)]
    rsvd: u8,
    #[bits(1, default = false)]
    pub interrupt_threshold: bool,
    #[bits(1, default = false)]
    pub interrupt_data_ready: bool,
    #[bits(3, default = DriveMode::Idle)]
    pub drive_mode: DriveMode,
    #[bits(1, access=RO)]
    rsvd2: u8,
}

impl Ccs811Register for MeasMode {
    const ADDRESS: u8 = 0x01;
    const REGISTER_LEN: usize = 1;

    fn write<T: I2c<SevenBitAddress>>(
        &mut self,
        dev: &mut Ccs811<T>,
    ) -> Result<(), Error<T::Error>> {
        dev.i2c
            .write(dev.address, &[Self::ADDRESS, self.into_bits()])?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
/// A decoded measurement pair from the CCS811 sensor.
pub struct AlgResult {
    pub(crate) co2: u16,
    pub(crate) tvoc: u16,
}

impl AlgResult {
    /// Equivalent CO2 concentration in parts per million.
    pub fn co2_ppm(&self) -> u16 {
        self.co2
    }

    /// Total volatile organic compounds in parts per billion.
    pub fn tvoc_ppb(&self) -> u16 {
        self.tvoc
    }
}

impl Ccs811Register for AlgResult {
    const ADDRESS: u8 = 0x02;
    const REGISTER_LEN: usize = 4;

    fn read<T: I2c<SevenBitAddress>>(
        &mut self,
        dev: &mut Ccs811<T>,
    ) -> Result<(), Error<T::Error>> {
        let mut buffer = [0u8; Self::REGISTER_LEN];
        dev.i2c
            .write_read(dev.address, &[Self::ADDRESS], &mut buffer)?;
        self.co2 = u16::from_be_bytes([buffer[0], buffer[1]]);
        self.tvoc = u16::from_be_bytes([buffer[2], buffer[3]]);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct EnvData {
    pub(crate) humidity: f32,
    pub(crate) temperature: f32,
}

impl Ccs811Register for EnvData {
    const ADDRESS: u8 = 0x05;
    const REGISTER_LEN: usize = 4;

    fn write<T: I2c<SevenBitAddress>>(
        &mut self,
        dev: &mut Ccs811<T>,
    ) -> Result<(), Error<T::Error>> {
        let hum = encode_fixed(self.humidity).ok_or(Error::InvalidInput)?;
        // the device stores temperature with a +25 degree offset to keep it unsigned
        let temp = encode_fixed(self.temperature + 25.0).ok_or(Error::InvalidInput)?;
        let hum = hum.to_be_bytes();
        let temp = temp.to_be_bytes();
        dev.i2c.write(
            dev.address,
            &[Self::ADDRESS, hum[0], hum[1], temp[0], temp[1]],
        )?;
        Ok(())
    }
}

/// Encodes a value into the device's unsigned 1/512 fixed-point format,
/// rounding half up. Returns `None` for a negative or NaN scaled value;
/// values beyond the register range saturate at 0xFFFF.
pub(crate) fn encode_fixed(value: f32) -> Option<u16> {
    let scaled = value * 512.0 + 0.5;
    if !(scaled >= 0.0) {
        return None;
    }
    if scaled >= 65536.0 {
        return Some(u16::MAX);
    }
    Some(scaled as u16)
}

#[derive(Debug, Default, Clone, Copy)]
/// An opaque encoded baseline correction value.
///
/// The encoding is internal to the device; the value is only meaningful
/// when written back to a sensor of the same kind.
pub struct Baseline(pub(crate) u16);

impl Baseline {
    /// Raw encoded baseline as read from the device.
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl From<u16> for Baseline {
    fn from(value: u16) -> Self {
        Baseline(value)
    }
}

impl Ccs811Register for Baseline {
    const ADDRESS: u8 = 0x11;
    const REGISTER_LEN: usize = 2;

    fn read<T: I2c<SevenBitAddress>>(
        &mut self,
        dev: &mut Ccs811<T>,
    ) -> Result<(), Error<T::Error>> {
        let mut buffer = [0u8; Self::REGISTER_LEN];
        dev.i2c
            .write_read(dev.address, &[Self::ADDRESS], &mut buffer)?;
        self.0 = u16::from_be_bytes(buffer);
        Ok(())
    }

    fn write<T: I2c<SevenBitAddress>>(
        &mut self,
        dev: &mut Ccs811<T>,
    ) -> Result<(), Error<T::Error>> {
        let buffer = self.0.to_be_bytes();
        dev.i2c
            .write(dev.address, &[Self::ADDRESS, buffer[0], buffer[1]])?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct HwId(pub(crate) u8);

impl HwId {
    pub(crate) fn matches(&self) -> bool {
        self.0 == CCS811_HW_ID
    }
}

impl Ccs811Register for HwId {
    const ADDRESS: u8 = 0x20;
    const REGISTER_LEN: usize = 1;

    fn read<T: I2c<SevenBitAddress>>(
        &mut self,
        dev: &mut Ccs811<T>,
    ) -> Result<(), Error<T::Error>> {
        let mut buffer = [0u8; Self::REGISTER_LEN];
        dev.i2c
            .write_read(dev.address, &[Self::ADDRESS], &mut buffer)?;
        self.0 = buffer[0];
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct AppStart;

impl Ccs811Register for AppStart {
    const ADDRESS: u8 = 0xF4;
    const REGISTER_LEN: usize = 0;

    fn write<T: I2c<SevenBitAddress>>(
        &mut self,
        dev: &mut Ccs811<T>,
    ) -> Result<(), Error<T::Error>> {
        // bare command write, no payload
        dev.i2c.write(dev.address, &[Self::ADDRESS])?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SwReset;

impl Ccs811Register for SwReset {
    const ADDRESS: u8 = 0xFF;
    const REGISTER_LEN: usize = 4;

    fn write<T: I2c<SevenBitAddress>>(
        &mut self,
        dev: &mut Ccs811<T>,
    ) -> Result<(), Error<T::Error>> {
        let key = CCS811_RESET_KEY;
        dev.i2c.write(
            dev.address,
            &[Self::ADDRESS, key[0], key[1], key[2], key[3]],
        )?;
        Ok(())
    }
}
