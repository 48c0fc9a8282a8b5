use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

use crate::{
    Error,
    address::SlaveAddress,
    register::{
        AlgResult, AppStart, Baseline, Ccs811Register, DriveMode, EnvData, HwId, MeasMode, Status,
        SwReset,
    },
};

/// Settling time after the app-start and reset commands, while the
/// device firmware changes phase.
const SETTLE_DELAY_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Firmware phase of the device, as tracked by the driver.
pub enum OperatingState {
    /// Boot firmware; only identification, app-start and reset are possible.
    Boot,
    /// Application firmware, measuring at the configured drive mode.
    Application(DriveMode),
}

/// Represents the CCS811 sensor.
pub struct Ccs811<T> {
    pub(crate) i2c: T,
    pub(crate) address: u8,
    pub(crate) state: OperatingState,
}

#[derive(Debug, Default)]
/// Builder for a CCS811 sensor.
pub struct Ccs811Builder {
    pub(crate) address: SlaveAddress,
}

impl Ccs811Builder {
    /// Set the address of the CCS811 sensor.
    pub fn with_address(mut self, address: SlaveAddress) -> Self {
        self.address = address;
        self
    }

    /// Build the sensor handle on the given I2C bus.
    ///
    /// The bus may be any [`I2c`] implementation, including a `&mut` borrow of
    /// one shared with other devices. No bus traffic is issued until
    /// [`Ccs811::init`]; a freshly built handle assumes the device is in its
    /// boot phase.
    pub fn build<T: I2c<SevenBitAddress>>(self, i2c: T) -> Ccs811<T> {
        Ccs811 {
            i2c,
            address: self.address.into_bits(),
            state: OperatingState::Boot,
        }
    }
}

impl<T: I2c<SevenBitAddress>> Ccs811<T> {
    /// Get the 7-bit bus address of the device.
    pub fn get_address(&self) -> u8 {
        self.address
    }

    /// Get the firmware phase the driver believes the device is in.
    pub fn get_state(&self) -> OperatingState {
        self.state
    }

    /// Release the I2C bus instance.
    pub fn release(self) -> T {
        self.i2c
    }

    /// Check the hardware identity register.
    ///
    /// Returns `Ok(true)` iff the device reports the CCS811 hardware id (0x81).
    /// Valid in any firmware phase; has no side effect beyond the bus read.
    pub fn check_hardware(&mut self) -> Result<bool, Error<T::Error>> {
        let mut id = HwId::default();
        id.read(self)?;
        Ok(id.matches())
    }

    /// Verify the hardware id and switch the device firmware from boot into
    /// application mode.
    ///
    /// Fails with [`Error::InvalidId`] if the device does not identify as a
    /// CCS811; the caller owns any retry policy. On success the device settles
    /// for 100 ms and the driver lands in [`OperatingState::Application`] with
    /// [`DriveMode::Idle`]. Calling this while already in application mode is
    /// a no-op.
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<T::Error>> {
        if let OperatingState::Application(_) = self.state {
            return Ok(());
        }
        if !self.check_hardware()? {
            return Err(Error::InvalidId);
        }
        AppStart::default().write(self)?;
        delay.delay_ms(SETTLE_DELAY_MS);
        self.state = OperatingState::Application(DriveMode::Idle);
        Ok(())
    }

    /// Set the measurement drive mode.
    ///
    /// Writes the drive mode into bits 6-4 of the measurement mode register,
    /// leaving every other bit zero. Requires application mode.
    pub fn configure(&mut self, mode: DriveMode) -> Result<(), Error<T::Error>> {
        self.require_application()?;
        MeasMode::new().with_drive_mode(mode).write(self)?;
        self.state = OperatingState::Application(mode);
        Ok(())
    }

    /// Read and decode the status register. Requires application mode.
    pub fn get_status(&mut self) -> Result<Status, Error<T::Error>> {
        self.require_application()?;
        let mut status = Status::default();
        status.read(self)?;
        Ok(status)
    }

    /// Check whether a new result pair is waiting to be read.
    ///
    /// The flag is not cleared here; the device clears it when the result
    /// register is read, so poll first and read only once this reports true.
    pub fn data_available(&mut self) -> Result<bool, Error<T::Error>> {
        Ok(self.get_status()?.data_ready())
    }

    /// Read the current eCO2 (ppm) and eTVOC (ppb) result pair.
    ///
    /// The values are decoded as-is; no range validation is applied.
    pub fn read_data(&mut self) -> Result<AlgResult, Error<T::Error>> {
        self.require_application()?;
        let mut result = AlgResult::default();
        result.read(self)?;
        Ok(result)
    }

    /// Push ambient humidity and temperature to compensate the measurement.
    ///
    /// Humidity is in percent relative humidity, temperature in degrees
    /// Celsius. Fails with [`Error::InvalidInput`] if either value encodes to
    /// a negative fixed-point quantity (temperature below -25 °C, negative
    /// humidity, or NaN).
    pub fn set_environment(
        &mut self,
        humidity_percent: f32,
        temperature_celsius: f32,
    ) -> Result<(), Error<T::Error>> {
        self.require_application()?;
        EnvData {
            humidity: humidity_percent,
            temperature: temperature_celsius,
        }
        .write(self)?;
        Ok(())
    }

    /// Read the opaque encoded baseline, for persisting across power cycles.
    pub fn get_baseline(&mut self) -> Result<Baseline, Error<T::Error>> {
        self.require_application()?;
        let mut baseline = Baseline::default();
        baseline.read(self)?;
        Ok(baseline)
    }

    /// Restore a previously saved baseline.
    pub fn set_baseline(&mut self, baseline: Baseline) -> Result<(), Error<T::Error>> {
        self.require_application()?;
        let mut baseline = baseline;
        baseline.write(self)?;
        Ok(())
    }

    /// Force the device back into its boot phase.
    ///
    /// Writes the 4-byte reset key and settles for 100 ms. Valid in any phase;
    /// afterwards [`Ccs811::init`] is required before measuring again.
    pub fn software_reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<T::Error>> {
        SwReset::default().write(self)?;
        delay.delay_ms(SETTLE_DELAY_MS);
        self.state = OperatingState::Boot;
        Ok(())
    }

    fn require_application(&self) -> Result<(), Error<T::Error>> {
        match self.state {
            OperatingState::Application(_) => Ok(()),
            OperatingState::Boot => Err(Error::InvalidState),
        }
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    use super::{Ccs811, Ccs811Builder, OperatingState};
    use crate::{Baseline, DriveMode, Error, SlaveAddress};

    const ADDR: u8 = 0x5A;

    fn boot_device(expectations: &[I2cTransaction]) -> Ccs811<I2cMock> {
        Ccs811Builder::default().build(I2cMock::new(expectations))
    }

    fn app_device(expectations: &[I2cTransaction]) -> Ccs811<I2cMock> {
        let mut dev = boot_device(expectations);
        dev.state = OperatingState::Application(DriveMode::Idle);
        dev
    }

    #[test]
    fn hardware_id_match() {
        let expectations = vec![I2cTransaction::write_read(ADDR, vec![0x20], vec![0x81])];
        let mut dev = boot_device(&expectations);
        assert!(dev.check_hardware().unwrap());
        dev.release().done();
    }

    #[test]
    fn hardware_id_mismatch() {
        let expectations = vec![
            I2cTransaction::write_read(ADDR, vec![0x20], vec![0x55]),
            I2cTransaction::write_read(ADDR, vec![0x20], vec![0x00]),
        ];
        let mut dev = boot_device(&expectations);
        assert!(!dev.check_hardware().unwrap());
        assert!(!dev.check_hardware().unwrap());
        dev.release().done();
    }

    #[test]
    fn alternate_address_reaches_the_bus() {
        let expectations = vec![I2cTransaction::write_read(0x5B, vec![0x20], vec![0x81])];
        let mut dev = Ccs811Builder::default()
            .with_address(SlaveAddress::default().with_addr_pin(true))
            .build(I2cMock::new(&expectations));
        assert!(dev.check_hardware().unwrap());
        dev.release().done();
    }

    #[test]
    fn init_enters_application_idle() {
        let expectations = vec![
            I2cTransaction::write_read(ADDR, vec![0x20], vec![0x81]),
            I2cTransaction::write(ADDR, vec![0xF4]),
        ];
        let mut dev = boot_device(&expectations);
        dev.init(&mut NoopDelay::new()).unwrap();
        assert_eq!(
            dev.get_state(),
            OperatingState::Application(DriveMode::Idle)
        );
        dev.release().done();
    }

    #[test]
    fn init_rejects_unknown_hardware() {
        // the failed id check must not be followed by an app-start write
        let expectations = vec![I2cTransaction::write_read(ADDR, vec![0x20], vec![0x55])];
        let mut dev = boot_device(&expectations);
        assert_eq!(dev.init(&mut NoopDelay::new()), Err(Error::InvalidId));
        assert_eq!(dev.get_state(), OperatingState::Boot);
        dev.release().done();
    }

    #[test]
    fn init_in_application_is_a_no_op() {
        let mut dev = app_device(&[]);
        dev.init(&mut NoopDelay::new()).unwrap();
        assert_eq!(
            dev.get_state(),
            OperatingState::Application(DriveMode::Idle)
        );
        dev.release().done();
    }

    #[test]
    fn configure_writes_drive_mode_bits() {
        let expectations = vec![I2cTransaction::write(ADDR, vec![0x01, 0x10])];
        let mut dev = app_device(&expectations);
        dev.configure(DriveMode::OneSecond).unwrap();
        assert_eq!(
            dev.get_state(),
            OperatingState::Application(DriveMode::OneSecond)
        );
        dev.release().done();
    }

    #[test]
    fn configure_clamps_high_ordinals_to_raw() {
        let expectations = vec![I2cTransaction::write(ADDR, vec![0x01, 0x40])];
        let mut dev = app_device(&expectations);
        dev.configure(DriveMode::from(10)).unwrap();
        assert_eq!(dev.get_state(), OperatingState::Application(DriveMode::Raw));
        dev.release().done();
    }

    #[test]
    fn operations_require_application_state() {
        let mut dev = boot_device(&[]);
        assert_eq!(
            dev.configure(DriveMode::OneSecond),
            Err(Error::InvalidState)
        );
        assert_eq!(dev.data_available(), Err(Error::InvalidState));
        assert_eq!(dev.read_data().map(|_| ()), Err(Error::InvalidState));
        assert_eq!(dev.set_environment(50.0, 25.0), Err(Error::InvalidState));
        assert_eq!(dev.get_baseline().map(|_| ()), Err(Error::InvalidState));
        assert_eq!(
            dev.set_baseline(Baseline::from(0x8473)),
            Err(Error::InvalidState)
        );
        dev.release().done();
    }

    #[test]
    fn data_ready_flag() {
        let expectations = vec![
            I2cTransaction::write_read(ADDR, vec![0x00], vec![0x08]),
            I2cTransaction::write_read(ADDR, vec![0x00], vec![0x00]),
        ];
        let mut dev = app_device(&expectations);
        assert!(dev.data_available().unwrap());
        assert!(!dev.data_available().unwrap());
        dev.release().done();
    }

    #[test]
    fn status_surfaces_the_error_flag() {
        let expectations = vec![I2cTransaction::write_read(ADDR, vec![0x00], vec![0x01])];
        let mut dev = app_device(&expectations);
        let status = dev.get_status().unwrap();
        assert!(status.error());
        assert!(!status.data_ready());
        dev.release().done();
    }

    #[test]
    fn read_data_decodes_big_endian_pairs() {
        let expectations = vec![I2cTransaction::write_read(
            ADDR,
            vec![0x02],
            vec![0x01, 0x90, 0x00, 0x64],
        )];
        let mut dev = app_device(&expectations);
        let result = dev.read_data().unwrap();
        assert_eq!(result.co2_ppm(), 400);
        assert_eq!(result.tvoc_ppb(), 100);
        dev.release().done();
    }

    #[test]
    fn environment_payload_encoding() {
        let expectations = vec![I2cTransaction::write(
            ADDR,
            vec![0x05, 0x64, 0x00, 0x64, 0x00],
        )];
        let mut dev = app_device(&expectations);
        dev.set_environment(50.0, 25.0).unwrap();
        dev.release().done();
    }

    #[test]
    fn environment_rejects_negative_scaled_values() {
        // no bus traffic may happen when the encoding fails
        let mut dev = app_device(&[]);
        assert_eq!(dev.set_environment(-1.0, 25.0), Err(Error::InvalidInput));
        assert_eq!(dev.set_environment(50.0, -30.0), Err(Error::InvalidInput));
        dev.release().done();
    }

    #[test]
    fn software_reset_returns_to_boot() {
        let expectations = vec![I2cTransaction::write(
            ADDR,
            vec![0xFF, 0x11, 0xE5, 0x72, 0x8A],
        )];
        let mut dev = app_device(&expectations);
        dev.software_reset(&mut NoopDelay::new()).unwrap();
        assert_eq!(dev.get_state(), OperatingState::Boot);
        dev.release().done();
    }

    #[test]
    fn software_reset_is_valid_in_boot() {
        let expectations = vec![I2cTransaction::write(
            ADDR,
            vec![0xFF, 0x11, 0xE5, 0x72, 0x8A],
        )];
        let mut dev = boot_device(&expectations);
        dev.software_reset(&mut NoopDelay::new()).unwrap();
        assert_eq!(dev.get_state(), OperatingState::Boot);
        dev.release().done();
    }

    #[test]
    fn baseline_save_and_restore() {
        let expectations = vec![
            I2cTransaction::write_read(ADDR, vec![0x11], vec![0x84, 0x73]),
            I2cTransaction::write(ADDR, vec![0x11, 0x84, 0x73]),
        ];
        let mut dev = app_device(&expectations);
        let baseline = dev.get_baseline().unwrap();
        assert_eq!(baseline.value(), 0x8473);
        dev.set_baseline(baseline).unwrap();
        dev.release().done();
    }

    #[test]
    fn bus_errors_surface_as_i2c() {
        let expectations = vec![
            I2cTransaction::write_read(ADDR, vec![0x20], vec![0x00])
                .with_error(ErrorKind::Other),
        ];
        let mut dev = boot_device(&expectations);
        assert_eq!(dev.check_hardware(), Err(Error::I2c(ErrorKind::Other)));
        dev.release().done();
    }
}
