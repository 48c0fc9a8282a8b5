#[derive(Debug, PartialEq, Eq)]
/// Represents errors that can occur while interacting with the CCS811 sensor.
pub enum Error<E> {
    /// An error occurred while communicating with the I2C bus.
    I2c(E),
    /// The hardware identification register did not report a CCS811.
    InvalidId,
    /// The operation is not available in the current firmware phase.
    InvalidState,
    /// An encoding input was outside the representable range.
    InvalidInput,
    /// Attempted to write to a register that is not writable.
    ReadOnly,
    /// Attempted to read from a register that is not readable.
    WriteOnly,
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::I2c(e)
    }
}
