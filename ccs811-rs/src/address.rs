use bitfield_struct::bitfield;

#[bitfield(u8)]
/// Represents the 7-bit slave address for the CCS811 sensor.
/// The default address is 0x5A; wiring the ADDR pin high selects 0x5B.
pub struct SlaveAddress {
    #[bits(1, default = false)]
    pub addr_pin: bool,
    #[bits(7, default = 0x5A >> 1)]
    reserved: u8,
}
