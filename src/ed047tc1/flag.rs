/// Bits of the panel's configuration shift register.
///
/// The register is shifted out MSB first ([`Flag::OUTPUT_ENABLE`] down to
/// [`Flag::LATCH_ENABLE`]) and takes effect on the strobe.
pub struct Flag;
impl Flag {
    /// Latch the shifted source data into the output stage
    pub const LATCH_ENABLE: u8 = 1 << 0;
    /// Keep the panel power supply off
    pub const POWER_DISABLE: u8 = 1 << 1;
    /// Positive high voltage rail
    pub const POS_POWER_ENABLE: u8 = 1 << 2;
    /// Negative high voltage rail
    pub const NEG_POWER_ENABLE: u8 = 1 << 3;
    /// Gate start pulse, active low
    pub const STV: u8 = 1 << 4;
    /// Gate scan direction
    pub const SCAN_DIRECTION: u8 = 1 << 5;
    /// Gate driver output mode
    pub const MODE: u8 = 1 << 6;
    /// Source driver output enable
    pub const OUTPUT_ENABLE: u8 = 1 << 7;

    /// Register value after init: supply off, gate idle
    pub const INIT: u8 = Self::POWER_DISABLE | Self::STV | Self::SCAN_DIRECTION;
}
