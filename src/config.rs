/// Represents timing config for [`OneWirePin`](crate::OneWirePin).
///
/// All values are in microseconds.
pub trait OneWireConfig {
    /// Reset pulse, line held low.
    const RESET_LOW_US: u16;
    /// Wait after releasing the line before sampling presence.
    const PRESENCE_WAIT_US: u16;
    /// Rest of the reset time slot after sampling presence.
    const RESET_RECOVERY_US: u16;
    /// Write 1 slot, line held low.
    const WRITE_ONE_LOW_US: u16;
    /// Write 1 slot, released part.
    const WRITE_ONE_RECOVERY_US: u16;
    /// Write 0 slot, line held low.
    const WRITE_ZERO_LOW_US: u16;
    /// Write 0 slot, released part.
    const WRITE_ZERO_RECOVERY_US: u16;
    /// Read slot, line held low.
    const READ_LOW_US: u16;
    /// Wait after release before sampling the line.
    const READ_SAMPLE_US: u16;
    /// Rest of the read slot.
    const READ_RECOVERY_US: u16;
}

/// Standard speed implementation of [`OneWireConfig`](crate::OneWireConfig).
pub struct DefaultOneWireConfig;

impl OneWireConfig for DefaultOneWireConfig {
    const RESET_LOW_US: u16 = 480;
    const PRESENCE_WAIT_US: u16 = 70;
    const RESET_RECOVERY_US: u16 = 410;
    const WRITE_ONE_LOW_US: u16 = 6;
    const WRITE_ONE_RECOVERY_US: u16 = 64;
    const WRITE_ZERO_LOW_US: u16 = 60;
    const WRITE_ZERO_RECOVERY_US: u16 = 10;
    const READ_LOW_US: u16 = 6;
    const READ_SAMPLE_US: u16 = 9;
    const READ_RECOVERY_US: u16 = 55;
}

/// Overdrive speed implementation of [`OneWireConfig`](crate::OneWireConfig).
///
/// Sub-microsecond slots are rounded up to 1 us.
pub struct OverdriveOneWireConfig;

impl OneWireConfig for OverdriveOneWireConfig {
    const RESET_LOW_US: u16 = 70;
    const PRESENCE_WAIT_US: u16 = 9;
    const RESET_RECOVERY_US: u16 = 40;
    const WRITE_ONE_LOW_US: u16 = 1;
    const WRITE_ONE_RECOVERY_US: u16 = 8;
    const WRITE_ZERO_LOW_US: u16 = 8;
    const WRITE_ZERO_RECOVERY_US: u16 = 3;
    const READ_LOW_US: u16 = 1;
    const READ_SAMPLE_US: u16 = 1;
    const READ_RECOVERY_US: u16 = 7;
}
