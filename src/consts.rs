pub mod rom_commands {
    /// READ ROM - read the address of the only device on the bus.
    pub const READ_ROM: u8 = 0x33;
    /// MATCH ROM - address one device, followed by its 8 ROM bytes.
    pub const MATCH_ROM: u8 = 0x55;
    /// SKIP ROM - address all devices.
    pub const SKIP_ROM: u8 = 0xCC;
    /// SEARCH ROM - enumerate all devices.
    pub const SEARCH_ROM: u8 = 0xF0;
    /// ALARM SEARCH - enumerate devices with an alarm condition.
    pub const ALARM_SEARCH: u8 = 0xEC;
    /// OVERDRIVE SKIP ROM - address all devices and switch them to overdrive speed.
    pub const OVERDRIVE_SKIP_ROM: u8 = 0x3C;
    /// OVERDRIVE MATCH ROM - switch to overdrive speed, followed by 8 ROM bytes at that speed.
    pub const OVERDRIVE_MATCH_ROM: u8 = 0x69;
}

pub mod ds2413 {
    /// DS2413 family code.
    pub const FAMILY_CODE: u8 = 0x3A;
    /// PIO ACCESS READ - device streams status bytes.
    pub const PIO_ACCESS_READ: u8 = 0xF5;
    /// PIO ACCESS WRITE - followed by the latch byte and its complement.
    pub const PIO_ACCESS_WRITE: u8 = 0x5A;
    /// Confirmation byte after a successful PIO write.
    pub const WRITE_CONFIRMATION: u8 = 0xAA;
    /// Unused latch bits must be written as ones.
    pub const LATCH_UNUSED_BITS: u8 = 0xFC;
}

pub mod clickid {
    /// READ MEMORY - followed by the page number.
    pub const READ_MEMORY: u8 = 0x69;
    /// WRITE MEMORY - followed by the page number.
    pub const WRITE_MEMORY: u8 = 0x96;
    /// Release byte, starts page programming.
    pub const RELEASE: u8 = 0xAA;
    /// Result byte of a successful page programming.
    pub const PROGRAM_SUCCESS: u8 = 0xAA;
    /// Page size.
    pub const PAGE_SIZE: usize = 32;
    /// Page count.
    pub const PAGE_COUNT: usize = 16;
    /// Page programming time, us.
    pub const PROGRAM_DELAY_US: u16 = 10_000;
    /// Page size, u64.
    pub const PAGE_SIZE_U64: u64 = PAGE_SIZE as u64;
}
