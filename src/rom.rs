use crate::{crc::crc8_maxim, Error};

use bitfield::bitfield;

/// ROM address bytes in wire order.
pub type RomData = [u8; 8];

bitfield! {
    /// 1-Wire ROM address: family code, 48-bit serial number and CRC-8.
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RomCode(u64);
    impl Debug;
    pub u8, family, _: 7, 0;
    pub u64, serial, _: 55, 8;
    pub u8, crc, _: 63, 56;
}

impl RomCode {
    /// Creates a ROM address from family code and serial number, with a matching CRC.
    pub fn new(family: u8, serial: u64) -> Self {
        let mut bytes = ((serial & 0xFFFF_FFFF_FFFF) << 8 | u64::from(family)).to_le_bytes();
        bytes[7] = crc8_maxim(&bytes[..7]);
        Self::from_bytes(bytes)
    }

    /// Creates a ROM address from bytes as received on the bus.
    pub fn from_bytes(bytes: RomData) -> Self {
        RomCode(u64::from_le_bytes(bytes))
    }

    /// Returns the bytes in bus order.
    pub fn to_bytes(&self) -> RomData {
        self.0.to_le_bytes()
    }

    /// Checks the CRC byte against the preceding 7 bytes.
    pub fn is_valid(&self) -> bool {
        let bytes = self.to_bytes();
        crc8_maxim(&bytes[..7]) == bytes[7]
    }

    /// Validate the address read from the bus.
    ///
    /// An all-zero address passes the CRC but means nothing answered.
    pub fn validate<E>(self) -> Result<Self, Error<E>> {
        if self.0 == 0 {
            return Err(Error::NoDevice);
        }

        let bytes = self.to_bytes();
        let computed = crc8_maxim(&bytes[..7]);

        if computed != bytes[7] {
            error!(
                "ROM CRC mismatch, received: 0x{=u8:02X}, computed: 0x{=u8:02X}",
                bytes[7],
                computed
            );
            Err(Error::CrcError(u16::from(bytes[7]), u16::from(computed)))
        } else {
            Ok(self)
        }
    }
}

impl From<RomData> for RomCode {
    fn from(bytes: RomData) -> Self {
        RomCode::from_bytes(bytes)
    }
}

impl From<RomCode> for RomData {
    fn from(rom: RomCode) -> Self {
        rom.to_bytes()
    }
}
