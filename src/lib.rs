//! Maxim/Dallas 1-Wire Library written in Embedded Rust.
//!
//! This crate is intended to share the 1-Wire CRC-8/CRC-16 routines between Click board
//! drivers, and to talk to the boards themselves:
//!
//! - [`crc8_maxim`] and [`crc16_maxim`] - bit-serial checksums, no lookup table.
//! - [`OneWire`] - bus master seam, [`OneWirePin`] bit-bangs it over an open-drain pin.
//! - [`RomCode`] and ROM commands, including [`RomSearch`].
//! - [`Ds2413`] - 1-Wire Switch click.
//! - [`ClickId`] - ClickID EEPROM as a block device.
//!
//! Logging goes through `defmt` when the `defmt` feature is enabled.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

mod bus;
mod clickid;
mod config;
mod consts;
mod crc;
mod rom;
mod switch;

pub use crate::bus::{match_rom, read_rom, reset, skip_rom, OneWire, OneWirePin, RomSearch, SearchKind};
pub use crate::clickid::ClickId;
pub use crate::config::{DefaultOneWireConfig, OneWireConfig, OverdriveOneWireConfig};
pub use crate::crc::{
    crc16_maxim, crc16_maxim_finish, crc16_maxim_update, crc8_maxim, crc8_maxim_update,
    reflect_bits,
};
pub use crate::rom::{RomCode, RomData};
pub use crate::switch::{Channel, Ds2413, PioStatus};
pub use diskio::{BlockSize, DiskioDevice, Error as DiskioError, IoctlCmd, Lba, Status, StatusFlag};

/// Driver result error.
///
/// `E` - bus hardware error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Error from the bus master.
    Bus(E),
    /// No presence pulse after reset.
    NoPresence,
    /// Nothing answered, the bus reads all ones or all zeros.
    NoDevice,
    /// CRC mismatch (received, computed).
    CrcError(u16, u16),
    /// Device of unexpected family.
    InvalidFamily(u8),
    /// Status byte fails its complement check.
    ComplementMismatch(u8),
    /// Device did not confirm a write.
    WriteNotConfirmed(u8),
    /// Page number out of range.
    InvalidPage(u8),
    /// Device is used before it was initialized.
    NotInitialized,
}
