use crate::{
    bus::{match_rom, read_rom, reset, OneWire},
    consts::ds2413,
    rom::RomCode,
    Error,
};

use bitfield::bitfield;

bitfield! {
    /// DS2413 PIO status byte.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct PioStatus(u8);
    impl Debug;
    pub pio_a, _: 0;
    pub latch_a, _: 1;
    pub pio_b, _: 2;
    pub latch_b, _: 3;
    pub u8, state, _: 3, 0;
    pub u8, complement, _: 7, 4;
}

impl PioStatus {
    /// Upper nibble must be the complement of the lower one.
    pub fn is_valid(&self) -> bool {
        self.state() ^ self.complement() == 0x0F
    }

    /// Sensed pin level of `channel`.
    pub fn pin(&self, channel: Channel) -> bool {
        match channel {
            Channel::A => self.pio_a(),
            Channel::B => self.pio_b(),
        }
    }

    /// Output latch of `channel`, `false` means the output transistor conducts.
    pub fn latch(&self, channel: Channel) -> bool {
        match channel {
            Channel::A => self.latch_a(),
            Channel::B => self.latch_b(),
        }
    }
}

/// Switch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    A,
    B,
}

/// 1-Wire Switch click (DS2413) driver.
pub struct Ds2413<W: OneWire> {
    bus: W,
    rom: RomCode,
}

impl<W: OneWire> Ds2413<W> {
    /// Creates a new [`Ds2413<W>`] for the device at `rom`.
    pub fn new(bus: W, rom: RomCode) -> Result<Self, Error<W::Error>> {
        if rom.family() != ds2413::FAMILY_CODE {
            error!("Not a DS2413, family: 0x{=u8:02X}", rom.family());
            return Err(Error::InvalidFamily(rom.family()));
        }

        Ok(Ds2413 { bus, rom })
    }

    /// Creates a new [`Ds2413<W>`] for the only device on the bus.
    pub fn discover(mut bus: W) -> Result<Self, Error<W::Error>> {
        let rom = read_rom(&mut bus)?;
        info!("DS2413 found: {:02X}", rom.to_bytes());

        Self::new(bus, rom)
    }

    /// Device address.
    pub fn rom(&self) -> RomCode {
        self.rom
    }

    /// Returns the bus.
    pub fn free(self) -> W {
        self.bus
    }

    /// Validate status byte.
    fn check_status(byte: u8) -> Result<PioStatus, Error<W::Error>> {
        let status = PioStatus(byte);

        if status.is_valid() {
            Ok(status)
        } else {
            error!("DS2413 status complement mismatch: 0x{=u8:02X}", byte);
            Err(Error::ComplementMismatch(byte))
        }
    }

    /// Read pin levels and output latches.
    pub fn read_status(&mut self) -> Result<PioStatus, Error<W::Error>> {
        match_rom(&mut self.bus, &self.rom)?;
        self.bus
            .write_byte(ds2413::PIO_ACCESS_READ)
            .map_err(Error::Bus)?;
        let byte = self.bus.read_byte().map_err(Error::Bus)?;
        reset(&mut self.bus)?;

        Self::check_status(byte)
    }

    /// Write both output latches, `true` releases the output.
    pub fn write_latches(&mut self, a: bool, b: bool) -> Result<PioStatus, Error<W::Error>> {
        let value = ds2413::LATCH_UNUSED_BITS | (u8::from(b) << 1) | u8::from(a);

        match_rom(&mut self.bus, &self.rom)?;
        self.bus
            .write_bytes(&[ds2413::PIO_ACCESS_WRITE, value, !value])
            .map_err(Error::Bus)?;
        let confirmation = self.bus.read_byte().map_err(Error::Bus)?;
        let byte = self.bus.read_byte().map_err(Error::Bus)?;
        reset(&mut self.bus)?;

        if confirmation != ds2413::WRITE_CONFIRMATION {
            error!("DS2413 write not confirmed: 0x{=u8:02X}", confirmation);
            return Err(Error::WriteNotConfirmed(confirmation));
        }

        Self::check_status(byte)
    }

    /// Switch one channel, `on` makes the output transistor conduct.
    pub fn set_channel(&mut self, channel: Channel, on: bool) -> Result<PioStatus, Error<W::Error>> {
        let status = self.read_status()?;

        match channel {
            Channel::A => self.write_latches(!on, status.latch_b()),
            Channel::B => self.write_latches(status.latch_a(), !on),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::tests::ScriptedBus;
    use crate::consts::rom_commands;
    use std::vec::Vec;

    const ROM: [u8; 8] = [0x3A, 0x12, 0x34, 0x56, 0x78, 0x9A, 0x00, 0x0E];

    fn addressed(command: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::from([rom_commands::MATCH_ROM]);
        bytes.extend_from_slice(&ROM);
        bytes.extend_from_slice(command);
        bytes
    }

    fn switch(reads: &[u8]) -> Ds2413<ScriptedBus> {
        Ds2413::new(ScriptedBus::new(reads), RomCode::from_bytes(ROM)).unwrap()
    }

    #[test]
    fn status_bits() {
        let status = PioStatus(0x3C);
        assert!(status.is_valid());
        assert!(!status.pin(Channel::A));
        assert!(!status.latch(Channel::A));
        assert!(status.pin(Channel::B));
        assert!(status.latch(Channel::B));
        assert!(!PioStatus(0x33).is_valid());
    }

    #[test]
    fn rejects_other_family() {
        let rom = RomCode::new(0x28, 1);
        assert!(matches!(
            Ds2413::new(ScriptedBus::new(&[]), rom),
            Err(Error::InvalidFamily(0x28))
        ));
    }

    #[test]
    fn discover_reads_rom() {
        let switch = Ds2413::discover(ScriptedBus::new(&ROM)).unwrap();
        assert_eq!(switch.rom().to_bytes(), ROM);
        assert_eq!(switch.free().written, [rom_commands::READ_ROM]);
    }

    #[test]
    fn discover_rejects_corrupted_rom() {
        let mut rom = ROM;
        rom[3] ^= 0x10;
        assert!(matches!(
            Ds2413::discover(ScriptedBus::new(&rom)),
            Err(Error::CrcError(0x0E, _))
        ));
    }

    #[test]
    fn read_status() {
        let mut switch = switch(&[0xC3]);

        let status = switch.read_status().unwrap();
        assert_eq!(status.state(), 0b0011);
        assert!(status.pio_a());
        assert!(status.latch_a());
        assert!(!status.pio_b());

        let bus = switch.free();
        assert_eq!(bus.written, addressed(&[ds2413::PIO_ACCESS_READ]));
        assert_eq!(bus.resets, 2);
    }

    #[test]
    fn read_status_complement_mismatch() {
        let mut switch = switch(&[0x33]);
        assert_eq!(switch.read_status(), Err(Error::ComplementMismatch(0x33)));
        assert_eq!(switch.free().resets, 2);
    }

    #[test]
    fn write_latches() {
        let mut switch = switch(&[ds2413::WRITE_CONFIRMATION, 0x3C]);

        let status = switch.write_latches(false, true).unwrap();
        assert!(!status.latch_a());
        assert!(status.latch_b());
        assert_eq!(
            switch.free().written,
            addressed(&[ds2413::PIO_ACCESS_WRITE, 0xFE, 0x01])
        );
    }

    #[test]
    fn write_latches_not_confirmed() {
        let mut switch = switch(&[0xFF, 0xFF]);
        assert_eq!(
            switch.write_latches(true, true),
            Err(Error::WriteNotConfirmed(0xFF))
        );
    }

    #[test]
    fn set_channel_keeps_other_latch() {
        let mut switch = switch(&[0x0F]);
        switch.bus.push_reads(&[ds2413::WRITE_CONFIRMATION, 0x3C]);

        let status = switch.set_channel(Channel::A, true).unwrap();
        assert!(!status.latch(Channel::A));

        let bus = switch.free();
        let mut expected = addressed(&[ds2413::PIO_ACCESS_READ]);
        expected.extend(addressed(&[ds2413::PIO_ACCESS_WRITE, 0xFE, 0x01]));
        assert_eq!(bus.written, expected);
        assert_eq!(bus.unread(), 0);
    }

    #[test]
    fn no_presence() {
        let mut switch = Ds2413::new(ScriptedBus::absent(), RomCode::from_bytes(ROM)).unwrap();
        assert_eq!(switch.read_status(), Err(Error::NoPresence));
    }
}
