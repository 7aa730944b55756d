use crate::{
    config::{DefaultOneWireConfig, OneWireConfig, OverdriveOneWireConfig},
    consts::rom_commands,
    rom::{RomCode, RomData},
    Error,
};

use core::marker::PhantomData;
use embedded_hal::blocking::delay::DelayUs;
use switch_hal::{InputSwitch, OutputSwitch};

/// Represents 1-Wire bus master.
///
/// Bytes are transferred least significant bit first.
pub trait OneWire {
    /// Hardware error.
    type Error;

    /// Issue a reset pulse, returns `true` if any device answered with a presence pulse.
    fn reset(&mut self) -> Result<bool, Self::Error>;

    /// Write one time slot.
    fn write_bit(&mut self, bit: bool) -> Result<(), Self::Error>;

    /// Read one time slot.
    fn read_bit(&mut self) -> Result<bool, Self::Error>;

    /// Wait with the line released.
    fn delay_us(&mut self, us: u16);

    /// Write a byte.
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        for bit in 0..8 {
            self.write_bit(byte & (1 << bit) != 0)?;
        }

        Ok(())
    }

    /// Read a byte.
    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut byte = 0;

        for bit in 0..8 {
            if self.read_bit()? {
                byte |= 1 << bit;
            }
        }

        Ok(byte)
    }

    /// Write a slice.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        for byte in data.iter() {
            self.write_byte(*byte)?;
        }

        Ok(())
    }

    /// Read a slice.
    fn read_bytes(&mut self, data: &mut [u8]) -> Result<(), Self::Error> {
        for byte in data.iter_mut() {
            *byte = self.read_byte()?;
        }

        Ok(())
    }
}

impl<T: OneWire + ?Sized> OneWire for &mut T {
    type Error = T::Error;

    fn reset(&mut self) -> Result<bool, Self::Error> {
        (**self).reset()
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), Self::Error> {
        (**self).write_bit(bit)
    }

    fn read_bit(&mut self) -> Result<bool, Self::Error> {
        (**self).read_bit()
    }

    fn delay_us(&mut self, us: u16) {
        (**self).delay_us(us)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        (**self).write_byte(byte)
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        (**self).read_byte()
    }
}

/// Bit-banged 1-Wire master over an open-drain pin.
///
/// `Pin` - active-low switch: `on` drives the line low, `is_active` means the line is low.
/// `Delay` - microsecond delay.
/// `Config` - timing config.
pub struct OneWirePin<Pin, Delay, Config: OneWireConfig> {
    pin: Pin,
    delay: Delay,
    config: PhantomData<Config>,
}

impl<Pin, Delay, Config, E> OneWirePin<Pin, Delay, Config>
where
    Pin: OutputSwitch<Error = E> + InputSwitch<Error = E>,
    Delay: DelayUs<u16>,
    Config: OneWireConfig,
{
    /// Creates a new [`OneWirePin<Pin, Delay, Config>`] and releases the line.
    pub fn new(mut pin: Pin, delay: Delay) -> Result<Self, E> {
        pin.off()?;

        Ok(OneWirePin {
            pin,
            delay,
            config: PhantomData::<Config>,
        })
    }

    /// Returns the pin and delay.
    pub fn free(self) -> (Pin, Delay) {
        (self.pin, self.delay)
    }

    /// Change slot timings, the line is left as is.
    ///
    /// A standard speed reset returns all devices to standard speed.
    pub fn into_config<Other: OneWireConfig>(self) -> OneWirePin<Pin, Delay, Other> {
        OneWirePin {
            pin: self.pin,
            delay: self.delay,
            config: PhantomData::<Other>,
        }
    }

    /// Drive low for `low_us`, release, wait `release_us`.
    fn pulse(&mut self, low_us: u16, release_us: u16) -> Result<(), E> {
        self.pin.on()?;
        self.delay.delay_us(low_us);
        self.pin.off()?;
        self.delay.delay_us(release_us);

        Ok(())
    }
}

impl<Pin, Delay, E> OneWirePin<Pin, Delay, DefaultOneWireConfig>
where
    Pin: OutputSwitch<Error = E> + InputSwitch<Error = E>,
    Delay: DelayUs<u16>,
{
    /// Address all devices and switch the bus to overdrive speed.
    pub fn overdrive_skip_rom(
        mut self,
    ) -> Result<OneWirePin<Pin, Delay, OverdriveOneWireConfig>, Error<E>> {
        reset(&mut self)?;
        self.write_byte(rom_commands::OVERDRIVE_SKIP_ROM)
            .map_err(Error::Bus)?;

        debug!("1-Wire bus switched to overdrive");
        Ok(self.into_config())
    }

    /// Address one device at overdrive speed, the other devices stay at standard speed.
    pub fn overdrive_match_rom(
        mut self,
        rom: &RomCode,
    ) -> Result<OneWirePin<Pin, Delay, OverdriveOneWireConfig>, Error<E>> {
        reset(&mut self)?;
        self.write_byte(rom_commands::OVERDRIVE_MATCH_ROM)
            .map_err(Error::Bus)?;

        let mut bus = self.into_config::<OverdriveOneWireConfig>();
        bus.write_bytes(&rom.to_bytes()).map_err(Error::Bus)?;

        debug!("1-Wire device {:02X} switched to overdrive", rom.to_bytes());
        Ok(bus)
    }
}

impl<Pin, Delay, Config, E> OneWire for OneWirePin<Pin, Delay, Config>
where
    Pin: OutputSwitch<Error = E> + InputSwitch<Error = E>,
    Delay: DelayUs<u16>,
    Config: OneWireConfig,
{
    type Error = E;

    fn reset(&mut self) -> Result<bool, E> {
        self.pulse(Config::RESET_LOW_US, Config::PRESENCE_WAIT_US)?;
        let presence = self.pin.is_active()?;
        self.delay.delay_us(Config::RESET_RECOVERY_US);

        Ok(presence)
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), E> {
        if bit {
            self.pulse(Config::WRITE_ONE_LOW_US, Config::WRITE_ONE_RECOVERY_US)
        } else {
            self.pulse(Config::WRITE_ZERO_LOW_US, Config::WRITE_ZERO_RECOVERY_US)
        }
    }

    fn read_bit(&mut self) -> Result<bool, E> {
        self.pulse(Config::READ_LOW_US, Config::READ_SAMPLE_US)?;
        let low = self.pin.is_active()?;
        self.delay.delay_us(Config::READ_RECOVERY_US);

        Ok(!low)
    }

    fn delay_us(&mut self, us: u16) {
        self.delay.delay_us(us);
    }
}

/// Reset the bus and require a presence pulse.
pub fn reset<W: OneWire>(bus: &mut W) -> Result<(), Error<W::Error>> {
    if bus.reset().map_err(Error::Bus)? {
        Ok(())
    } else {
        warn!("No presence pulse on 1-Wire bus");
        Err(Error::NoPresence)
    }
}

/// Read the address of the only device on the bus.
pub fn read_rom<W: OneWire>(bus: &mut W) -> Result<RomCode, Error<W::Error>> {
    let mut bytes: RomData = [0; 8];

    reset(bus)?;
    bus.write_byte(rom_commands::READ_ROM).map_err(Error::Bus)?;
    bus.read_bytes(&mut bytes).map_err(Error::Bus)?;

    RomCode::from_bytes(bytes).validate()
}

/// Reset and address one device.
pub fn match_rom<W: OneWire>(bus: &mut W, rom: &RomCode) -> Result<(), Error<W::Error>> {
    reset(bus)?;
    bus.write_byte(rom_commands::MATCH_ROM).map_err(Error::Bus)?;
    bus.write_bytes(&rom.to_bytes()).map_err(Error::Bus)
}

/// Reset and address all devices.
pub fn skip_rom<W: OneWire>(bus: &mut W) -> Result<(), Error<W::Error>> {
    reset(bus)?;
    bus.write_byte(rom_commands::SKIP_ROM).map_err(Error::Bus)
}

/// Search type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SearchKind {
    /// All devices.
    Normal,
    /// Devices with an alarm condition.
    Alarm,
}

impl SearchKind {
    fn command(self) -> u8 {
        match self {
            SearchKind::Normal => rom_commands::SEARCH_ROM,
            SearchKind::Alarm => rom_commands::ALARM_SEARCH,
        }
    }
}

/// ROM search state.
///
/// Bit positions are 1-based, 0 means none.
#[derive(Debug, Clone)]
pub struct RomSearch {
    kind: SearchKind,
    rom: RomData,
    last_discrepancy: u8,
    last_family_discrepancy: u8,
    last_device: bool,
}

impl RomSearch {
    /// Count of ROM bits.
    const ROM_BITS: u8 = 64;

    /// Creates a new search from the first device.
    pub fn new(kind: SearchKind) -> Self {
        RomSearch {
            kind,
            rom: [0; 8],
            last_discrepancy: 0,
            last_family_discrepancy: 0,
            last_device: false,
        }
    }

    /// Creates a new search, that starts from the first device of `family`.
    ///
    /// The first found device is of another family if `family` is not on the bus.
    pub fn with_family(kind: SearchKind, family: u8) -> Self {
        let mut search = Self::new(kind);
        search.rom[0] = family;
        search.last_discrepancy = Self::ROM_BITS;
        search
    }

    /// Continue after the remaining devices of the last found family.
    pub fn skip_family(&mut self) {
        self.last_discrepancy = self.last_family_discrepancy;
        self.last_family_discrepancy = 0;

        if self.last_discrepancy == 0 {
            self.last_device = true;
        }
    }

    /// Restart from the first device.
    pub fn restart(&mut self) {
        *self = Self::new(self.kind);
    }

    /// Find the next device, `None` when all were found.
    pub fn next<W: OneWire>(&mut self, bus: &mut W) -> Result<Option<RomCode>, Error<W::Error>> {
        if self.last_device {
            return Ok(None);
        }

        if let Err(err) = reset(bus) {
            self.restart();
            return Err(err);
        }

        bus.write_byte(self.kind.command()).map_err(Error::Bus)?;

        let mut last_zero = 0;

        for id_bit_number in 1..=Self::ROM_BITS {
            let byte = usize::from((id_bit_number - 1) / 8);
            let mask = 1 << ((id_bit_number - 1) % 8);

            let id_bit = bus.read_bit().map_err(Error::Bus)?;
            let cmp_id_bit = bus.read_bit().map_err(Error::Bus)?;

            let direction = match (id_bit, cmp_id_bit) {
                (true, true) if id_bit_number == 1 => {
                    debug!("No device takes part in the search");
                    self.last_device = true;
                    return Ok(None);
                }
                (true, true) => {
                    error!("Device left the search at bit {=u8}", id_bit_number);
                    self.restart();
                    return Err(Error::NoDevice);
                }
                (false, false) => {
                    let direction = if id_bit_number < self.last_discrepancy {
                        self.rom[byte] & mask != 0
                    } else {
                        id_bit_number == self.last_discrepancy
                    };

                    if !direction {
                        last_zero = id_bit_number;
                        if last_zero < 9 {
                            self.last_family_discrepancy = last_zero;
                        }
                    }

                    direction
                }
                (bit, _) => bit,
            };

            if direction {
                self.rom[byte] |= mask;
            } else {
                self.rom[byte] &= !mask;
            }

            bus.write_bit(direction).map_err(Error::Bus)?;
        }

        self.last_discrepancy = last_zero;
        if self.last_discrepancy == 0 {
            self.last_device = true;
        }

        match RomCode::from_bytes(self.rom).validate() {
            Ok(rom) => {
                debug!("Found 1-Wire device: {:02X}", self.rom);
                Ok(Some(rom))
            }
            Err(err) => {
                self.restart();
                Err(err)
            }
        }
    }
}
