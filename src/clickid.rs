use crate::{
    bus::{match_rom, read_rom, OneWire},
    consts::clickid::{self, PAGE_COUNT, PAGE_SIZE, PAGE_SIZE_U64},
    crc::crc16_maxim,
    rom::RomCode,
    Error,
};

use core::cell::RefCell;
use diskio::{DiskioDevice, Error as DiskioError, IoctlCmd, Lba, Status, StatusFlag};
use size::Size;

/// Error type alias.
type ErrorFor<T> = <T as DiskioDevice>::HardwareError;

/// ClickID EEPROM driver.
///
/// Memory is exposed as a block device, one 32-byte page per block.
pub struct ClickId<W: OneWire> {
    bus: RefCell<W>,
    rom: RomCode,
    status: Status,
}

impl<W: OneWire> ClickId<W>
where
    W::Error: core::fmt::Debug,
{
    /// Creates a new [`ClickId<W>`], the device is addressed after [`DiskioDevice::initialize`].
    pub fn new(bus: W) -> Self {
        ClickId {
            bus: RefCell::new(bus),
            rom: RomCode::from_bytes([0; 8]),
            status: StatusFlag::NotInitialized.into(),
        }
    }

    /// Device address, all zeros before initialization.
    pub fn rom(&self) -> RomCode {
        self.rom
    }

    /// Memory size.
    pub fn capacity(&self) -> Size {
        Size::from_bytes(PAGE_COUNT as u64 * PAGE_SIZE_U64)
    }

    /// Returns the bus.
    pub fn free(self) -> W {
        self.bus.into_inner()
    }

    /// Read one page.
    pub fn read_page(&self, page: u8, data: &mut [u8; PAGE_SIZE]) -> Result<(), Error<W::Error>> {
        self.check_initialized()?;
        Self::validate_page(page)?;
        self.read_page_impl(page, data)
    }

    /// Write one page.
    pub fn write_page(&self, page: u8, data: &[u8; PAGE_SIZE]) -> Result<(), Error<W::Error>> {
        self.check_initialized()?;
        Self::validate_page(page)?;
        self.write_page_impl(page, data)
    }

    /// Validate page number.
    fn validate_page(page: u8) -> Result<(), Error<W::Error>> {
        if usize::from(page) < PAGE_COUNT {
            Ok(())
        } else {
            error!("ClickID invalid page: {=u8}, page count: {=usize}", page, PAGE_COUNT);
            Err(Error::InvalidPage(page))
        }
    }

    /// Validate buffer for read/write.
    fn validate_buffer_len(buf_len: usize) -> Result<(), DiskioError<ErrorFor<Self>>> {
        if buf_len == 0 || buf_len % PAGE_SIZE != 0 {
            error!(
                "ClickID invalid buffer, length: {=usize}, page size: {=usize}",
                buf_len,
                PAGE_SIZE
            );
            Err(DiskioError::InvalidArgument)
        } else {
            Ok(())
        }
    }

    /// Validate initialized.
    fn validate_initialized(&self) -> Result<(), DiskioError<ErrorFor<Self>>> {
        if self.status.contains(StatusFlag::NotInitialized) {
            Err(DiskioError::NotInitialized)
        } else {
            Ok(())
        }
    }

    /// Page API counterpart of [`Self::validate_initialized`].
    fn check_initialized(&self) -> Result<(), Error<W::Error>> {
        if self.status.contains(StatusFlag::NotInitialized) {
            error!("ClickID page access before initialize");
            Err(Error::NotInitialized)
        } else {
            Ok(())
        }
    }

    /// Convert lba to the first page, the whole range must fit the memory.
    fn convert_lba(lba: Lba, page_count: usize) -> Result<u8, DiskioError<ErrorFor<Self>>> {
        let first = usize::try_from(lba).map_err(|_| DiskioError::InvalidArgument)?;

        match first.checked_add(page_count) {
            Some(end) if end <= PAGE_COUNT => Ok(first as u8),
            _ => {
                error!(
                    "ClickID out of range, lba: {=usize}, pages: {=usize}",
                    first,
                    page_count
                );
                Err(DiskioError::InvalidArgument)
            }
        }
    }

    /// Address the device, run `f`, reset the bus.
    ///
    /// The error of `f` takes precedence over the error of the final reset.
    fn transaction<F>(&self, f: F) -> Result<(), Error<W::Error>>
    where
        F: FnOnce(&mut W) -> Result<(), Error<W::Error>>,
    {
        let mut bus = self.bus.borrow_mut();

        match_rom(&mut *bus, &self.rom)?;
        let result = f(&mut *bus);
        let reset = crate::bus::reset(&mut *bus);

        result.and(reset)
    }

    /// Receive CRC-16, least significant byte first.
    fn receive_crc(bus: &mut W) -> Result<u16, Error<W::Error>> {
        let mut crc = [0; 2];
        bus.read_bytes(&mut crc).map_err(Error::Bus)?;

        Ok(u16::from_le_bytes(crc))
    }

    /// Compare received CRC-16 with the one computed over `data`.
    fn check_crc(received: u16, data: &[u8]) -> Result<(), Error<W::Error>> {
        let computed = crc16_maxim(data);

        if received != computed {
            error!(
                "ClickID CRC mismatch, received: 0x{=u16:04X}, computed: 0x{=u16:04X}",
                received,
                computed
            );
            Err(Error::CrcError(received, computed))
        } else {
            Ok(())
        }
    }

    /// Send memory command, the device echoes its CRC-16.
    fn send_command(bus: &mut W, cmd: u8, page: u8) -> Result<(), Error<W::Error>> {
        let command = [cmd, page];

        bus.write_bytes(&command).map_err(Error::Bus)?;
        let echo = Self::receive_crc(bus)?;

        Self::check_crc(echo, &command)
    }

    /// Read page implementation.
    fn read_page_impl(&self, page: u8, data: &mut [u8]) -> Result<(), Error<W::Error>> {
        trace!("ClickID read page {=u8}", page);

        self.transaction(|bus| {
            Self::send_command(bus, clickid::READ_MEMORY, page)?;
            bus.read_bytes(data).map_err(Error::Bus)?;
            let crc = Self::receive_crc(bus)?;

            Self::check_crc(crc, data)
        })
    }

    /// Write page implementation.
    fn write_page_impl(&self, page: u8, data: &[u8]) -> Result<(), Error<W::Error>> {
        trace!("ClickID write page {=u8}", page);

        self.transaction(|bus| {
            Self::send_command(bus, clickid::WRITE_MEMORY, page)?;
            bus.write_bytes(data).map_err(Error::Bus)?;
            let crc = Self::receive_crc(bus)?;
            Self::check_crc(crc, data)?;

            bus.write_byte(clickid::RELEASE).map_err(Error::Bus)?;
            bus.delay_us(clickid::PROGRAM_DELAY_US);

            let result = bus.read_byte().map_err(Error::Bus)?;
            if result != clickid::PROGRAM_SUCCESS {
                error!("ClickID page {=u8} not programmed: 0x{=u8:02X}", page, result);
                return Err(Error::WriteNotConfirmed(result));
            }

            Ok(())
        })
    }

    /// Initialize ClickID.
    fn init(&mut self) -> Result<(), ErrorFor<Self>> {
        info!("ClickID initialize started");

        let result = read_rom(self.bus.get_mut());

        self.status = match &result {
            Ok(rom) => {
                self.rom = *rom;
                info!(
                    "ClickID successfully initialized, rom: {:02X}, capacity: {=u64}",
                    rom.to_bytes(),
                    PAGE_COUNT as u64 * PAGE_SIZE_U64
                );
                Status::default()
            }
            Err(_) => {
                error!("Failed to initialize ClickID");
                StatusFlag::ErrorOccured | StatusFlag::NotInitialized
            }
        };

        result.map(|_| ())
    }
}

impl<W: OneWire> DiskioDevice for ClickId<W>
where
    W::Error: core::fmt::Debug,
{
    type HardwareError = Error<W::Error>;

    fn status(&self) -> Status {
        self.status
    }

    fn reset(&mut self) {
        info!("ClickID reset invoked");
        self.status = StatusFlag::NotInitialized.into();
    }

    fn initialize(&mut self) -> Result<(), DiskioError<Self::HardwareError>> {
        if !self.status.contains(StatusFlag::NotInitialized) {
            warn!("ClickID already is initialized");
            return Err(DiskioError::AlreadyInitialized);
        }

        self.init().map_err(DiskioError::Hardware)
    }

    fn read(&self, buf: &mut [u8], lba: Lba) -> Result<(), DiskioError<Self::HardwareError>> {
        Self::validate_buffer_len(buf.len())?;
        self.validate_initialized()?;

        let first = Self::convert_lba(lba, buf.len() / PAGE_SIZE)?;

        for (page, chunk) in (first..).zip(buf.chunks_mut(PAGE_SIZE)) {
            self.read_page_impl(page, chunk)
                .map_err(DiskioError::Hardware)?;
        }

        Ok(())
    }

    fn write(&self, buf: &[u8], lba: Lba) -> Result<(), DiskioError<Self::HardwareError>> {
        Self::validate_buffer_len(buf.len())?;
        self.validate_initialized()?;

        let first = Self::convert_lba(lba, buf.len() / PAGE_SIZE)?;

        for (page, chunk) in (first..).zip(buf.chunks(PAGE_SIZE)) {
            self.write_page_impl(page, chunk)
                .map_err(DiskioError::Hardware)?;
        }

        Ok(())
    }

    fn ioctl(&self, cmd: IoctlCmd) -> Result<(), DiskioError<Self::HardwareError>> {
        match cmd {
            IoctlCmd::CtrlSync => Ok(()),
            IoctlCmd::GetBlockSize(block_size) => {
                *block_size = PAGE_SIZE;
                Ok(())
            }
            _ => Err(DiskioError::NotSupported),
        }
    }
}
