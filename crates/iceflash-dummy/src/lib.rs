//! iceflash-dummy - In-memory flash emulator for testing
//!
//! This crate provides a dummy transport that emulates a SPI NOR flash chip
//! in memory. It follows the chip's rules closely enough to catch protocol
//! mistakes: commands are executed when chip select is released, program
//! and erase need the write-enable latch, the chip reports busy for a while
//! after each program or erase and ignores commands until it is ready, and
//! a powered-down chip only answers the wake-up command.
//!
//! Faults can be injected to exercise the retry and validation paths.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use iceflash_core::error::TransportError;
use iceflash_core::spi::{Opcode, StatusFlags, ADDRESS_BYTES};
use iceflash_core::transport::SpiTransport;

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Flash size in bytes
    pub size: usize,
    /// Page size for programming
    pub page_size: usize,
    /// Sector size for sector erase
    pub sector_size: usize,
    /// Status reads that report busy after a page program
    pub program_busy_polls: u32,
    /// Status reads that report busy after a sector erase
    pub sector_erase_busy_polls: u32,
    /// Status reads that report busy after a chip erase
    pub chip_erase_busy_polls: u32,
    /// Start in deep power-down, answering nothing until woken
    pub powered_down: bool,
    /// Actually sleep in `delay_us` instead of only advancing the clock
    #[cfg(feature = "std")]
    pub real_delays: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            size: 16 * 1024 * 1024,
            page_size: 256,
            sector_size: 4096,
            program_busy_polls: 1,
            sector_erase_busy_polls: 3,
            chip_erase_busy_polls: 10,
            powered_down: false,
            #[cfg(feature = "std")]
            real_delays: false,
        }
    }
}

/// One recorded call on the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    /// `transmit`
    Transmit {
        /// Bytes clocked out
        bytes: Vec<u8>,
        /// Whether chip select was released
        end: bool,
    },
    /// `receive`
    Receive {
        /// Bytes clocked in
        count: usize,
        /// Whether chip select was released
        end: bool,
    },
}

/// One complete chip-select cycle as seen by the chip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// First byte of the transaction
    pub opcode: u8,
    /// Address, for addressed commands
    pub address: Option<u32>,
    /// Bytes written after the opcode and address
    pub payload_len: usize,
    /// Bytes read back
    pub read_len: usize,
    /// Whether the chip ignored the command
    pub ignored: bool,
}

/// Injected fault
#[derive(Debug, Clone, PartialEq, Eq)]
enum Fault {
    /// The next `remaining` programs of `address` read back with bit 0 inverted
    WeakCell { address: usize, remaining: u32 },
    /// Programming `trigger` also clears `victim`
    Disturb { trigger: usize, victim: usize },
}

/// Dummy flash transport
///
/// Emulates a flash chip in memory for testing purposes.
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    write_enabled: bool,
    busy_polls: u32,
    stuck_busy: bool,
    powered_down: bool,
    faults: Vec<Fault>,
    fail_at: Option<(usize, TransportError)>,

    /// Bytes clocked out in the current transaction
    pending: Vec<u8>,
    /// Bytes clocked in during the current transaction
    read_len: usize,

    transfers: Vec<Transfer>,
    transactions: Vec<Transaction>,
    elapsed_us: u64,
}

impl DummyFlash {
    /// Create a new erased dummy flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        let powered_down = config.powered_down;
        Self {
            config,
            data,
            write_enabled: false,
            busy_polls: 0,
            stuck_busy: false,
            powered_down,
            faults: Vec::new(),
            fail_at: None,
            pending: Vec::new(),
            read_len: 0,
            transfers: Vec::new(),
            transactions: Vec::new(),
            elapsed_us: 0,
        }
    }

    /// Create a new dummy flash with default configuration (16 MiB, 4 KiB sectors)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy flash with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Every call made on the transport, in order
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Every completed transaction, in order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Addresses of executed transactions with the given opcode
    pub fn addresses_for(&self, opcode: Opcode) -> Vec<u32> {
        self.transactions
            .iter()
            .filter(|t| t.opcode == opcode.byte() && !t.ignored)
            .filter_map(|t| t.address)
            .collect()
    }

    /// Number of transactions that the chip ignored
    pub fn ignored_commands(&self) -> usize {
        self.transactions.iter().filter(|t| t.ignored).count()
    }

    /// Forget the recorded transfers and transactions
    pub fn clear_log(&mut self) {
        self.transfers.clear();
        self.transactions.clear();
    }

    /// Total time requested through `delay_us`
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    /// Keep the busy bit set forever
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Whether the chip is in deep power-down
    pub fn is_powered_down(&self) -> bool {
        self.powered_down
    }

    /// Make the next `times` programs of `address` read back corrupted
    ///
    /// Use `u32::MAX` for a cell that never programs correctly.
    pub fn inject_weak_cell(&mut self, address: usize, times: u32) {
        self.faults.push(Fault::WeakCell {
            address,
            remaining: times,
        });
    }

    /// Make every program of `trigger` also clear the byte at `victim`
    pub fn inject_disturb(&mut self, trigger: usize, victim: usize) {
        self.faults.push(Fault::Disturb { trigger, victim });
    }

    /// Fail the transfer with index `index` (and all later ones) with `error`
    pub fn fail_transfer_at(&mut self, index: usize, error: TransportError) {
        self.fail_at = Some((index, error));
    }

    fn check_fail(&self) -> Result<(), TransportError> {
        match self.fail_at {
            Some((index, error)) if self.transfers.len() >= index => Err(error),
            _ => Ok(()),
        }
    }

    fn is_busy(&self) -> bool {
        self.stuck_busy || self.busy_polls > 0
    }

    fn status(&self) -> u8 {
        let mut status = StatusFlags::empty();
        status.set(StatusFlags::BUSY, self.is_busy());
        status.set(StatusFlags::WEL, self.write_enabled);
        status.bits()
    }

    fn pending_address(&self) -> Option<usize> {
        let bytes = self.pending.get(1..1 + ADDRESS_BYTES)?;
        Some(((bytes[0] as usize) << 16) | ((bytes[1] as usize) << 8) | bytes[2] as usize)
    }

    /// Produce `count` bytes for a receive inside the current transaction
    fn clock_in(&mut self, count: usize) -> Vec<u8> {
        // Nothing drives MISO: the line floats high
        let floating = vec![0xFF; count];

        if self.powered_down {
            return floating;
        }

        match self.pending.first().copied().and_then(Opcode::from_byte) {
            Some(Opcode::ReadStatus) => {
                let mut out = Vec::with_capacity(count);
                for _ in 0..count {
                    out.push(self.status());
                    self.busy_polls = self.busy_polls.saturating_sub(1);
                }
                out
            }
            Some(Opcode::Read) if !self.is_busy() => match self.pending_address() {
                Some(address) => (0..count)
                    .map(|i| self.data[(address + self.read_len + i) % self.data.len()])
                    .collect(),
                None => floating,
            },
            Some(Opcode::Read) => {
                log::warn!("dummy: READ while busy, ignored");
                floating
            }
            _ => floating,
        }
    }

    /// Execute the current transaction when chip select is released
    fn end_transaction(&mut self) {
        let Some(&opcode) = self.pending.first() else {
            return;
        };
        let address = self.pending_address();
        let payload_start = (1 + ADDRESS_BYTES).min(self.pending.len());

        let ignored = !self.execute(opcode, address);

        self.transactions.push(Transaction {
            opcode,
            address: address.map(|a| a as u32).filter(|_| {
                Opcode::from_byte(opcode).is_some_and(Opcode::has_address)
            }),
            payload_len: self.pending.len() - payload_start,
            read_len: self.read_len,
            ignored,
        });

        self.pending.clear();
        self.read_len = 0;
    }

    /// Returns false if the chip ignored the command
    fn execute(&mut self, opcode: u8, address: Option<usize>) -> bool {
        let op = Opcode::from_byte(opcode);

        if op == Some(Opcode::WakeUp) {
            self.powered_down = false;
            return true;
        }
        if self.powered_down {
            log::warn!("dummy: 0x{:02X} while powered down, ignored", opcode);
            return false;
        }
        if op == Some(Opcode::ReadStatus) {
            return true;
        }
        if self.is_busy() {
            log::warn!("dummy: 0x{:02X} while busy, ignored", opcode);
            return false;
        }

        match op {
            Some(Opcode::WriteEnable) => {
                self.write_enabled = true;
                true
            }
            Some(Opcode::Read) => true,
            Some(Opcode::PageProgram) => match address {
                Some(address) if self.take_write_enable() => {
                    self.program(address);
                    self.busy_polls = self.config.program_busy_polls;
                    true
                }
                _ => false,
            },
            Some(Opcode::SectorErase) => match address {
                Some(address) if self.take_write_enable() => {
                    let size = self.config.sector_size;
                    let start = (address % self.data.len()) & !(size - 1);
                    self.data[start..start + size].fill(0xFF);
                    self.busy_polls = self.config.sector_erase_busy_polls;
                    true
                }
                _ => false,
            },
            Some(Opcode::ChipErase) if self.take_write_enable() => {
                self.data.fill(0xFF);
                self.busy_polls = self.config.chip_erase_busy_polls;
                true
            }
            _ => {
                log::warn!("dummy: command 0x{:02X} ignored", opcode);
                false
            }
        }
    }

    fn take_write_enable(&mut self) -> bool {
        if !self.write_enabled {
            log::warn!("dummy: write enable latch not set, command ignored");
            return false;
        }
        self.write_enabled = false;
        true
    }

    /// Page program: bits can only go 1 -> 0 and the address wraps inside the page
    fn program(&mut self, address: usize) {
        let page = self.config.page_size;
        let address = address % self.data.len();
        let page_base = address & !(page - 1);
        let payload = self.pending[1 + ADDRESS_BYTES..].to_vec();

        for (i, &byte) in payload.iter().take(page).enumerate() {
            let target = page_base + (address - page_base + i) % page;
            self.data[target] &= byte;

            for fault in &mut self.faults {
                match fault {
                    Fault::WeakCell {
                        address,
                        remaining,
                    } if *address == target && *remaining > 0 => {
                        self.data[target] ^= 0x01;
                        *remaining -= 1;
                    }
                    Fault::Disturb { trigger, victim } if *trigger == target => {
                        self.data[*victim] = 0x00;
                    }
                    _ => {}
                }
            }
        }
    }
}

impl SpiTransport for DummyFlash {
    fn transmit(&mut self, bytes: &[u8], end_transaction: bool) -> Result<(), TransportError> {
        self.check_fail()?;
        self.transfers.push(Transfer::Transmit {
            bytes: bytes.to_vec(),
            end: end_transaction,
        });

        self.pending.extend_from_slice(bytes);
        if end_transaction {
            self.end_transaction();
        }
        Ok(())
    }

    fn receive(&mut self, count: usize, end_transaction: bool) -> Result<Vec<u8>, TransportError> {
        self.check_fail()?;
        self.transfers.push(Transfer::Receive {
            count,
            end: end_transaction,
        });

        let data = self.clock_in(count);
        self.read_len += count;
        if end_transaction {
            self.end_transaction();
        }
        Ok(data)
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += us as u64;
        #[cfg(feature = "std")]
        if self.config.real_delays {
            std::thread::sleep(std::time::Duration::from_micros(us as u64));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use iceflash_core::error::{Error, InvalidInput, PendingOp};
    use iceflash_core::flash::FlashProgrammer;
    use iceflash_core::geometry::FlashGeometry;
    use iceflash_core::protocol;

    const SIZE: usize = 64 * 1024;

    fn geometry() -> FlashGeometry {
        FlashGeometry {
            capacity: SIZE as u32,
            max_read_chunk: 8192,
            ..Default::default()
        }
    }

    fn small_flash() -> DummyFlash {
        DummyFlash::new(DummyConfig {
            size: SIZE,
            ..Default::default()
        })
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + i / 256) as u8).collect()
    }

    /// Wake, erase, program and validate like a full session
    fn flash_image(flash: &mut DummyFlash, image: &[u8]) -> iceflash_core::Result<()> {
        let mut programmer = FlashProgrammer::new(flash, geometry())?;
        programmer.wake_up()?;
        programmer.erase_chip()?;
        programmer.program(image)?;
        programmer.validate(image)
    }

    // Emulator behaviour

    #[test]
    fn test_program_requires_write_enable() {
        let mut flash = small_flash();

        flash.transmit(&[0x02, 0x00, 0x00, 0x00], false).unwrap();
        flash.transmit(&[0x00; 4], true).unwrap();

        assert_eq!(&flash.data()[..4], &[0xFF; 4]);
        assert_eq!(flash.ignored_commands(), 1);
    }

    #[test]
    fn test_program_only_clears_bits() {
        let mut flash = small_flash();
        protocol::program_page(&mut flash, 0, &[0xF0]).unwrap();
        flash.busy_polls = 0;
        protocol::program_page(&mut flash, 0, &[0x3C]).unwrap();
        assert_eq!(flash.data()[0], 0x30);
    }

    #[test]
    fn test_program_wraps_within_page() {
        let mut flash = small_flash();
        protocol::program_page(&mut flash, 254, &[1, 2, 3, 4]).unwrap();

        assert_eq!(&flash.data()[254..256], &[1, 2]);
        assert_eq!(&flash.data()[0..2], &[3, 4]);
        assert_eq!(flash.data()[256], 0xFF);
    }

    #[test]
    fn test_busy_chip_ignores_commands() {
        let mut flash = small_flash();
        protocol::program_page(&mut flash, 0, &[0x00]).unwrap();

        // Still busy: the erase is dropped
        protocol::erase_sector(&mut flash, 0).unwrap();
        assert_eq!(flash.data()[0], 0x00);

        let status = protocol::read_status(&mut flash).unwrap();
        assert!(status.contains(StatusFlags::BUSY));
        assert!(protocol::read_status(&mut flash).unwrap().is_ready());

        protocol::erase_sector(&mut flash, 0).unwrap();
        assert_eq!(flash.data()[0], 0xFF);
    }

    #[test]
    fn test_sector_erase_is_aligned() {
        let mut flash = DummyFlash::with_data(
            DummyConfig {
                size: SIZE,
                ..Default::default()
            },
            &[0u8; SIZE],
        );
        protocol::erase_sector(&mut flash, 4096 + 100).unwrap();

        assert_eq!(flash.data()[4095], 0x00);
        assert!(flash.data()[4096..8192].iter().all(|&b| b == 0xFF));
        assert_eq!(flash.data()[8192], 0x00);
    }

    #[test]
    fn test_read_across_receives() {
        let mut flash = DummyFlash::with_data(
            DummyConfig {
                size: SIZE,
                ..Default::default()
            },
            &[1, 2, 3, 4, 5, 6],
        );
        flash.transmit(&[0x03, 0x00, 0x00, 0x01], false).unwrap();
        assert_eq!(flash.receive(2, false).unwrap(), vec![2, 3]);
        assert_eq!(flash.receive(3, true).unwrap(), vec![4, 5, 6]);

        let tx = &flash.transactions()[0];
        assert_eq!(tx.address, Some(1));
        assert_eq!(tx.read_len, 5);
    }

    #[test]
    fn test_powered_down_until_woken() {
        let mut flash = DummyFlash::new(DummyConfig {
            size: SIZE,
            powered_down: true,
            ..Default::default()
        });

        // Floating MISO reads as busy
        assert!(!protocol::read_status(&mut flash).unwrap().is_ready());
        protocol::wake_up(&mut flash).unwrap();
        assert!(!flash.is_powered_down());
        assert!(protocol::read_status(&mut flash).unwrap().is_ready());
    }

    #[test]
    fn test_transport_fault_injection() {
        let mut flash = small_flash();
        flash.fail_transfer_at(
            1,
            TransportError::ShortTransfer {
                requested: 1,
                transferred: 0,
            },
        );

        protocol::write_enable(&mut flash).unwrap();
        assert!(matches!(
            protocol::read_status(&mut flash),
            Err(Error::Transport(TransportError::ShortTransfer { .. }))
        ));
    }

    // End-to-end through the programmer

    #[test]
    fn test_round_trip_partial_last_sector() {
        let mut flash = small_flash();
        let image = pattern(2 * 4096 + 1234);

        flash_image(&mut flash, &image).unwrap();

        assert_eq!(&flash.data()[..image.len()], &image[..]);
        assert!(flash.data()[image.len()..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_one_byte_past_sector_uses_two_sectors() {
        let mut flash = small_flash();
        let image = pattern(4097);

        let stats = FlashProgrammer::new(&mut flash, geometry())
            .unwrap()
            .program(&image)
            .unwrap();

        assert_eq!(stats.sectors, 2);
        assert_eq!(stats.pages_programmed, 16 + 1);
        let pages = flash.addresses_for(Opcode::PageProgram);
        assert_eq!(pages.last(), Some(&4096));
        assert_eq!(flash.transactions().iter().filter(|t| t.payload_len == 1).count(), 1);
    }

    #[test]
    fn test_four_page_image_page_addresses() {
        let mut flash = small_flash();
        let image = pattern(1024);

        FlashProgrammer::new(&mut flash, geometry())
            .unwrap()
            .program(&image)
            .unwrap();

        assert_eq!(
            flash.addresses_for(Opcode::PageProgram),
            vec![0, 256, 512, 768]
        );
    }

    #[test]
    fn test_weak_cell_exhausts_attempts() {
        let mut flash = small_flash();
        let image = pattern(3 * 4096);
        flash.inject_weak_cell(4096 + 17, u32::MAX);

        let err = flash_image(&mut flash, &image).unwrap_err();
        assert_eq!(
            err,
            Error::CorruptedUpload {
                sector: Some(1),
                mismatches: 1,
                first_mismatch: Some(4096 + 17)
            }
        );

        let pages = flash.addresses_for(Opcode::PageProgram);
        // Five full passes over sector 1, nothing in sector 2
        assert_eq!(pages.iter().filter(|&&a| a == 4096).count(), 5);
        assert!(pages.iter().all(|&a| a < 2 * 4096));
        assert_eq!(flash.addresses_for(Opcode::SectorErase), vec![4096; 4]);
    }

    #[test]
    fn test_transient_weak_cell_recovers() {
        let mut flash = small_flash();
        let image = pattern(2 * 4096);
        flash.inject_weak_cell(100, 2);

        let mut programmer = FlashProgrammer::new(&mut flash, geometry()).unwrap();
        programmer.erase_chip().unwrap();
        let stats = programmer.program(&image).unwrap();
        programmer.validate(&image).unwrap();

        assert_eq!(stats.sectors, 2);
        assert_eq!(stats.sectors_retried, 1);
        assert_eq!(stats.retry_erases, 2);
        assert_eq!(&flash.data()[..image.len()], &image[..]);
    }

    #[test]
    fn test_validate_is_read_only_and_repeatable() {
        let mut flash = small_flash();
        let image = pattern(5000);
        flash_image(&mut flash, &image).unwrap();
        flash.clear_log();

        let mut programmer = FlashProgrammer::new(&mut flash, geometry()).unwrap();
        programmer.validate(&image).unwrap();
        programmer.validate(&image).unwrap();

        assert!(flash
            .transactions()
            .iter()
            .all(|t| t.opcode == Opcode::Read.byte()));
    }

    #[test]
    fn test_validate_chunk_sizes() {
        let mut flash = small_flash();
        let image = pattern(2 * 8192 + 3);
        flash_image(&mut flash, &image).unwrap();
        flash.clear_log();

        FlashProgrammer::new(&mut flash, geometry())
            .unwrap()
            .validate(&image)
            .unwrap();

        let reads: Vec<(Option<u32>, usize)> = flash
            .transactions()
            .iter()
            .map(|t| (t.address, t.read_len))
            .collect();
        assert_eq!(
            reads,
            vec![(Some(0), 8192), (Some(8192), 8192), (Some(16384), 3)]
        );

        let mut chunks = Vec::new();
        let readback =
            protocol::read_chunked(&mut flash, 0, image.len(), 8192, |done| chunks.push(done))
                .unwrap();
        assert_eq!(chunks, vec![8192, 16384, 16387]);
        assert_eq!(readback, image);
    }

    #[test]
    fn test_validate_reports_corruption() {
        let mut flash = small_flash();
        let image = pattern(3000);
        flash_image(&mut flash, &image).unwrap();
        flash.data_mut()[2000] ^= 0xFF;

        let err = FlashProgrammer::new(&mut flash, geometry())
            .unwrap()
            .validate(&image)
            .unwrap_err();
        assert_eq!(
            err,
            Error::CorruptedUpload {
                sector: None,
                mismatches: 1,
                first_mismatch: Some(2000)
            }
        );
    }

    #[test]
    fn test_cross_sector_disturb_caught_by_validation() {
        let mut flash = small_flash();
        let image = pattern(2 * 4096);
        // Programming sector 1 damages a byte of sector 0 after it was verified
        let victim = (0..4096).find(|&i| image[i] != 0x00).unwrap_or(0);
        flash.inject_disturb(4096 + 10, victim);

        let mut programmer = FlashProgrammer::new(&mut flash, geometry()).unwrap();
        programmer.erase_chip().unwrap();
        let stats = programmer.program(&image).unwrap();
        assert_eq!(stats.retry_erases, 0);

        assert_eq!(
            programmer.validate(&image),
            Err(Error::CorruptedUpload {
                sector: None,
                mismatches: 1,
                first_mismatch: Some(victim as u32)
            })
        );
    }

    #[test]
    fn test_empty_image_rejected_without_bus_activity() {
        let mut flash = small_flash();
        let mut programmer = FlashProgrammer::new(&mut flash, geometry()).unwrap();

        assert_eq!(
            programmer.program(&[]),
            Err(Error::InvalidInput(InvalidInput::EmptyImage))
        );
        assert_eq!(
            programmer.validate(&[]),
            Err(Error::InvalidInput(InvalidInput::EmptyImage))
        );
        assert!(flash.transfers().is_empty());
    }

    #[test]
    fn test_missing_wake_up_times_out() {
        let mut flash = DummyFlash::new(DummyConfig {
            size: SIZE,
            powered_down: true,
            ..Default::default()
        });
        let geometry = FlashGeometry {
            chip_erase_timeout_ms: 50,
            ..geometry()
        };

        let mut programmer = FlashProgrammer::new(&mut flash, geometry).unwrap();
        assert_eq!(
            programmer.erase_chip(),
            Err(Error::Timeout {
                op: PendingOp::ChipErase,
                address: 0,
                waited_ms: 50
            })
        );

        programmer.wake_up().unwrap();
        programmer.erase_chip().unwrap();
    }

    #[test]
    fn test_stuck_busy_times_out_in_real_time() {
        let mut flash = DummyFlash::new(DummyConfig {
            size: SIZE,
            real_delays: true,
            ..Default::default()
        });
        flash.set_stuck_busy(true);
        let geometry = FlashGeometry {
            ready_poll_timeout_ms: 30,
            ..geometry()
        };

        let start = std::time::Instant::now();
        let result = FlashProgrammer::new(&mut flash, geometry)
            .unwrap()
            .erase_sector(0);
        let elapsed = start.elapsed();

        assert_eq!(
            result,
            Err(Error::Timeout {
                op: PendingOp::SectorErase,
                address: 0,
                waited_ms: 30
            })
        );
        assert_eq!(flash.elapsed_us(), 30_000);
        assert!(elapsed >= std::time::Duration::from_millis(30));
        assert!(elapsed < std::time::Duration::from_secs(1));
    }
}
