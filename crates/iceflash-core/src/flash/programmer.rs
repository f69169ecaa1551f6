//! Programming orchestrator
//!
//! [`FlashProgrammer`] owns the transport for one session and drives the
//! per-sector loop:
//!
//! ```text
//! Programming -> Verifying -> Done
//!                    |
//!                    +-> Erasing -> Programming   (mismatch, attempts left)
//! ```
//!
//! Transport failures and timeouts abort at once. Only verification
//! mismatches are retried, and only up to `max_program_attempts` per sector.

use alloc::vec::Vec;

use crate::error::{Error, InvalidInput, PendingOp, Result};
use crate::geometry::FlashGeometry;
use crate::protocol::{self, ReadyPoller};
use crate::transport::SpiTransport;

use super::progress::{NoProgress, ProgramProgress, ProgramStats};
use super::sector::SectorProgrammer;
use super::validator::{compare, FlashValidator};
use super::window::{partition, SectorWindow};

/// State of one sector in the program/verify/erase loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectorState {
    Programming,
    Verifying,
    Erasing { mismatches: usize },
    Done,
}

/// Drives erase, program and validate over an owned transport
pub struct FlashProgrammer<T: SpiTransport> {
    transport: T,
    geometry: FlashGeometry,
}

impl<T: SpiTransport> FlashProgrammer<T> {
    /// Create a programmer, checking the geometry invariants
    pub fn new(transport: T, geometry: FlashGeometry) -> Result<Self> {
        geometry.validate()?;
        Ok(Self {
            transport,
            geometry,
        })
    }

    /// The geometry in use
    pub fn geometry(&self) -> &FlashGeometry {
        &self.geometry
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Release the chip from deep power-down
    ///
    /// Call once at session start; some parts power up in a reduced-power
    /// state and ignore every other command until woken.
    pub fn wake_up(&mut self) -> Result<()> {
        log::debug!("Waking flash");
        protocol::wake_up(&mut self.transport)
    }

    /// Erase the whole chip
    pub fn erase_chip(&mut self) -> Result<()> {
        self.erase_chip_with_progress(&mut NoProgress)
    }

    /// Erase the whole chip, reporting progress
    pub fn erase_chip_with_progress(&mut self, progress: &mut dyn ProgramProgress) -> Result<()> {
        log::info!("Erasing chip ({} bytes)", self.geometry.capacity);
        progress.erasing_chip();
        protocol::erase_chip(&mut self.transport)?;
        ReadyPoller::for_chip_erase(&self.geometry).wait_ready(
            &mut self.transport,
            PendingOp::ChipErase,
            0,
        )?;
        progress.chip_erased();
        Ok(())
    }

    /// Erase one sector
    pub fn erase_sector(&mut self, sector: u32) -> Result<()> {
        let address = self.sector_address_checked(sector)?;
        log::debug!("Erasing sector {} at 0x{:06X}", sector, address);
        protocol::erase_sector(&mut self.transport, address)?;
        ReadyPoller::for_program(&self.geometry).wait_ready(
            &mut self.transport,
            PendingOp::SectorErase,
            address,
        )
    }

    /// Read `len` bytes starting at `address`
    pub fn read(&mut self, address: u32, len: usize) -> Result<Vec<u8>> {
        crate::spi::check_access(address, len, self.geometry.capacity)?;
        protocol::read_chunked(
            &mut self.transport,
            address,
            len,
            self.geometry.max_read_chunk as usize,
            |_| {},
        )
    }

    /// Program `image` starting at address 0
    ///
    /// The touched sectors must be erased beforehand. Either every sector
    /// verifies or the call fails; there is no partial success.
    pub fn program(&mut self, image: &[u8]) -> Result<ProgramStats> {
        self.program_with_progress(image, &mut NoProgress)
    }

    /// Program `image` starting at address 0, reporting progress
    pub fn program_with_progress(
        &mut self,
        image: &[u8],
        progress: &mut dyn ProgramProgress,
    ) -> Result<ProgramStats> {
        if image.is_empty() {
            return Err(InvalidInput::EmptyImage.into());
        }
        if image.len() > self.geometry.capacity as usize {
            return Err(InvalidInput::ImageTooLarge {
                len: image.len(),
                capacity: self.geometry.capacity,
            }
            .into());
        }

        let sectors = self.geometry.sector_count(image.len());
        log::info!("Programming {} bytes in {} sector(s)", image.len(), sectors);
        progress.programming(sectors, image.len());

        let mut stats = ProgramStats::default();
        for window in partition(image.len(), self.geometry.sector_size) {
            self.program_window(&window, window.slice(image), &mut stats, progress)?;
            stats.sectors += 1;
            stats.bytes_written += window.len();
            progress.sector_done(window.index, window.range.end);
        }

        log::info!(
            "Programmed {} sector(s), {} page(s), {} retry erase(s)",
            stats.sectors,
            stats.pages_programmed,
            stats.retry_erases
        );
        progress.complete(&stats);
        Ok(stats)
    }

    /// Re-read the whole image and compare it against `image`
    pub fn validate(&mut self, image: &[u8]) -> Result<()> {
        self.validate_with_progress(image, &mut NoProgress)
    }

    /// Re-read the whole image and compare, reporting progress
    pub fn validate_with_progress(
        &mut self,
        image: &[u8],
        progress: &mut dyn ProgramProgress,
    ) -> Result<()> {
        log::info!("Validating {} bytes", image.len());
        FlashValidator::new(&mut self.transport, &self.geometry)
            .validate_with_progress(image, progress)
    }

    /// Run one sector through the program/verify/erase loop
    fn program_window(
        &mut self,
        window: &SectorWindow,
        data: &[u8],
        stats: &mut ProgramStats,
        progress: &mut dyn ProgramProgress,
    ) -> Result<()> {
        let sector = window.index;
        let max_attempts = self.geometry.max_program_attempts;
        let mut attempt = 1;
        let mut state = SectorState::Programming;

        loop {
            state = match state {
                SectorState::Programming => {
                    log::debug!(
                        "Sector {}: programming {} bytes (attempt {}/{})",
                        sector,
                        data.len(),
                        attempt,
                        max_attempts
                    );
                    stats.pages_programmed +=
                        SectorProgrammer::new(&mut self.transport, &self.geometry)
                            .program_sector(sector, data)?;
                    SectorState::Verifying
                }
                SectorState::Verifying => {
                    // Always a full physical sector, only the window is compared
                    let address = self.geometry.sector_address(sector);
                    let readback = protocol::read(
                        &mut self.transport,
                        address,
                        self.geometry.sector_size as usize,
                    )?;

                    match compare(data, &readback) {
                        None => SectorState::Done,
                        Some((mismatches, first)) if attempt >= max_attempts => {
                            log::error!(
                                "Sector {}: {} byte(s) still differ after {} attempt(s)",
                                sector,
                                mismatches,
                                attempt
                            );
                            return Err(Error::CorruptedUpload {
                                sector: Some(sector),
                                mismatches,
                                first_mismatch: Some((window.range.start + first) as u32),
                            });
                        }
                        Some((mismatches, first)) => {
                            log::warn!(
                                "Sector {}: {} byte(s) differ (first at 0x{:06X}), erasing and retrying",
                                sector,
                                mismatches,
                                address as usize + first
                            );
                            SectorState::Erasing { mismatches }
                        }
                    }
                }
                SectorState::Erasing { mismatches } => {
                    self.erase_sector(sector)?;
                    if attempt == 1 {
                        stats.sectors_retried += 1;
                    }
                    stats.retry_erases += 1;
                    attempt += 1;
                    progress.sector_retry(sector, attempt, mismatches);
                    SectorState::Programming
                }
                SectorState::Done => return Ok(()),
            };
        }
    }

    fn sector_address_checked(&self, sector: u32) -> Result<u32> {
        let address = sector as u64 * self.geometry.sector_size as u64;
        if address >= self.geometry.capacity as u64 {
            return Err(InvalidInput::AddressOutOfRange {
                address: address.min(u32::MAX as u64) as u32,
                len: self.geometry.sector_size as usize,
                capacity: self.geometry.capacity,
            }
            .into());
        }
        Ok(address as u32)
    }
}
