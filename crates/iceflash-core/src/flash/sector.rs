//! Programming one sector page by page

use crate::error::{InvalidInput, PendingOp, Result};
use crate::geometry::FlashGeometry;
use crate::protocol::{self, ReadyPoller};
use crate::spi::check_access;
use crate::transport::SpiTransport;

/// Programs a sector by splitting it into page program commands
///
/// Borrows the transport for the duration of one sector. Any failure aborts
/// the whole sector; retrying is left to the caller.
pub struct SectorProgrammer<'a, T: SpiTransport + ?Sized> {
    transport: &'a mut T,
    geometry: &'a FlashGeometry,
    poller: ReadyPoller,
}

impl<'a, T: SpiTransport + ?Sized> SectorProgrammer<'a, T> {
    /// Create a sector programmer over `transport`
    pub fn new(transport: &'a mut T, geometry: &'a FlashGeometry) -> Self {
        Self {
            transport,
            geometry,
            poller: ReadyPoller::for_program(geometry),
        }
    }

    /// Program `data` at the start of sector `sector`
    ///
    /// Issues `ceil(data.len() / page_size)` page programs; the last one may
    /// be short. Returns the number of pages programmed. The sector must
    /// already be erased.
    pub fn program_sector(&mut self, sector: u32, data: &[u8]) -> Result<usize> {
        let geometry = self.geometry;
        geometry.validate()?;

        if data.is_empty() {
            return Err(InvalidInput::EmptyImage.into());
        }
        if data.len() > geometry.sector_size as usize {
            return Err(InvalidInput::SectorTooLarge {
                len: data.len(),
                max: geometry.sector_size,
            }
            .into());
        }
        let base = (sector as u64) * (geometry.sector_size as u64);
        if base >= geometry.capacity as u64 {
            return Err(InvalidInput::AddressOutOfRange {
                address: base.min(u32::MAX as u64) as u32,
                len: data.len(),
                capacity: geometry.capacity,
            }
            .into());
        }
        check_access(geometry.sector_address(sector), data.len(), geometry.capacity)?;

        let mut pages = 0;
        for (page, chunk) in data.chunks(geometry.page_size as usize).enumerate() {
            let address = geometry.page_address(sector, page as u32);
            protocol::program_page(&mut *self.transport, address, chunk)?;
            self.poller
                .wait_ready(&mut *self.transport, PendingOp::PageProgram, address)?;
            pages += 1;
        }

        log::trace!("Sector {}: {} page(s) programmed", sector, pages);
        Ok(pages)
    }
}
