//! Single-command sequences
//!
//! Each function issues exactly the transactions for one flash command.
//! Waiting for completion is the caller's business: program and erase
//! commands return as soon as the command has been clocked out.

use alloc::vec::Vec;

use crate::error::{InvalidInput, Result, TransportError};
use crate::spi::{Frame, Opcode, StatusFlags};
use crate::transport::SpiTransport;

/// Send the Wake Up (release from deep power-down) command
pub fn wake_up<T: SpiTransport + ?Sized>(transport: &mut T) -> Result<()> {
    log::trace!("WAKE");
    transport.transmit(&Frame::command(Opcode::WakeUp), true)?;
    Ok(())
}

/// Send the Write Enable command
pub fn write_enable<T: SpiTransport + ?Sized>(transport: &mut T) -> Result<()> {
    log::trace!("WREN");
    transport.transmit(&Frame::command(Opcode::WriteEnable), true)?;
    Ok(())
}

/// Read status register 1
///
/// The opcode is sent with chip select held, then one byte is clocked in
/// and chip select released.
pub fn read_status<T: SpiTransport + ?Sized>(transport: &mut T) -> Result<StatusFlags> {
    transport.transmit(&Frame::command(Opcode::ReadStatus), false)?;
    let status = receive_exact(transport, 1)?;
    Ok(StatusFlags::from_bits_retain(status[0]))
}

/// Read `len` bytes starting at `address` in a single transaction
pub fn read<T: SpiTransport + ?Sized>(
    transport: &mut T,
    address: u32,
    len: usize,
) -> Result<Vec<u8>> {
    log::trace!("READ 0x{:06X} +{}", address, len);
    transport.transmit(&Frame::addressed(Opcode::Read, address), false)?;
    receive_exact(transport, len)
}

/// Read `len` bytes starting at `address`, one `Read` command per chunk
///
/// Chunks are at most `max_chunk` bytes, which must be non-zero. `on_chunk`
/// is called with the running byte count after each chunk.
pub fn read_chunked<T: SpiTransport + ?Sized>(
    transport: &mut T,
    address: u32,
    len: usize,
    max_chunk: usize,
    mut on_chunk: impl FnMut(usize),
) -> Result<Vec<u8>> {
    if max_chunk == 0 {
        return Err(InvalidInput::InvalidGeometry("max read chunk must be non-zero").into());
    }
    let mut buf = Vec::with_capacity(len);

    while buf.len() < len {
        let chunk_len = core::cmp::min(max_chunk, len - buf.len());
        let chunk = read(transport, address + buf.len() as u32, chunk_len)?;
        buf.extend_from_slice(&chunk);
        on_chunk(buf.len());
    }

    Ok(buf)
}

/// Write-enable, then program up to one page at `address`
///
/// The opcode and address go out without releasing chip select; the
/// payload follows and ends the transaction.
pub fn program_page<T: SpiTransport + ?Sized>(
    transport: &mut T,
    address: u32,
    data: &[u8],
) -> Result<()> {
    write_enable(transport)?;
    log::trace!("PP 0x{:06X} +{}", address, data.len());
    transport.transmit(&Frame::addressed(Opcode::PageProgram, address), false)?;
    transport.transmit(data, true)?;
    Ok(())
}

/// Write-enable, then erase the sector containing `address`
pub fn erase_sector<T: SpiTransport + ?Sized>(transport: &mut T, address: u32) -> Result<()> {
    write_enable(transport)?;
    log::trace!("SE 0x{:06X}", address);
    transport.transmit(&Frame::addressed(Opcode::SectorErase, address), true)?;
    Ok(())
}

/// Write-enable, then erase the whole chip
pub fn erase_chip<T: SpiTransport + ?Sized>(transport: &mut T) -> Result<()> {
    write_enable(transport)?;
    log::trace!("CE");
    transport.transmit(&Frame::command(Opcode::ChipErase), true)?;
    Ok(())
}

/// Receive and end the transaction, insisting on the full byte count
///
/// Transports are required to report short transfers themselves; this
/// guards the indexing done by callers against one that does not.
fn receive_exact<T: SpiTransport + ?Sized>(transport: &mut T, len: usize) -> Result<Vec<u8>> {
    let data = transport.receive(len, true)?;
    if data.len() != len {
        return Err(TransportError::ShortTransfer {
            requested: len,
            transferred: data.len(),
        }
        .into());
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use alloc::vec;
    use crate::mock::{MockTransport, Transfer};

    #[test]
    fn test_read_status_framing() {
        let mut mock = MockTransport::new();
        mock.queue_status(&[0x03]);
        let status = read_status(&mut mock).unwrap();
        assert!(!status.is_ready());
        assert_eq!(
            mock.log,
            vec![
                Transfer::Transmit {
                    bytes: vec![0x05],
                    end: false
                },
                Transfer::Receive { count: 1, end: true },
            ]
        );
    }

    #[test]
    fn test_program_page_framing() {
        let mut mock = MockTransport::new();
        program_page(&mut mock, 0x012300, &[0xAA, 0xBB]).unwrap();
        assert_eq!(
            mock.log,
            vec![
                Transfer::Transmit {
                    bytes: vec![0x06],
                    end: true
                },
                Transfer::Transmit {
                    bytes: vec![0x02, 0x01, 0x23, 0x00],
                    end: false
                },
                Transfer::Transmit {
                    bytes: vec![0xAA, 0xBB],
                    end: true
                },
            ]
        );
    }

    #[test]
    fn test_erase_sector_framing() {
        let mut mock = MockTransport::new();
        erase_sector(&mut mock, 0x2000).unwrap();
        assert_eq!(
            mock.transmitted_frames(),
            vec![vec![0x06], vec![0x20, 0x00, 0x20, 0x00]]
        );
    }

    #[test]
    fn test_read_chunked_sizes() {
        let mut mock = MockTransport::new();
        let mut progress = vec![];
        let data = read_chunked(&mut mock, 0x100, 10, 4, |n| progress.push(n)).unwrap();
        assert_eq!(data.len(), 10);
        assert_eq!(mock.addresses_for(Opcode::Read), vec![0x100, 0x104, 0x108]);
        assert_eq!(progress, vec![4, 8, 10]);
    }

    #[test]
    fn test_read_chunked_zero_chunk_rejected() {
        let mut mock = MockTransport::new();
        assert_eq!(
            read_chunked(&mut mock, 0, 10, 0, |_| {}),
            Err(Error::InvalidInput(InvalidInput::InvalidGeometry(
                "max read chunk must be non-zero"
            )))
        );
        assert!(mock.log.is_empty());
    }

    #[test]
    fn test_short_receive_is_error() {
        let mut mock = MockTransport::new();
        mock.short_receive = true;
        assert_eq!(
            read(&mut mock, 0, 16),
            Err(Error::Transport(TransportError::ShortTransfer {
                requested: 16,
                transferred: 15
            }))
        );
    }
}
