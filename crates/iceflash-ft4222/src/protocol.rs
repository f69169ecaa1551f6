//! FT4222H protocol constants and helpers
//!
//! The FT4222H uses a vendor-specific USB protocol (no libftdi/MPSSE).
//! All communication is done via control and bulk transfers.

use core::ops::Range;

// ============================================================================
// USB device identifiers
// ============================================================================

/// FTDI vendor ID
pub const FTDI_VID: u16 = 0x0403;
/// FT4222H product ID
pub const FT4222H_PID: u16 = 0x601C;

// ============================================================================
// Control requests
// ============================================================================

/// USB request codes for FT4222H
pub const FT4222_RESET_REQUEST: u8 = 0x00;
pub const FT4222_INFO_REQUEST: u8 = 0x20;
pub const FT4222_CONFIG_REQUEST: u8 = 0x21;

/// Reset command values (wValue for RESET_REQUEST)
pub const FT4222_RESET_SIO: u16 = 0x0000;
pub const FT4222_OUTPUT_FLUSH: u16 = 0x0001;
pub const FT4222_INPUT_FLUSH: u16 = 0x0002;

/// Info command values (wValue for INFO_REQUEST)
pub const FT4222_GET_VERSION: u16 = 0x0000;

/// Config command codes (lower byte of wValue for CONFIG_REQUEST)
/// The data byte goes in the upper byte: wValue = (data << 8) | cmd
pub const FT4222_SET_CLOCK: u8 = 0x04;
pub const FT4222_SET_MODE: u8 = 0x05;
pub const FT4222_SPI_SET_IO_LINES: u8 = 0x42;
pub const FT4222_SPI_SET_CS_ACTIVE: u8 = 0x43;
pub const FT4222_SPI_SET_CLK_DIV: u8 = 0x44;
pub const FT4222_SPI_SET_CLK_IDLE: u8 = 0x45;
pub const FT4222_SPI_SET_CAPTURE: u8 = 0x46;
pub const FT4222_SPI_SET_CS_MASK: u8 = 0x48;
pub const FT4222_SPI_RESET_TRANSACTION: u8 = 0x49;

/// Mode values (data byte for SET_MODE)
pub const FT4222_MODE_SPI_MASTER: u8 = 3;

/// Clock polarity and phase (data bytes)
pub const FT4222_CLK_IDLE_HIGH: u8 = 1;
pub const FT4222_CLK_CAPTURE_TRAILING: u8 = 1;

/// CS polarity (data byte for SPI_SET_CS_ACTIVE)
pub const FT4222_CS_ACTIVE_LOW: u8 = 0;

/// Chip select line wired to the flash
pub const ICEBOARD_CS: u8 = 0;

// ============================================================================
// Buffer and transfer sizes
// ============================================================================

/// Modem status bytes at the start of each IN packet
pub const MODEM_STATUS_SIZE: usize = 2;

/// Read buffer size per bulk IN request
pub const READ_BUFFER_SIZE: usize = 2048;

/// Largest piece clocked in one go while CS is held
///
/// In single-I/O mode every byte sent also receives a byte, and the
/// internal RX buffer overflows if too much is sent before reading.
pub const SEGMENT_SIZE: usize = 256;

/// Bulk IN requests that may come back with no payload before giving up
pub const MAX_EMPTY_READS: usize = 16;

/// Split `len` bytes into bus segments
pub fn segments(len: usize) -> impl Iterator<Item = Range<usize>> {
    (0..len)
        .step_by(SEGMENT_SIZE)
        .map(move |start| start..core::cmp::min(start + SEGMENT_SIZE, len))
}

// ============================================================================
// Clock configuration
// ============================================================================

/// System clock index for 60 MHz
pub const FT4222_SYS_CLOCK_60MHZ: u8 = 0;
/// SPI clock divisor register value for divide-by-2
pub const FT4222_SPI_CLK_DIV_2: u8 = 1;

/// SPI clock used with the IceBoard: 60 MHz system clock divided by 2
pub const ICEBOARD_SPI_CLOCK_KHZ: u32 = 60_000 / 2;
