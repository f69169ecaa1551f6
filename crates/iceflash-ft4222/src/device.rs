//! FT4222H device implementation
//!
//! The FT4222H streams SPI data over a bulk endpoint pair. While bytes keep
//! arriving on the OUT endpoint, CS stays asserted; a zero-length OUT packet
//! ends the transaction. Every byte clocked out produces one byte on the IN
//! endpoint, prefixed per packet by two modem status bytes.

use std::time::Duration;

use iceflash_core::error::TransportError;
use iceflash_core::transport::SpiTransport;
use nusb::transfer::{Buffer, Bulk, ControlIn, ControlOut, ControlType, In, Out, Recipient};
use nusb::{Endpoint, Interface, MaybeFuture};

use crate::error::{Ft4222Error, Result};
use crate::protocol::*;

const CONTROL_TIMEOUT: Duration = Duration::from_secs(5);
const BULK_TIMEOUT: Duration = Duration::from_secs(30);

/// FT4222H USB SPI master
///
/// Holds the claimed USB interface for the lifetime of the session. The
/// interface is released when the value is dropped.
pub struct Ft4222 {
    interface: Interface,
    /// Control interface index (from USB descriptor)
    control_index: u8,
    in_ep: u8,
    out_ep: u8,
}

impl Ft4222 {
    /// Open the first FT4222H and configure it for the IceBoard
    pub fn open() -> Result<Self> {
        let device_info = nusb::list_devices()
            .wait()
            .map_err(|e| Ft4222Error::OpenFailed(e.to_string()))?
            .find(|d| d.vendor_id() == FTDI_VID && d.product_id() == FT4222H_PID)
            .ok_or(Ft4222Error::DeviceNotFound)?;

        log::info!(
            "Opening FT4222H device at bus {} address {}",
            device_info.busnum(),
            device_info.device_address()
        );

        let device = device_info
            .open()
            .wait()
            .map_err(|e| Ft4222Error::OpenFailed(e.to_string()))?;

        let config_desc = device
            .active_configuration()
            .map_err(|e| Ft4222Error::OpenFailed(format!("Failed to get config: {}", e)))?;

        // The SPI function sits on the first interface with a bulk pair
        let mut found = None;
        for iface in config_desc.interface_alt_settings() {
            if iface.class() != 0xFF && iface.interface_number() != 0 {
                continue;
            }
            let mut in_ep = None;
            let mut out_ep = None;
            for ep in iface.endpoints() {
                if ep.transfer_type() == nusb::descriptors::TransferType::Bulk {
                    if ep.direction() == nusb::transfer::Direction::In {
                        in_ep = Some(ep.address());
                    } else {
                        out_ep = Some(ep.address());
                    }
                }
            }
            if let (Some(in_ep), Some(out_ep)) = (in_ep, out_ep) {
                found = Some((iface.interface_number(), in_ep, out_ep));
                break;
            }
        }

        let (iface_num, in_ep, out_ep) = found.ok_or_else(|| {
            Ft4222Error::OpenFailed("Could not find suitable USB interface".to_string())
        })?;

        log::debug!(
            "Using interface {}, IN EP 0x{:02X}, OUT EP 0x{:02X}",
            iface_num,
            in_ep,
            out_ep
        );

        let interface = device
            .claim_interface(iface_num)
            .wait()
            .map_err(|e| Ft4222Error::ClaimFailed(e.to_string()))?;

        // LibFT4222 addresses control requests to interface 1 when there are several
        let control_index = if config_desc.num_interfaces() > 1 { 1 } else { 0 };

        let mut ft4222 = Self {
            interface,
            control_index,
            in_ep,
            out_ep,
        };
        ft4222.init()?;

        Ok(ft4222)
    }

    /// List all connected FT4222H devices
    pub fn list_devices() -> Result<Vec<Ft4222DeviceInfo>> {
        let devices = nusb::list_devices()
            .wait()
            .map_err(|e| Ft4222Error::OpenFailed(e.to_string()))?
            .filter(|d| d.vendor_id() == FTDI_VID && d.product_id() == FT4222H_PID)
            .map(|d| Ft4222DeviceInfo {
                bus: d.busnum(),
                address: d.device_address(),
            })
            .collect();

        Ok(devices)
    }

    fn init(&mut self) -> Result<()> {
        let chip_version = self.get_version()?;
        log::debug!("FT4222H chip version 0x{:08X}", chip_version);

        self.reset()?;
        self.config_request(FT4222_SET_CLOCK, FT4222_SYS_CLOCK_60MHZ)?;
        self.configure_spi_master()?;

        log::info!(
            "FT4222H configured: SPI clock = {} kHz, CS{}, idle high, trailing edge",
            ICEBOARD_SPI_CLOCK_KHZ,
            ICEBOARD_CS
        );
        Ok(())
    }

    fn get_version(&self) -> Result<u32> {
        let data = self
            .interface
            .control_in(
                ControlIn {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request: FT4222_INFO_REQUEST,
                    value: FT4222_GET_VERSION,
                    index: self.control_index as u16,
                    length: 12,
                },
                CONTROL_TIMEOUT,
            )
            .wait()
            .map_err(|e| Ft4222Error::TransferFailed(format!("Failed to get version: {}", e)))?;

        if data.len() < 4 {
            return Err(Ft4222Error::InvalidResponse(format!(
                "Version response too short: {} bytes",
                data.len()
            )));
        }

        Ok(u32::from_be_bytes([data[0], data[1], data[2], data[3]]))
    }

    fn reset(&self) -> Result<()> {
        // wIndex is 0 here, not control_index
        self.control_out(FT4222_RESET_REQUEST, FT4222_RESET_SIO, 0)?;

        for _ in 0..6 {
            if let Err(e) = self.control_out(
                FT4222_RESET_REQUEST,
                FT4222_OUTPUT_FLUSH,
                self.control_index as u16,
            ) {
                log::warn!("FT4222 output flush failed: {}", e);
                break;
            }
        }
        if let Err(e) = self.control_out(
            FT4222_RESET_REQUEST,
            FT4222_INPUT_FLUSH,
            self.control_index as u16,
        ) {
            log::warn!("FT4222 input flush failed: {}", e);
        }

        log::debug!("FT4222H reset complete");
        Ok(())
    }

    fn configure_spi_master(&self) -> Result<()> {
        self.config_request(FT4222_SPI_RESET_TRANSACTION, ICEBOARD_CS)?;
        self.config_request(FT4222_SPI_SET_IO_LINES, 1)?;
        self.config_request(FT4222_SPI_SET_CLK_DIV, FT4222_SPI_CLK_DIV_2)?;
        self.config_request(FT4222_SPI_SET_CLK_IDLE, FT4222_CLK_IDLE_HIGH)?;
        self.config_request(FT4222_SPI_SET_CAPTURE, FT4222_CLK_CAPTURE_TRAILING)?;
        self.config_request(FT4222_SPI_SET_CS_ACTIVE, FT4222_CS_ACTIVE_LOW)?;
        self.config_request(FT4222_SPI_SET_CS_MASK, 1 << ICEBOARD_CS)?;
        self.config_request(FT4222_SET_MODE, FT4222_MODE_SPI_MASTER)
    }

    fn control_out(&self, request: u8, value: u16, index: u16) -> Result<()> {
        self.interface
            .control_out(
                ControlOut {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request,
                    value,
                    index,
                    data: &[],
                },
                CONTROL_TIMEOUT,
            )
            .wait()
            .map_err(|e| Ft4222Error::TransferFailed(format!("Control transfer failed: {}", e)))
    }

    /// wValue = (data << 8) | cmd
    fn config_request(&self, cmd: u8, data: u8) -> Result<()> {
        let value = ((data as u16) << 8) | (cmd as u16);
        self.control_out(FT4222_CONFIG_REQUEST, value, self.control_index as u16)
    }

    fn bulk_write(&mut self, data: &[u8]) -> Result<()> {
        let mut out_ep: Endpoint<Bulk, Out> = self
            .interface
            .endpoint(self.out_ep)
            .map_err(|e| Ft4222Error::TransferFailed(e.to_string()))?;

        let mut out_buf = Buffer::new(data.len());
        out_buf.extend_from_slice(data);
        out_ep
            .transfer_blocking(out_buf, BULK_TIMEOUT)
            .into_result()
            .map_err(|e| Ft4222Error::TransferFailed(format!("Bulk write failed: {}", e)))?;

        Ok(())
    }

    /// Read up to `len` payload bytes; may return fewer if the device stops sending
    fn bulk_read(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut in_ep: Endpoint<Bulk, In> = self
            .interface
            .endpoint(self.in_ep)
            .map_err(|e| Ft4222Error::TransferFailed(e.to_string()))?;

        let max_packet_size = in_ep.max_packet_size();
        let mut result = Vec::with_capacity(len);
        let mut empty_reads = 0;

        while result.len() < len && empty_reads < MAX_EMPTY_READS {
            let remaining = len - result.len();
            let request_len = std::cmp::min(remaining + MODEM_STATUS_SIZE, READ_BUFFER_SIZE);
            // Request length must be multiple of max packet size
            let aligned_len = request_len.div_ceil(max_packet_size) * max_packet_size;

            let mut in_buf = Buffer::new(aligned_len);
            in_buf.set_requested_len(aligned_len);

            let data = in_ep
                .transfer_blocking(in_buf, BULK_TIMEOUT)
                .into_result()
                .map_err(|e| Ft4222Error::TransferFailed(format!("Bulk read failed: {}", e)))?;

            if data.len() < MODEM_STATUS_SIZE {
                return Err(Ft4222Error::InvalidResponse("Response too short".into()));
            }

            // Each packet carries its own modem status header
            let mut got = 0;
            for packet in data.chunks(max_packet_size) {
                let payload = packet.get(MODEM_STATUS_SIZE..).unwrap_or(&[]);
                let take = std::cmp::min(payload.len(), len - result.len());
                result.extend_from_slice(&payload[..take]);
                got += take;
            }
            if got == 0 {
                empty_reads += 1;
            }
        }

        Ok(result)
    }

    /// Clock `out` onto the bus with CS held and return what came back
    fn shift(&mut self, out: &[u8]) -> Result<Vec<u8>> {
        let mut echoed = Vec::with_capacity(out.len());

        for segment in segments(out.len()) {
            let expected = segment.len();
            self.bulk_write(&out[segment])?;
            let data = self.bulk_read(expected)?;
            if data.len() < expected {
                return Err(Ft4222Error::ShortTransfer {
                    requested: out.len(),
                    transferred: echoed.len() + data.len(),
                });
            }
            echoed.extend_from_slice(&data);
        }

        log::trace!("FT4222 shifted {} byte(s)", out.len());
        Ok(echoed)
    }

    fn end_transaction(&mut self) -> Result<()> {
        self.bulk_write(&[])?;
        log::trace!("FT4222 CS released");
        Ok(())
    }
}

impl SpiTransport for Ft4222 {
    fn transmit(
        &mut self,
        bytes: &[u8],
        end_transaction: bool,
    ) -> core::result::Result<(), TransportError> {
        // Incoming bytes during a write are meaningless
        self.shift(bytes)?;
        if end_transaction {
            self.end_transaction()?;
        }
        Ok(())
    }

    fn receive(
        &mut self,
        count: usize,
        end_transaction: bool,
    ) -> core::result::Result<Vec<u8>, TransportError> {
        let data = self.shift(&vec![0x00; count])?;
        if end_transaction {
            self.end_transaction()?;
        }
        Ok(data)
    }

    fn delay_us(&mut self, us: u32) {
        if us > 0 {
            std::thread::sleep(Duration::from_micros(us as u64));
        }
    }
}

/// Information about a connected FT4222H device
#[derive(Debug, Clone)]
pub struct Ft4222DeviceInfo {
    /// USB bus number
    pub bus: u8,
    /// USB device address
    pub address: u8,
}

impl std::fmt::Display for Ft4222DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FT4222H at bus {} address {}", self.bus, self.address)
    }
}
