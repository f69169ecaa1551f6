//! Whole-image validation

use crate::error::{Error, InvalidInput, Result};
use crate::geometry::FlashGeometry;
use crate::protocol;
use crate::spi::check_access;
use crate::transport::SpiTransport;

use super::progress::{NoProgress, ProgramProgress};

/// Re-reads the full image from address 0 and compares it to the source
///
/// This runs independently of the per-sector verification done while
/// programming, so it also catches data that landed at the wrong sector.
pub struct FlashValidator<'a, T: SpiTransport + ?Sized> {
    transport: &'a mut T,
    geometry: &'a FlashGeometry,
}

impl<'a, T: SpiTransport + ?Sized> FlashValidator<'a, T> {
    /// Create a validator over `transport`
    pub fn new(transport: &'a mut T, geometry: &'a FlashGeometry) -> Self {
        Self {
            transport,
            geometry,
        }
    }

    /// Compare the flash contents against `image`
    pub fn validate(&mut self, image: &[u8]) -> Result<()> {
        self.validate_with_progress(image, &mut NoProgress)
    }

    /// Compare the flash contents against `image`, reporting progress
    ///
    /// The image is read in chunks of at most `max_read_chunk` bytes, each
    /// with its own `Read` command. Read-only, so repeated calls on an
    /// unchanged chip give the same result.
    pub fn validate_with_progress(
        &mut self,
        image: &[u8],
        progress: &mut dyn ProgramProgress,
    ) -> Result<()> {
        self.geometry.validate()?;
        if image.is_empty() {
            return Err(InvalidInput::EmptyImage.into());
        }
        check_access(0, image.len(), self.geometry.capacity)?;

        log::debug!(
            "Validating {} bytes in chunks of {} bytes",
            image.len(),
            self.geometry.max_read_chunk
        );
        progress.validating(image.len());

        let readback = protocol::read_chunked(
            &mut *self.transport,
            0,
            image.len(),
            self.geometry.max_read_chunk as usize,
            |done| progress.validate_progress(done),
        )?;

        compare(image, &readback).map_or(Ok(()), |(mismatches, first)| {
            log::error!(
                "Validation failed: {} byte(s) differ, first at 0x{:06X}",
                mismatches,
                first
            );
            Err(Error::CorruptedUpload {
                sector: None,
                mismatches,
                first_mismatch: Some(first as u32),
            })
        })
    }
}

/// Count differing bytes; returns `(count, first_offset)` if any differ
pub(crate) fn compare(expected: &[u8], actual: &[u8]) -> Option<(usize, usize)> {
    let mut first = None;
    let mut count = 0;

    for (offset, (a, b)) in expected.iter().zip(actual).enumerate() {
        if a != b {
            first.get_or_insert(offset);
            count += 1;
        }
    }

    first.map(|first| (count, first))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::spi::Opcode;
    use alloc::vec;

    #[test]
    fn test_compare() {
        assert_eq!(compare(&[1, 2, 3], &[1, 2, 3]), None);
        assert_eq!(compare(&[1, 2, 3, 4], &[1, 0, 3, 0]), Some((2, 1)));
    }

    #[test]
    fn test_validate_chunking() {
        let geometry = FlashGeometry {
            page_size: 16,
            sector_size: 64,
            capacity: 1024,
            max_read_chunk: 100,
            ..Default::default()
        };
        let mut mock = MockTransport::new();
        let image = vec![0xFF; 203];

        FlashValidator::new(&mut mock, &geometry)
            .validate(&image)
            .unwrap();

        assert_eq!(mock.addresses_for(Opcode::Read), vec![0, 100, 200]);
    }

    #[test]
    fn test_validate_mismatch() {
        let geometry = FlashGeometry::default();
        let mut mock = MockTransport::new();
        let mut image = vec![0xFF; 300];
        image[7] = 0x00;
        image[250] = 0x12;

        let err = FlashValidator::new(&mut mock, &geometry)
            .validate(&image)
            .unwrap_err();

        assert_eq!(
            err,
            Error::CorruptedUpload {
                sector: None,
                mismatches: 2,
                first_mismatch: Some(7)
            }
        );
    }

    #[test]
    fn test_validate_empty_rejected() {
        let geometry = FlashGeometry::default();
        let mut mock = MockTransport::new();
        assert_eq!(
            FlashValidator::new(&mut mock, &geometry).validate(&[]),
            Err(Error::InvalidInput(InvalidInput::EmptyImage))
        );
        assert!(mock.log.is_empty());
    }

    #[test]
    fn test_zero_read_chunk_rejected_without_bus_activity() {
        let geometry = FlashGeometry {
            max_read_chunk: 0,
            ..Default::default()
        };
        let mut mock = MockTransport::new();

        let err = FlashValidator::new(&mut mock, &geometry)
            .validate(&[0xFF; 16])
            .unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidInput(InvalidInput::InvalidGeometry(_))
        ));
        assert!(mock.log.is_empty());
    }
}
