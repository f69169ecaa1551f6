//! Splitting an image into sector windows

use core::ops::Range;

/// The bytes of an image that belong to one sector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorWindow {
    /// Sector index, counted from address 0
    pub index: u32,
    /// Byte range of the image covered by this sector
    pub range: Range<usize>,
}

impl SectorWindow {
    /// Number of image bytes in this window (may be less than a sector)
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Whether the window covers no bytes
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// The window's bytes within `image`
    pub fn slice<'a>(&self, image: &'a [u8]) -> &'a [u8] {
        &image[self.range.clone()]
    }
}

/// Split `image_len` bytes into consecutive sector windows
///
/// Yields `ceil(image_len / sector_size)` windows; only the last one may be
/// shorter than `sector_size`. `sector_size` must be non-zero.
pub fn partition(image_len: usize, sector_size: u32) -> impl Iterator<Item = SectorWindow> {
    let sector_size = sector_size as usize;
    (0..image_len.div_ceil(sector_size)).map(move |i| {
        let start = i * sector_size;
        SectorWindow {
            index: i as u32,
            range: start..core::cmp::min(start + sector_size, image_len),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_partition_exact() {
        let windows: Vec<_> = partition(8192, 4096).collect();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].range, 0..4096);
        assert_eq!(windows[1].range, 4096..8192);
    }

    #[test]
    fn test_partition_one_past_sector() {
        let windows: Vec<_> = partition(4097, 4096).collect();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].index, 1);
        assert_eq!(windows[1].len(), 1);
    }

    #[test]
    fn test_partition_short_image() {
        let windows: Vec<_> = partition(10, 4096).collect();
        assert_eq!(windows, [SectorWindow { index: 0, range: 0..10 }]);
    }

    #[test]
    fn test_partition_empty() {
        assert_eq!(partition(0, 4096).count(), 0);
    }
}
