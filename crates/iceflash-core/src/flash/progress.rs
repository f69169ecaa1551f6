//! Progress reporting for long-running operations

/// Summary of a successful programming run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramStats {
    /// Sectors written
    pub sectors: usize,
    /// Page program commands issued, retries included
    pub pages_programmed: usize,
    /// Sectors that needed more than one attempt
    pub sectors_retried: usize,
    /// Sector erases issued by the retry loop
    pub retry_erases: usize,
    /// Image bytes written
    pub bytes_written: usize,
}

/// Progress callbacks for erase, program and validate
pub trait ProgramProgress {
    /// Called when a chip erase starts
    fn erasing_chip(&mut self);

    /// Called when the chip erase has completed
    fn chip_erased(&mut self);

    /// Called when programming starts
    fn programming(&mut self, sectors: usize, bytes: usize);

    /// Called after a sector verified successfully
    fn sector_done(&mut self, sector: u32, bytes_done: usize);

    /// Called when a sector failed verification and is being retried
    fn sector_retry(&mut self, sector: u32, attempt: u32, mismatches: usize);

    /// Called when validation starts
    fn validating(&mut self, bytes: usize);

    /// Called after each validation chunk
    fn validate_progress(&mut self, bytes_read: usize);

    /// Called when programming has completed
    fn complete(&mut self, stats: &ProgramStats);
}

/// A no-op progress reporter
pub struct NoProgress;

impl ProgramProgress for NoProgress {
    fn erasing_chip(&mut self) {}
    fn chip_erased(&mut self) {}
    fn programming(&mut self, _sectors: usize, _bytes: usize) {}
    fn sector_done(&mut self, _sector: u32, _bytes_done: usize) {}
    fn sector_retry(&mut self, _sector: u32, _attempt: u32, _mismatches: usize) {}
    fn validating(&mut self, _bytes: usize) {}
    fn validate_progress(&mut self, _bytes_read: usize) {}
    fn complete(&mut self, _stats: &ProgramStats) {}
}
