//! Progress reporting with indicatif

use std::time::Duration;

use iceflash_core::flash::{ProgramProgress, ProgramStats};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress reporter using indicatif progress bars
pub struct IndicatifProgress {
    multi: MultiProgress,
    current_bar: Option<ProgressBar>,
}

impl IndicatifProgress {
    /// Create a reporter with no bar showing yet
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            current_bar: None,
        }
    }

    fn create_bar(&mut self, total: u64, phase: &'static str) {
        let pb = self.multi.add(ProgressBar::new(total));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                    phase
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.current_bar = Some(pb);
    }

    fn create_spinner(&mut self, message: String) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        self.current_bar = Some(pb);
    }

    fn set_position(&self, position: usize) {
        if let Some(pb) = &self.current_bar {
            pb.set_position(position as u64);
        }
    }

    /// Complete the current bar with `message`
    pub fn finish(&mut self, message: &str) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Leave the current bar where it stopped
    pub fn abandon(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            pb.abandon();
        }
    }
}

impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramProgress for IndicatifProgress {
    fn erasing_chip(&mut self) {
        self.create_spinner("Erasing chip...".to_string());
    }

    fn chip_erased(&mut self) {
        self.finish("Erase complete");
    }

    fn programming(&mut self, _sectors: usize, bytes: usize) {
        self.create_bar(bytes as u64, "Programming");
    }

    fn sector_done(&mut self, _sector: u32, bytes_done: usize) {
        self.set_position(bytes_done);
    }

    fn sector_retry(&mut self, sector: u32, attempt: u32, mismatches: usize) {
        let message = format!(
            "sector {} had {} bad byte(s), attempt {}",
            sector, mismatches, attempt
        );
        match &self.current_bar {
            Some(pb) => pb.println(message),
            None => eprintln!("{}", message),
        }
    }

    fn validating(&mut self, bytes: usize) {
        self.finish("Programming complete");
        self.create_bar(bytes as u64, "Validating");
    }

    fn validate_progress(&mut self, bytes_read: usize) {
        self.set_position(bytes_read);
    }

    fn complete(&mut self, stats: &ProgramStats) {
        self.finish("Programming complete");
        println!(
            "Programmed {} bytes in {} sector(s), {} page(s); {} sector(s) needed retries ({} erase(s))",
            stats.bytes_written,
            stats.sectors,
            stats.pages_programmed,
            stats.sectors_retried,
            stats.retry_erases
        );
    }
}
