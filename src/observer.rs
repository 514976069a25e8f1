/// Generation observers
///
/// Per-record problems are reported here instead of being raised. The
/// default observer writes them to the log; tests and tools can record them.
use std::path::{Path, PathBuf};

#[allow(unused_imports)]
use log::{error, info, warn};

use crate::error::SkipReason;
use crate::utils::timing::TimingStats;

pub trait GenerationObserver {
    /// A manifest line produced no example.
    fn record_skipped(&mut self, index: usize, raw_line: &str, reason: &SkipReason);

    /// At least one normalized coordinate of this image lies above the grid.
    /// Called at most once per record.
    fn bbox_out_of_range(&mut self, index: usize, image_path: &Path);
}

/// Reports through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl GenerationObserver for LogObserver {
    fn record_skipped(&mut self, index: usize, raw_line: &str, reason: &SkipReason) {
        error!("Error processing line {} ({}): {}", index, raw_line, reason);
    }

    fn bbox_out_of_range(&mut self, _index: usize, image_path: &Path) {
        warn!("Bounding box values exceed 1000 in {}", image_path.display());
    }
}

impl<O: GenerationObserver + ?Sized> GenerationObserver for &mut O {
    fn record_skipped(&mut self, index: usize, raw_line: &str, reason: &SkipReason) {
        (**self).record_skipped(index, raw_line, reason)
    }

    fn bbox_out_of_range(&mut self, index: usize, image_path: &Path) {
        (**self).bbox_out_of_range(index, image_path)
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub skipped: Vec<(usize, String, String)>,
    pub out_of_range: Vec<(usize, PathBuf)>,
}

impl GenerationObserver for RecordingObserver {
    fn record_skipped(&mut self, index: usize, raw_line: &str, reason: &SkipReason) {
        self.skipped.push((index, raw_line.to_string(), reason.to_string()));
    }

    fn bbox_out_of_range(&mut self, index: usize, image_path: &Path) {
        self.out_of_range.push((index, image_path.to_path_buf()));
    }
}

/// Counters for one pass over a split
#[derive(Debug, Clone)]
pub struct GenerationStats {
    pub lines_read: usize,
    pub emitted: usize,
    pub skipped: usize,
    pub out_of_range_images: usize,
    pub decode: TimingStats,
}

impl Default for GenerationStats {
    fn default() -> Self {
        Self {
            lines_read: 0,
            emitted: 0,
            skipped: 0,
            out_of_range_images: 0,
            decode: TimingStats::new("Image decode"),
        }
    }
}

impl GenerationStats {
    pub fn log_summary(&self, label: &str) {
        info!(
            "{}: {} lines, {} examples, {} skipped, {} images with boxes beyond the grid ({})",
            label,
            self.lines_read,
            self.emitted,
            self.skipped,
            self.out_of_range_images,
            self.decode
        );
    }
}
