//! Progress reporting for the ZIP locale pass

use tracing::info;

/// Receives the cumulative row count every `progress_interval` rows
pub trait ProgressObserver {
    fn on_progress(&mut self, rows: u64);
}

impl<F: FnMut(u64)> ProgressObserver for F {
    fn on_progress(&mut self, rows: u64) {
        self(rows)
    }
}

/// Logs progress through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, rows: u64) {
        info!("Processed {} rows", rows);
    }
}

/// Discards progress notifications
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _rows: u64) {}
}
