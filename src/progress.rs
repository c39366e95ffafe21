//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner per pipeline stage of a comparison
#[derive(Debug)]
pub struct ProgressReporter {
    current: Option<ProgressBar>,
    show_progress: bool,
    start_time: std::time::Instant,
}

impl ProgressReporter {
    /// Create progress reporter for a comparison
    pub fn new_for_compare() -> Self {
        Self {
            current: None,
            show_progress: true,
            start_time: std::time::Instant::now(),
        }
    }

    /// Create minimal progress reporter (no progress bars)
    pub fn new_minimal() -> Self {
        Self {
            current: None,
            show_progress: false,
            start_time: std::time::Instant::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Start a stage; an unfinished previous stage is cleared
    pub fn start(&mut self, message: &str) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
        if self.show_progress {
            self.current = Some(create_spinner(message));
        }
        log::debug!("{}", message);
    }

    /// Finish the running stage
    pub fn finish(&mut self, message: &str) {
        if let Some(pb) = self.current.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
    }
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
