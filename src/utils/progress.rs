use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Terminal progress bar for batch runs. A silent reporter draws nothing.
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new(total: u64, message: &str, silent: bool) -> Self {
        if silent {
            return Self::silent();
        }

        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            progress_bar: Some(pb),
        }
    }

    fn silent() -> Self {
        Self { progress_bar: None }
    }

    pub fn update(&self, current: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_position(current);
        }
    }

    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    pub fn finish_with_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            if !pb.is_finished() {
                pb.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_reporter_is_inert() {
        let progress = ProgressReporter::new(10, "Ingesting", true);
        assert!(progress.progress_bar.is_none());
        progress.update(5);
        progress.set_message("still quiet");
        progress.finish_with_message("done");
    }

    #[test]
    fn test_bar_tracks_position() {
        let progress = ProgressReporter::new(3, "Aggregating", false);
        progress.update(2);

        let pb = progress.progress_bar.as_ref().unwrap();
        assert_eq!(pb.length(), Some(3));
        assert_eq!(pb.position(), 2);

        progress.finish_with_message("done");
        assert!(pb.is_finished());
    }
}
