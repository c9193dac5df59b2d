use crate::error::AssetLoadError;

/// Sink for loading progress. The browser implementation is the DOM loading
/// bar; tests record the calls.
pub trait ProgressDisplay {
    fn show(&mut self) {}
    fn hide(&mut self) {}
    /// Width of the progress bar, e.g. `"50%"`.
    fn set_progress(&mut self, percent: &str);
    /// Status line, e.g. `"Loaded 1 of 2 files."`.
    fn set_text(&mut self, text: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub items_loaded: usize,
    pub items_total: usize,
    pub last_error_url: Option<String>,
}

impl ProgressState {
    /// Rounded completion percentage in [0, 100]. An empty load counts as done.
    pub fn percent(&self) -> u32 {
        if self.items_total == 0 {
            return 100;
        }
        let ratio = self.items_loaded.min(self.items_total) as f64 / self.items_total as f64;
        (ratio * 100.0).round() as u32
    }
}

/// Aggregates per-item load notifications into progress reports.
pub struct LoadingProgress<D> {
    state: ProgressState,
    /// Highest percentage pushed to the display so far.
    reported_percent: u32,
    display: D,
}

impl<D: ProgressDisplay> LoadingProgress<D> {
    pub fn new(display: D) -> Self {
        Self {
            state: ProgressState::default(),
            reported_percent: 0,
            display,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn into_display(self) -> D {
        self.display
    }

    /// Record that `items_loaded` of `items_total` items are done and push the
    /// update to the display. Neither the counts nor the reported percentage
    /// move backwards, even when the total grows.
    pub fn on_item_loaded(&mut self, items_loaded: usize, items_total: usize) {
        self.state.items_total = self.state.items_total.max(items_total);
        self.state.items_loaded = self
            .state
            .items_loaded
            .max(items_loaded)
            .min(self.state.items_total);

        self.reported_percent = self.reported_percent.max(self.state.percent());
        let percent = format!("{}%", self.reported_percent);
        let text = format!(
            "Loaded {} of {} files.",
            self.state.items_loaded, self.state.items_total
        );
        log::debug!("asset progress: {percent} ({text})");
        self.display.set_progress(&percent);
        self.display.set_text(&text);
    }

    /// Record a failed item. The returned error is what the overall load
    /// rejects with; there is no retry.
    pub fn on_error(&mut self, filename: &str, url: &str, reason: impl Into<String>) -> AssetLoadError {
        self.state.last_error_url = Some(url.to_string());
        let err = AssetLoadError {
            filename: filename.to_string(),
            reason: reason.into(),
        };
        log::error!("There was an error loading {url}: {}", err.reason);
        err
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Display that records every call.
    #[derive(Default)]
    pub(crate) struct RecordingDisplay {
        pub shown: bool,
        pub hidden: bool,
        pub reports: Vec<(String, String)>,
        pending_percent: Option<String>,
    }

    impl ProgressDisplay for RecordingDisplay {
        fn show(&mut self) {
            self.shown = true;
        }

        fn hide(&mut self) {
            self.hidden = true;
        }

        fn set_progress(&mut self, percent: &str) {
            self.pending_percent = Some(percent.to_string());
        }

        fn set_text(&mut self, text: &str) {
            let percent = self.pending_percent.take().unwrap_or_default();
            self.reports.push((percent, text.to_string()));
        }
    }

    #[test]
    fn test_reports_percent_and_text() {
        let mut progress = LoadingProgress::new(RecordingDisplay::default());
        progress.on_item_loaded(1, 3);
        progress.on_item_loaded(2, 3);
        progress.on_item_loaded(3, 3);
        assert_eq!(
            progress.display().reports,
            vec![
                ("33%".to_string(), "Loaded 1 of 3 files.".to_string()),
                ("67%".to_string(), "Loaded 2 of 3 files.".to_string()),
                ("100%".to_string(), "Loaded 3 of 3 files.".to_string()),
            ]
        );
    }

    #[test]
    fn test_percent_monotonic_and_bounded() {
        let mut progress = LoadingProgress::new(RecordingDisplay::default());
        let mut last = 0;
        for (loaded, total) in [(0, 4), (2, 4), (1, 4), (4, 4), (9, 4)] {
            progress.on_item_loaded(loaded, total);
            let p = progress.state().percent();
            assert!(p >= last, "percent went backwards: {last} -> {p}");
            assert!(p <= 100);
            last = p;
        }
        assert_eq!(progress.state().items_loaded, 4);
    }

    #[test]
    fn test_percent_never_drops_when_total_grows() {
        let mut progress = LoadingProgress::new(RecordingDisplay::default());
        progress.on_item_loaded(1, 2);
        progress.on_item_loaded(1, 4);
        progress.on_item_loaded(3, 4);
        assert_eq!(
            progress.display().reports,
            vec![
                ("50%".to_string(), "Loaded 1 of 2 files.".to_string()),
                ("50%".to_string(), "Loaded 1 of 4 files.".to_string()),
                ("75%".to_string(), "Loaded 3 of 4 files.".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_total_counts_as_complete() {
        assert_eq!(ProgressState::default().percent(), 100);
    }

    #[test]
    fn test_on_error_records_url() {
        let mut progress = LoadingProgress::new(RecordingDisplay::default());
        let err = progress.on_error("torch.glb", "models/torch.glb", "HTTP 404");
        assert_eq!(err.filename, "torch.glb");
        assert_eq!(progress.state().last_error_url.as_deref(), Some("models/torch.glb"));
        assert!(progress.display().reports.is_empty());
    }
}
