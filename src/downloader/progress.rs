//! Progress tracking for the active download

use crate::extractor::TransferEvent;
use crate::utils::size::format_size;

/// Download status
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DownloadStatus {
    #[default]
    Pending,
    Downloading,
    Merging,
    Completed,
    Failed(String),
    Cancelled,
}

/// Progress of one in-flight download.
///
/// Every optional field stays `None` until the collaborator reports it;
/// unknown is never treated as zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DownloadState {
    pub status: DownloadStatus,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    /// bytes per second
    pub speed: Option<f64>,
    /// seconds
    pub eta: Option<u64>,
}

impl DownloadState {
    /// Create a new progress tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one collaborator progress callback into the state
    pub fn apply(&mut self, event: &TransferEvent) {
        match event {
            TransferEvent::Downloading {
                downloaded_bytes,
                total_bytes,
                speed,
                eta,
            } => {
                // Next stream of the same item starts from zero
                if self.status == DownloadStatus::Merging {
                    *self = Self::new();
                }
                self.status = DownloadStatus::Downloading;
                if let Some(downloaded) = downloaded_bytes {
                    self.downloaded_bytes = *downloaded;
                }
                self.total_bytes = *total_bytes;
                self.speed = *speed;
                self.eta = *eta;
            }
            TransferEvent::Finished => {
                self.status = DownloadStatus::Merging;
                self.speed = None;
                self.eta = None;
            }
        }
    }

    pub fn complete(&mut self) {
        self.status = DownloadStatus::Completed;
        self.eta = Some(0);
    }

    pub fn failed(&mut self, error: String) {
        self.status = DownloadStatus::Failed(error);
    }

    pub fn cancel(&mut self) {
        self.status = DownloadStatus::Cancelled;
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            DownloadStatus::Completed | DownloadStatus::Failed(_) | DownloadStatus::Cancelled
        )
    }

    /// Percentage 0-100, only when the total is known
    pub fn percent(&self) -> Option<f64> {
        match self.total_bytes {
            Some(total) if total > 0 => Some(self.downloaded_bytes as f64 / total as f64 * 100.0),
            _ => None,
        }
    }

    /// Speed in MB/s, only when positive
    pub fn speed_mbps(&self) -> Option<f64> {
        self.speed
            .filter(|s| *s > 0.0)
            .map(|s| s / (1024.0 * 1024.0))
    }

    pub fn eta_text(&self) -> Option<String> {
        self.eta.map(format_eta)
    }

    /// Derived display values for observers
    pub fn report(&self) -> ProgressReport {
        ProgressReport {
            status: self.status.clone(),
            percent: self.percent(),
            speed_mbps: self.speed_mbps(),
            eta: self.eta_text(),
            downloaded: format_size(Some(self.downloaded_bytes)),
            total: self.total_bytes.map(|t| format_size(Some(t))),
        }
    }
}

/// What observers get for each progress update
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub status: DownloadStatus,
    pub percent: Option<f64>,
    pub speed_mbps: Option<f64>,
    pub eta: Option<String>,
    pub downloaded: String,
    pub total: Option<String>,
}

/// "N sec", "M min S sec" or "H hr M min S sec"
pub fn format_eta(seconds: u64) -> String {
    if seconds < 60 {
        format!("{} sec", seconds)
    } else if seconds < 3600 {
        format!("{} min {} sec", seconds / 60, seconds % 60)
    } else {
        format!(
            "{} hr {} min {} sec",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downloading(done: u64, total: Option<u64>, speed: Option<f64>, eta: Option<u64>) -> TransferEvent {
        TransferEvent::Downloading {
            downloaded_bytes: Some(done),
            total_bytes: total,
            speed,
            eta,
        }
    }

    // ============================================================
    // STATE UPDATES
    // ============================================================

    #[test]
    fn test_new_state_is_pending_and_unknown() {
        let state = DownloadState::new();
        assert_eq!(state.status, DownloadStatus::Pending);
        assert_eq!(state.percent(), None);
        assert_eq!(state.speed_mbps(), None);
        assert_eq!(state.eta_text(), None);
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_apply_downloading() {
        let mut state = DownloadState::new();
        state.apply(&downloading(512, Some(2048), Some(2.0 * 1024.0 * 1024.0), Some(75)));

        assert_eq!(state.status, DownloadStatus::Downloading);
        assert_eq!(state.percent(), Some(25.0));
        assert_eq!(state.speed_mbps(), Some(2.0));
        assert_eq!(state.eta_text().as_deref(), Some("1 min 15 sec"));
    }

    #[test]
    fn test_unknown_total_has_no_percent() {
        let mut state = DownloadState::new();
        state.apply(&downloading(512, None, None, None));
        assert_eq!(state.percent(), None);
        assert_eq!(state.report().total, None);
        assert_eq!(state.report().downloaded, "512 B");
    }

    #[test]
    fn test_zero_total_has_no_percent() {
        let mut state = DownloadState::new();
        state.apply(&downloading(0, Some(0), Some(0.0), None));
        assert_eq!(state.percent(), None);
        assert_eq!(state.speed_mbps(), None);
    }

    #[test]
    fn test_finished_moves_to_merging_and_back() {
        let mut state = DownloadState::new();
        state.apply(&downloading(100, Some(100), Some(10.0), Some(0)));
        state.apply(&TransferEvent::Finished);
        assert_eq!(state.status, DownloadStatus::Merging);
        assert_eq!(state.eta, None);

        // second stream of the same item
        state.apply(&downloading(10, Some(50), None, None));
        assert_eq!(state.status, DownloadStatus::Downloading);
    }

    #[test]
    fn test_next_stream_without_byte_count_starts_at_zero() {
        let mut state = DownloadState::new();
        state.apply(&downloading(10_000, Some(10_000), None, None));
        state.apply(&TransferEvent::Finished);

        state.apply(&TransferEvent::Downloading {
            downloaded_bytes: None,
            total_bytes: Some(1_000),
            speed: None,
            eta: None,
        });
        assert_eq!(state.downloaded_bytes, 0);
        assert_eq!(state.percent(), Some(0.0));
    }

    // ============================================================
    // STATUS TRANSITION TESTS
    // ============================================================

    #[test]
    fn test_terminal_states() {
        let mut state = DownloadState::new();
        state.complete();
        assert!(state.is_terminal());

        let mut state = DownloadState::new();
        state.failed("Network timeout".to_string());
        match &state.status {
            DownloadStatus::Failed(msg) => assert_eq!(msg, "Network timeout"),
            _ => panic!("Status should be Failed"),
        }
        assert!(state.is_terminal());

        let mut state = DownloadState::new();
        state.cancel();
        assert!(state.is_terminal());
    }

    // ============================================================
    // ETA FORMATTING
    // ============================================================

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(0), "0 sec");
        assert_eq!(format_eta(59), "59 sec");
        assert_eq!(format_eta(60), "1 min 0 sec");
        assert_eq!(format_eta(3599), "59 min 59 sec");
        assert_eq!(format_eta(3600), "1 hr 0 min 0 sec");
        assert_eq!(format_eta(3725), "1 hr 2 min 5 sec");
    }
}
