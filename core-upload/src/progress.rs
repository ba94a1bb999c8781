//! Converts transport byte counts into percentage events.

use crate::orchestrator::UploadState;
use bridge_traits::http::TransferObserver;
use core_runtime::events::{CoreEvent, EventBus, UploadEvent};
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Highest percentage reported before the server has answered.
pub const MAX_PERCENT_BEFORE_ACK: u8 = 99;

/// `round(sent / total * 100)` clamped to `0..=100`.
pub fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let sent = u128::from(sent.min(total));
    let total = u128::from(total);
    ((sent * 100 + total / 2) / total) as u8
}

struct Reported {
    percent: u8,
    bytes_sent: u64,
}

/// Publishes `UploadEvent::Progress` for one batch.
///
/// Percentages are deduplicated and never decrease. Transfer callbacks stop
/// at [`MAX_PERCENT_BEFORE_ACK`]; only [`ProgressTracker::acknowledge`]
/// reports 100.
pub struct ProgressTracker {
    batch_id: String,
    total_bytes: u64,
    event_bus: EventBus,
    state: Arc<Mutex<UploadState>>,
    reported: Mutex<Reported>,
}

impl ProgressTracker {
    pub fn new(
        batch_id: impl Into<String>,
        total_bytes: u64,
        event_bus: EventBus,
        state: Arc<Mutex<UploadState>>,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            total_bytes,
            event_bus,
            state,
            reported: Mutex::new(Reported {
                percent: 0,
                bytes_sent: 0,
            }),
        }
    }

    /// Last percentage published.
    pub fn percent(&self) -> u8 {
        self.reported.lock().map(|r| r.percent).unwrap_or(0)
    }

    /// The server answered; report completion.
    pub fn acknowledge(&self) {
        self.advance(100, self.total_bytes);
    }

    fn advance(&self, percent: u8, bytes_sent: u64) {
        let Ok(mut reported) = self.reported.lock() else {
            return;
        };
        if percent <= reported.percent {
            return;
        }
        reported.percent = percent;
        reported.bytes_sent = bytes_sent.max(reported.bytes_sent);

        if let Ok(mut state) = self.state.lock() {
            if let UploadState::InFlight {
                batch_id,
                percent: current,
            } = &mut *state
            {
                if *batch_id == self.batch_id {
                    *current = percent;
                }
            }
        }

        trace!(batch_id = %self.batch_id, percent, "Upload progress");
        // Emitted under the lock so concurrent callers cannot reorder events.
        let _ = self.event_bus.emit(CoreEvent::Upload(UploadEvent::Progress {
            batch_id: self.batch_id.clone(),
            percent,
            bytes_sent: reported.bytes_sent,
            total_bytes: self.total_bytes,
        }));
    }
}

impl TransferObserver for ProgressTracker {
    fn on_bytes_sent(&self, sent: u64, total: u64) {
        let percent = percent_of(sent, total).min(MAX_PERCENT_BEFORE_ACK);
        self.advance(percent, sent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percents(receiver: &mut tokio::sync::broadcast::Receiver<CoreEvent>) -> Vec<u8> {
        let mut seen = Vec::new();
        while let Ok(CoreEvent::Upload(UploadEvent::Progress { percent, .. })) = receiver.try_recv()
        {
            seen.push(percent);
        }
        seen
    }

    fn tracker(event_bus: &EventBus) -> (ProgressTracker, Arc<Mutex<UploadState>>) {
        let state = Arc::new(Mutex::new(UploadState::InFlight {
            batch_id: "b-1".into(),
            percent: 0,
        }));
        (
            ProgressTracker::new("b-1", 1000, event_bus.clone(), state.clone()),
            state,
        )
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent_of(0, 1000), 0);
        assert_eq!(percent_of(4, 1000), 0);
        assert_eq!(percent_of(5, 1000), 1);
        assert_eq!(percent_of(333, 1000), 33);
        assert_eq!(percent_of(1000, 1000), 100);
        assert_eq!(percent_of(2000, 1000), 100);
        assert_eq!(percent_of(10, 0), 0);
        assert_eq!(percent_of(u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn test_progress_is_deduplicated_and_monotonic() {
        let event_bus = EventBus::new(64);
        let mut receiver = event_bus.subscribe();
        let (tracker, state) = tracker(&event_bus);

        for sent in [100, 101, 250, 200, 500, 500, 1000] {
            tracker.on_bytes_sent(sent, 1000);
        }

        assert_eq!(percents(&mut receiver), vec![10, 25, 50, 99]);
        assert_eq!(tracker.percent(), 99);
        assert!(matches!(
            *state.lock().unwrap(),
            UploadState::InFlight { percent: 99, .. }
        ));
    }

    #[test]
    fn test_acknowledge_reports_one_hundred_once() {
        let event_bus = EventBus::new(64);
        let mut receiver = event_bus.subscribe();
        let (tracker, _) = tracker(&event_bus);

        tracker.on_bytes_sent(1000, 1000);
        tracker.acknowledge();
        tracker.acknowledge();
        tracker.on_bytes_sent(1000, 1000);

        assert_eq!(percents(&mut receiver), vec![99, 100]);
    }
}
