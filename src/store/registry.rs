//! In-memory registry of session hazard reports.

use super::models::UploadedReport;

use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{broadcast, RwLock};

/// Append-only, most-recent-first store of uploaded reports.
///
/// One registry lives for the whole session and is shared by handle.
pub struct UploadRegistry {
    reports: RwLock<VecDeque<UploadedReport>>,
    last_id: AtomicI64,
    max_reports: Option<usize>,
    added_tx: broadcast::Sender<UploadedReport>,
}

impl Default for UploadRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl UploadRegistry {
    /// Create a registry. With `max_reports` set, the oldest reports are
    /// evicted once the cap is exceeded.
    pub fn new(max_reports: Option<usize>) -> Self {
        let (added_tx, _) = broadcast::channel(64);
        Self {
            reports: RwLock::new(VecDeque::new()),
            last_id: AtomicI64::new(0),
            max_reports,
            added_tx,
        }
    }

    /// Allocate a report id: the current time in milliseconds, bumped past
    /// the previous id when two submissions share a millisecond.
    pub fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or_else(|last| last);
        now.max(prev + 1)
    }

    /// Add a report at the front of the list and notify subscribers.
    pub async fn add(&self, report: UploadedReport) {
        {
            let mut reports = self.reports.write().await;
            reports.push_front(report.clone());

            if let Some(max) = self.max_reports {
                while reports.len() > max {
                    if let Some(evicted) = reports.pop_back() {
                        tracing::debug!("UploadRegistry: Evicted report {}", evicted.id);
                    }
                }
            }
        }

        // No subscribers is fine
        let _ = self.added_tx.send(report);
    }

    /// Snapshot of all reports, most recent first.
    pub async fn list(&self) -> Vec<UploadedReport> {
        self.reports.read().await.iter().cloned().collect()
    }

    pub async fn get(&self, id: i64) -> Option<UploadedReport> {
        self.reports.read().await.iter().find(|r| r.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.reports.read().await.len()
    }

    /// Receive every report added after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadedReport> {
        self.added_tx.subscribe()
    }
}
