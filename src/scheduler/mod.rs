//! Scheduler module for dashboard panel refreshes.
//!
//! Every mounted panel owns one refresh loop; panels share nothing but the
//! series source.

use crate::feed::{LiveSnapshot, SeriesSource};
use crate::store::OceanSample;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub type PanelId = u64;

pub const DEFAULT_PANEL_IDLE_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_PANELS: usize = 256;

/// Scheduler error types.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("too many panels mounted (limit {0})")]
    TooManyPanels(usize),
}

/// What a panel currently shows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PanelState {
    /// Empty until the initial load has run
    pub series: Vec<OceanSample>,
    /// Timer-driven regenerations, not counting the initial load
    pub refreshes: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
}

struct Panel {
    state: RwLock<PanelState>,
    /// Milliseconds since the scheduler epoch at the last read
    last_read_ms: AtomicU64,
}

impl Panel {
    fn touch(&self, epoch: Instant) {
        self.last_read_ms.store(millis_since(epoch), Ordering::Relaxed);
    }

    fn idle_for(&self, epoch: Instant) -> Duration {
        let last = self.last_read_ms.load(Ordering::Relaxed);
        Duration::from_millis(millis_since(epoch).saturating_sub(last))
    }
}

struct PanelEntry {
    stop_tx: broadcast::Sender<()>,
    panel: Arc<Panel>,
    handle: JoinHandle<()>,
}

type PanelMap = Arc<RwLock<HashMap<PanelId, PanelEntry>>>;

/// Mounts and unmounts panels and drives their refresh timers.
///
/// A panel that is not read for `idle_timeout` unmounts itself at its next tick.
pub struct Scheduler {
    source: Arc<dyn SeriesSource>,
    refresh_interval: Duration,
    idle_timeout: Duration,
    max_panels: usize,
    panels: PanelMap,
    last_panel_id: AtomicU64,
    epoch: Instant,
}

impl Scheduler {
    /// Create a scheduler that regenerates each panel every `refresh_interval`.
    pub fn new(source: Arc<dyn SeriesSource>, refresh_interval: Duration) -> Self {
        Self {
            source,
            refresh_interval,
            idle_timeout: DEFAULT_PANEL_IDLE_TIMEOUT,
            max_panels: DEFAULT_MAX_PANELS,
            panels: Arc::new(RwLock::new(HashMap::new())),
            last_panel_id: AtomicU64::new(0),
            epoch: Instant::now(),
        }
    }

    /// Set the idle timeout after which unread panels are unmounted, and the
    /// number of panels that may be mounted at once.
    pub fn with_limits(mut self, idle_timeout: Duration, max_panels: usize) -> Self {
        self.idle_timeout = idle_timeout;
        self.max_panels = max_panels;
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Mount a panel and start its refresh loop.
    pub async fn mount_panel(&self) -> Result<PanelId, SchedulerError> {
        let mut panels = self.panels.write().await;
        if panels.len() >= self.max_panels {
            tracing::warn!("Scheduler: Refusing mount, {} panels already mounted", panels.len());
            return Err(SchedulerError::TooManyPanels(self.max_panels));
        }

        let id = self.last_panel_id.fetch_add(1, Ordering::SeqCst) + 1;

        let (stop_tx, stop_rx) = broadcast::channel(1);
        let panel = Arc::new(Panel {
            state: RwLock::new(PanelState::default()),
            last_read_ms: AtomicU64::new(0),
        });
        panel.touch(self.epoch);

        let handle = tokio::spawn(run_refresh_loop(
            id,
            RefreshContext {
                source: self.source.clone(),
                period: self.refresh_interval,
                idle_timeout: self.idle_timeout,
                epoch: self.epoch,
                panels: self.panels.clone(),
            },
            panel.clone(),
            stop_rx,
        ));

        panels.insert(
            id,
            PanelEntry {
                stop_tx,
                panel,
                handle,
            },
        );

        tracing::info!("Scheduler: Mounted panel {}", id);
        Ok(id)
    }

    /// Stop a panel's refresh loop and wait for it to finish.
    ///
    /// Once this returns, the panel's source is never called again.
    /// Returns `false` if no such panel is mounted.
    pub async fn unmount_panel(&self, id: PanelId) -> bool {
        let entry = self.panels.write().await.remove(&id);

        let Some(entry) = entry else {
            return false;
        };

        let _ = entry.stop_tx.send(());
        if let Err(e) = entry.handle.await {
            tracing::error!("Scheduler: Refresh loop for panel {} ended abnormally: {}", id, e);
        }

        tracing::info!("Scheduler: Unmounted panel {}", id);
        true
    }

    /// Look up a panel and mark it as read.
    async fn read_panel(&self, id: PanelId) -> Option<Arc<Panel>> {
        let panel = self.panels.read().await.get(&id).map(|e| e.panel.clone())?;
        panel.touch(self.epoch);
        Some(panel)
    }

    pub async fn panel_state(&self, id: PanelId) -> Option<PanelState> {
        let panel = self.read_panel(id).await?;
        let guard = panel.state.read().await;
        Some(guard.clone())
    }

    pub async fn series(&self, id: PanelId) -> Option<Vec<OceanSample>> {
        self.panel_state(id).await.map(|s| s.series)
    }

    /// Current conditions for a panel; the placeholder until its first load.
    pub async fn snapshot(&self, id: PanelId) -> Option<LiveSnapshot> {
        let panel = self.read_panel(id).await?;
        let guard = panel.state.read().await;
        Some(LiveSnapshot::from_series(&guard.series))
    }

    pub async fn panel_ids(&self) -> Vec<PanelId> {
        let mut ids: Vec<PanelId> = self.panels.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Unmount every panel.
    pub async fn shutdown(&self) {
        let ids = self.panel_ids().await;
        tracing::info!("Scheduler: Shutting down {} panels", ids.len());

        for id in ids {
            self.unmount_panel(id).await;
        }
    }
}

/// Everything a refresh loop needs besides its own panel.
struct RefreshContext {
    source: Arc<dyn SeriesSource>,
    period: Duration,
    idle_timeout: Duration,
    epoch: Instant,
    panels: PanelMap,
}

/// Run the refresh loop for a single panel.
async fn run_refresh_loop(
    id: PanelId,
    ctx: RefreshContext,
    panel: Arc<Panel>,
    mut stop_rx: broadcast::Receiver<()>,
) {
    // Unmounted before the loop got to run
    if !matches!(stop_rx.try_recv(), Err(broadcast::error::TryRecvError::Empty)) {
        return;
    }

    load(&*ctx.source, &panel.state, false).await;

    let start = Instant::now() + ctx.period;
    let mut interval = tokio::time::interval_at(start, ctx.period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            _ = interval.tick() => {
                let idle = panel.idle_for(ctx.epoch);
                if idle >= ctx.idle_timeout {
                    ctx.panels.write().await.remove(&id);
                    tracing::info!("Scheduler: Unmounted panel {} after {}s unread", id, idle.as_secs());
                    break;
                }

                load(&*ctx.source, &panel.state, true).await;
                tracing::debug!("Scheduler: Refreshed panel {}", id);
            }
        }
    }
}

async fn load(source: &dyn SeriesSource, state: &RwLock<PanelState>, is_refresh: bool) {
    let now = Utc::now();
    let series = source.generate(now);

    let mut guard = state.write().await;
    guard.series = series;
    guard.refreshed_at = Some(now);
    if is_refresh {
        guard.refreshes += 1;
    }
}

fn millis_since(epoch: Instant) -> u64 {
    u64::try_from(epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
}
