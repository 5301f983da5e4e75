// src/dashboard/state.rs
use super::render::{render_page, PageView};
use crate::config::DashboardSettings;
use crate::metrics::MetricsCollector;
use crate::probe::{CheckError, ProbeAggregator, StatusSnapshot};
use crate::sites::SiteGroups;
use arc_swap::ArcSwapOption;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

/// Owns the latest snapshot and keeps it fresh.
///
/// Checks start on a timer and on demand. Overlapping checks are not
/// deduplicated; whichever finishes last replaces the snapshot.
pub struct Dashboard {
    aggregator: Arc<ProbeAggregator>,
    groups: SiteGroups,
    snapshot: ArcSwapOption<StatusSnapshot>,
    in_flight: Arc<AtomicUsize>,
    refresh_interval: Duration,
    page_refresh_secs: u64,
    metrics: Option<Arc<MetricsCollector>>,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
}

impl Dashboard {
    pub fn new(
        aggregator: Arc<ProbeAggregator>,
        groups: SiteGroups,
        settings: &DashboardSettings,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        Self {
            aggregator,
            groups,
            snapshot: ArcSwapOption::empty(),
            in_flight: Arc::new(AtomicUsize::new(0)),
            refresh_interval: settings.refresh_interval(),
            page_refresh_secs: settings.page_refresh_secs,
            metrics,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn aggregator(&self) -> &ProbeAggregator {
        &self.aggregator
    }

    pub fn groups(&self) -> &SiteGroups {
        &self.groups
    }

    pub fn snapshot(&self) -> Option<Arc<StatusSnapshot>> {
        self.snapshot.load_full()
    }

    /// True while at least one check is running.
    pub fn is_checking(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Run one check and replace the held snapshot on success. On failure
    /// the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<(), CheckError> {
        let _checking = CheckingGuard::enter(self);
        self.check().await
    }

    async fn check(&self) -> Result<(), CheckError> {
        match self.aggregator.check_all(&self.groups).await {
            Ok(snapshot) => {
                self.snapshot.store(Some(Arc::new(snapshot)));
                Ok(())
            }
            Err(e) => {
                error!("Failed to check status: {}", e);
                Err(e)
            }
        }
    }

    /// Start a check in the background. The dashboard reads as checking
    /// from the moment this returns.
    pub fn trigger(self: &Arc<Self>) -> JoinHandle<()> {
        let checking = CheckingGuard::enter(self);
        let dashboard = self.clone();
        tokio::spawn(async move {
            let _checking = checking;
            let _ = dashboard.check().await;
        })
    }

    /// Check immediately, then on every interval tick until shutdown.
    pub async fn start(self: Arc<Self>) {
        let mut interval = interval(self.refresh_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_rx = self.shutdown_rx.clone();

        info!(
            "Starting dashboard refresh with interval: {:?}",
            self.refresh_interval
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.trigger();
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Dashboard refresh shutting down");
                        break;
                    }
                }
            }
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Render the dashboard page as of now.
    pub fn page(&self) -> String {
        let snapshot = self.snapshot();
        render_page(&PageView {
            groups: &self.groups,
            snapshot: snapshot.as_deref(),
            checking: self.is_checking(),
            now: Utc::now(),
            page_refresh_secs: self.page_refresh_secs,
        })
    }
}

/// Marks a check in flight for as long as it lives, so the busy state is
/// left however the check ends.
struct CheckingGuard {
    in_flight: Arc<AtomicUsize>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl CheckingGuard {
    fn enter(dashboard: &Dashboard) -> Self {
        dashboard.in_flight.fetch_add(1, Ordering::SeqCst);
        if let Some(metrics) = &dashboard.metrics {
            metrics.increment_checks_in_flight();
        }
        Self {
            in_flight: dashboard.in_flight.clone(),
            metrics: dashboard.metrics.clone(),
        }
    }
}

impl Drop for CheckingGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if let Some(metrics) = &self.metrics {
            metrics.decrement_checks_in_flight();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{classify, Probe, ProbeResult};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::atomic::AtomicBool;
    use tokio::sync::Semaphore;

    /// Each probe waits for a permit, then answers with the current code
    /// (or panics when `fail` is set).
    struct GatedProbe {
        gate: Semaphore,
        fail: AtomicBool,
        code: AtomicUsize,
        answered: AtomicUsize,
    }

    impl GatedProbe {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                gate: Semaphore::new(0),
                fail: AtomicBool::new(false),
                code: AtomicUsize::new(200),
                answered: AtomicUsize::new(0),
            })
        }

        fn release(&self, code: u16) {
            self.code.store(code as usize, Ordering::SeqCst);
            self.gate.add_permits(1);
        }
    }

    #[async_trait]
    impl Probe for GatedProbe {
        async fn probe(&self, url: &str) -> ProbeResult {
            self.gate.acquire().await.unwrap().forget();
            if self.fail.load(Ordering::SeqCst) {
                panic!("probe failure for {}", url);
            }
            let code = self.code.load(Ordering::SeqCst) as u16;
            self.answered.fetch_add(1, Ordering::SeqCst);
            classify(url, StatusCode::from_u16(code).unwrap())
        }
    }

    fn dashboard(probe: Arc<GatedProbe>) -> Arc<Dashboard> {
        dashboard_with(probe, &DashboardSettings::default())
    }

    fn dashboard_with(probe: Arc<GatedProbe>, settings: &DashboardSettings) -> Arc<Dashboard> {
        let aggregator = Arc::new(ProbeAggregator::with_probe(probe, None));
        let groups = SiteGroups::new(vec!["https://a".into()], vec![]);
        Arc::new(Dashboard::new(aggregator, groups, settings, None))
    }

    async fn wait_for_in_flight(dashboard: &Dashboard, count: usize) {
        while dashboard.in_flight.load(Ordering::SeqCst) != count {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_busy_while_checking_then_idle() {
        let probe = GatedProbe::new();
        let dashboard = dashboard(probe.clone());
        assert!(!dashboard.is_checking());
        assert!(dashboard.snapshot().is_none());

        let handle = dashboard.trigger();
        assert!(dashboard.is_checking());
        wait_for_in_flight(&dashboard, 1).await;
        assert!(dashboard.page().contains("Checking..."));

        probe.release(200);
        handle.await.unwrap();

        assert!(!dashboard.is_checking());
        let snapshot = dashboard.snapshot().unwrap();
        assert_eq!(snapshot.server1, vec![ProbeResult::up("https://a", 200)]);
    }

    #[tokio::test]
    async fn test_failed_check_keeps_previous_snapshot() {
        let probe = GatedProbe::new();
        let dashboard = dashboard(probe.clone());

        probe.release(200);
        dashboard.refresh().await.unwrap();
        let before = dashboard.snapshot().unwrap();

        probe.fail.store(true, Ordering::SeqCst);
        probe.release(200);
        assert!(dashboard.refresh().await.is_err());

        assert!(!dashboard.is_checking());
        assert!(Arc::ptr_eq(&before, &dashboard.snapshot().unwrap()));
    }

    #[tokio::test]
    async fn test_last_completed_check_wins() {
        let probe = GatedProbe::new();
        let dashboard = dashboard(probe.clone());

        let first = dashboard.trigger();
        let second = dashboard.trigger();
        wait_for_in_flight(&dashboard, 2).await;

        probe.release(200);
        wait_for_in_flight(&dashboard, 1).await;
        assert_eq!(dashboard.snapshot().unwrap().server1[0].status_code, Some(200));

        probe.release(503);
        first.await.unwrap();
        second.await.unwrap();

        let snapshot = dashboard.snapshot().unwrap();
        assert_eq!(snapshot.server1[0].status_code, Some(503));
        assert!(!dashboard.is_checking());
    }

    #[tokio::test]
    async fn test_start_checks_immediately_and_stops_on_shutdown() {
        let probe = GatedProbe::new();
        let dashboard = dashboard(probe.clone());
        probe.release(200);

        let runner = tokio::spawn(dashboard.clone().start());
        while dashboard.snapshot().is_none() {
            tokio::task::yield_now().await;
        }

        dashboard.shutdown();
        runner.await.unwrap();
    }

    #[tokio::test]
    async fn test_trigger_reads_busy_before_task_runs() {
        let probe = GatedProbe::new();
        let dashboard = dashboard(probe.clone());

        // No await between trigger and render, so the spawned task has not run.
        let handle = dashboard.trigger();
        assert!(dashboard.is_checking());
        assert!(dashboard.page().contains("disabled>Checking...</button>"));

        probe.release(200);
        handle.await.unwrap();
        assert!(!dashboard.is_checking());
        assert!(dashboard.page().contains(">Refresh</button>"));
    }

    #[tokio::test]
    async fn test_start_repeats_on_every_interval() {
        let probe = GatedProbe::new();
        let settings = DashboardSettings {
            refresh_interval_secs: 1,
            ..DashboardSettings::default()
        };
        let dashboard = dashboard_with(probe.clone(), &settings);
        probe.release(200);
        probe.release(200);
        probe.release(200);

        let runner = tokio::spawn(dashboard.clone().start());
        tokio::time::timeout(Duration::from_secs(10), async {
            while probe.answered.load(Ordering::SeqCst) < 3 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("scheduler stopped checking after the first tick");

        dashboard.shutdown();
        runner.await.unwrap();
        assert!(probe.answered.load(Ordering::SeqCst) >= 3);
    }
}
