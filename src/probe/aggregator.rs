// src/probe/aggregator.rs
use super::http::{HttpProbe, Probe};
use super::result::{ProbeResult, StatusSnapshot};
use crate::config::ProbeSettings;
use crate::metrics::MetricsCollector;
use crate::sites::{SiteGroup, SiteGroups};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("No probe produced a result ({attempted} dispatched)")]
    NoResults { attempted: usize },
}

/// Fans one probe per site out concurrently and joins them into a snapshot.
pub struct ProbeAggregator {
    probe: Arc<dyn Probe>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl ProbeAggregator {
    pub fn new(settings: &ProbeSettings, metrics: Option<Arc<MetricsCollector>>) -> Result<Self> {
        let probe = HttpProbe::new(settings)?;
        Ok(Self::with_probe(Arc::new(probe), metrics))
    }

    pub fn with_probe(probe: Arc<dyn Probe>, metrics: Option<Arc<MetricsCollector>>) -> Self {
        Self { probe, metrics }
    }

    /// Probe every site once. Per-site failures come back as `down`
    /// entries; only a cycle that yields no result at all is an error.
    pub async fn check_all(&self, groups: &SiteGroups) -> Result<StatusSnapshot, CheckError> {
        let cycle_id = Uuid::new_v4();
        let span = info_span!("check_cycle", %cycle_id);

        let outcome = self.run_cycle(groups).instrument(span).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_cycle(outcome.is_ok());
        }
        outcome
    }

    async fn run_cycle(&self, groups: &SiteGroups) -> Result<StatusSnapshot, CheckError> {
        let start = Instant::now();
        let targets: Vec<(&'static str, &str)> = groups
            .iter()
            .flat_map(|group| group.urls.iter().map(move |url| (group.key, url.as_str())))
            .collect();

        debug!("Dispatching {} probes", targets.len());

        let tasks = targets.iter().map(|(_, url)| {
            let probe = self.probe.clone();
            let url = url.to_string();
            tokio::spawn(async move {
                let started = Instant::now();
                let result = probe.probe(&url).await;
                (result, started.elapsed())
            })
        });

        // Wait for all probes to complete
        let joined = futures::future::join_all(tasks).await;

        let mut results: Vec<Option<ProbeResult>> = Vec::with_capacity(joined.len());
        for ((group, url), join_result) in targets.iter().zip(joined) {
            match join_result {
                Ok((result, elapsed)) => {
                    if result.is_up() {
                        debug!(%url, status_code = ?result.status_code, "site is up");
                    } else {
                        warn!(%url, status_code = ?result.status_code, "site is down");
                    }
                    if let Some(metrics) = &self.metrics {
                        metrics.record_probe(group, result.is_up(), elapsed);
                    }
                    results.push(Some(result));
                }
                Err(e) => {
                    error!(%url, "Probe task join error: {}", e);
                    results.push(None);
                }
            }
        }

        if !targets.is_empty() && results.iter().all(Option::is_none) {
            error!("Check cycle produced no results");
            return Err(CheckError::NoResults {
                attempted: targets.len(),
            });
        }

        let (first, second) = results.split_at(groups.server1.urls.len());
        let snapshot = StatusSnapshot {
            server1: assemble(&groups.server1, first),
            server2: assemble(&groups.server2, second),
            timestamp: Utc::now(),
        };

        if let Some(metrics) = &self.metrics {
            for (group, results) in [
                (&groups.server1, &snapshot.server1),
                (&groups.server2, &snapshot.server2),
            ] {
                let up = results.iter().filter(|r| r.is_up()).count();
                metrics.update_group_counts(group.key, up, results.len());
            }
        }

        info!(
            "Check cycle complete: {}/{} sites up in {:.2}s",
            snapshot.up_count(),
            snapshot.total(),
            start.elapsed().as_secs_f64()
        );

        Ok(snapshot)
    }
}

/// Lay results back out in the group's declaration order. A site without a
/// result is reported down.
fn assemble(group: &SiteGroup, results: &[Option<ProbeResult>]) -> Vec<ProbeResult> {
    group
        .urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            results
                .get(i)
                .cloned()
                .flatten()
                .unwrap_or_else(|| ProbeResult::down(url.as_str()))
        })
        .collect()
}
