// src/metrics/collector.rs
use anyhow::{Context, Result};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .context("Failed to encode metrics")?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    // Probe metrics
    pub probes_total: IntCounterVec,
    pub probe_duration_seconds: HistogramVec,

    // Check cycle metrics
    pub check_cycles_total: IntCounterVec,
    pub checks_in_flight: IntGauge,
    pub sites_up: IntGaugeVec,
    pub sites_total: IntGaugeVec,

    // HTTP surface
    pub http_requests_total: IntCounterVec,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let probes_total = IntCounterVec::new(
            Opts::new("monitor_probes_total", "Total number of site probes"),
            &["group", "status"],
        )?;
        registry.register(Box::new(probes_total.clone()))?;

        let probe_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "monitor_probe_duration_seconds",
                "Site probe duration in seconds",
            ),
            &["group"],
        )?;
        registry.register(Box::new(probe_duration_seconds.clone()))?;

        let check_cycles_total = IntCounterVec::new(
            Opts::new("monitor_check_cycles_total", "Total check cycles by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(check_cycles_total.clone()))?;

        let checks_in_flight =
            IntGauge::new("monitor_checks_in_flight", "Dashboard checks currently running")?;
        registry.register(Box::new(checks_in_flight.clone()))?;

        let sites_up = IntGaugeVec::new(
            Opts::new("monitor_sites_up", "Sites up in the latest check cycle"),
            &["group"],
        )?;
        registry.register(Box::new(sites_up.clone()))?;

        let sites_total = IntGaugeVec::new(
            Opts::new("monitor_sites_total", "Sites probed in the latest check cycle"),
            &["group"],
        )?;
        registry.register(Box::new(sites_total.clone()))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("monitor_http_requests_total", "Total HTTP requests served"),
            &["route", "status_code"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        Ok(Self {
            probes_total,
            probe_duration_seconds,
            check_cycles_total,
            checks_in_flight,
            sites_up,
            sites_total,
            http_requests_total,
        })
    }

    pub fn record_probe(&self, group: &str, up: bool, duration: Duration) {
        let status = if up { "up" } else { "down" };
        self.probes_total
            .with_label_values(&[group, status])
            .inc();

        self.probe_duration_seconds
            .with_label_values(&[group])
            .observe(duration.as_secs_f64());
    }

    pub fn record_cycle(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.check_cycles_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn update_group_counts(&self, group: &str, up: usize, total: usize) {
        self.sites_up.with_label_values(&[group]).set(up as i64);
        self.sites_total.with_label_values(&[group]).set(total as i64);
    }

    pub fn increment_checks_in_flight(&self) {
        self.checks_in_flight.inc();
    }

    pub fn decrement_checks_in_flight(&self) {
        self.checks_in_flight.dec();
    }

    pub fn record_http_request(&self, route: &str, status_code: u16) {
        let status = status_code.to_string();
        self.http_requests_total
            .with_label_values(&[route, &status])
            .inc();
    }
}
