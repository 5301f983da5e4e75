mod collector;
mod server;

pub use collector::{MetricsCollector, MetricsRegistry};
pub use server::start_metrics_server;
