// src/probe/mod.rs
mod aggregator;
mod http;
mod result;

pub use aggregator::{CheckError, ProbeAggregator};
pub use http::{classify, HttpProbe, Probe};
pub use result::{ProbeResult, SiteStatus, StatusSnapshot};
