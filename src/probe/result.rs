// src/probe/result.rs
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub url: String,
    pub status: SiteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ProbeResult {
    pub fn up(url: impl Into<String>, status_code: u16) -> Self {
        Self {
            url: url.into(),
            status: SiteStatus::Up,
            status_code: Some(status_code),
        }
    }

    /// A `down` result with no response code: the request never completed.
    pub fn down(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: SiteStatus::Down,
            status_code: None,
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == SiteStatus::Up
    }
}

/// Results of one check cycle, grouped in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub server1: Vec<ProbeResult>,
    pub server2: Vec<ProbeResult>,
    #[serde(serialize_with = "serialize_iso8601")]
    pub timestamp: DateTime<Utc>,
}

impl StatusSnapshot {
    pub fn up_count(&self) -> usize {
        self.server1
            .iter()
            .chain(self.server2.iter())
            .filter(|r| r.is_up())
            .count()
    }

    pub fn total(&self) -> usize {
        self.server1.len() + self.server2.len()
    }
}

fn serialize_iso8601<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
