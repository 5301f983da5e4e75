// src/sites.rs
// The monitored sites are compiled in; there is no runtime surface for them.

const SERVER1_SITES: &[&str] = &[
    "https://brahamand.ai",
    "https://subvivah.com",
    "https://foodfly.co",
    "https://customerzone.in",
    "https://tutorbuddy.co",
];

const SERVER2_SITES: &[&str] = &[
    "https://chitbox.co",
    "https://connectflow.co.in",
    "https://amenties.rozgarhub.co",
    "https://orbitx.zone",
];

/// A named bucket of sites. Groups differ only in how they are displayed.
#[derive(Debug, Clone)]
pub struct SiteGroup {
    /// Field name in the status JSON.
    pub key: &'static str,
    /// Column heading on the dashboard.
    pub title: &'static str,
    pub urls: Vec<String>,
}

impl SiteGroup {
    pub fn new(key: &'static str, title: &'static str, urls: Vec<String>) -> Self {
        Self { key, title, urls }
    }
}

#[derive(Debug, Clone)]
pub struct SiteGroups {
    pub server1: SiteGroup,
    pub server2: SiteGroup,
}

impl SiteGroups {
    pub fn new(server1: Vec<String>, server2: Vec<String>) -> Self {
        Self {
            server1: SiteGroup::new("server1", "Server 1", server1),
            server2: SiteGroup::new("server2", "Server 2", server2),
        }
    }

    /// The compiled-in site lists.
    pub fn builtin() -> Self {
        Self::new(
            SERVER1_SITES.iter().map(|s| s.to_string()).collect(),
            SERVER2_SITES.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteGroup> {
        [&self.server1, &self.server2].into_iter()
    }

    pub fn total_sites(&self) -> usize {
        self.server1.urls.len() + self.server2.urls.len()
    }
}

/// Strip the scheme for display.
pub fn display_domain(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}
