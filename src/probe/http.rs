// src/probe/http.rs
use super::result::{ProbeResult, SiteStatus};
use crate::config::ProbeSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use tokio::time::{timeout, Duration};
use tracing::debug;

/// A single reachability check against one site.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeResult;
}

/// Probes sites with a `HEAD` request, following redirects.
pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(settings: &ProbeSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .redirect(Policy::limited(settings.max_redirects))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            timeout: settings.timeout(),
        })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, url: &str) -> ProbeResult {
        // Dropping the send future on expiry aborts the request.
        let result = timeout(self.timeout, self.client.head(url).send()).await;

        match result {
            Ok(Ok(response)) => classify(url, response.status()),
            Ok(Err(e)) => {
                debug!(%url, error = %e, "probe failed");
                ProbeResult::down(url)
            }
            Err(_) => {
                debug!(%url, "probe timed out after {:?}", self.timeout);
                ProbeResult::down(url)
            }
        }
    }
}

/// Up only for a 2xx final status; the code is kept either way.
pub fn classify(url: &str, status: StatusCode) -> ProbeResult {
    if status.is_success() {
        return ProbeResult::up(url, status.as_u16());
    }
    ProbeResult {
        url: url.to_string(),
        status: SiteStatus::Down,
        status_code: Some(status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn probe_with_timeout(secs: u64) -> HttpProbe {
        HttpProbe::new(&ProbeSettings {
            timeout_secs: secs,
            max_redirects: 10,
        })
        .unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify("https://a", StatusCode::OK),
            ProbeResult::up("https://a", 200)
        );
        assert_eq!(
            classify("https://a", StatusCode::NO_CONTENT).status,
            SiteStatus::Up
        );

        let not_found = classify("https://a", StatusCode::NOT_FOUND);
        assert_eq!(not_found.status, SiteStatus::Down);
        assert_eq!(not_found.status_code, Some(404));

        let not_modified = classify("https://a", StatusCode::NOT_MODIFIED);
        assert_eq!(not_modified.status, SiteStatus::Down);
        assert_eq!(not_modified.status_code, Some(304));
    }

    #[tokio::test]
    async fn test_probe_up_on_200() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("HEAD", "/")
            .with_status(200)
            .create_async()
            .await;

        let url = server.url();
        let result = probe_with_timeout(10).probe(&url).await;

        mock.assert_async().await;
        assert_eq!(result, ProbeResult::up(url, 200));
    }

    #[tokio::test]
    async fn test_probe_down_on_404() {
        let mut server = Server::new_async().await;
        server
            .mock("HEAD", "/")
            .with_status(404)
            .create_async()
            .await;

        let result = probe_with_timeout(10).probe(&server.url()).await;

        assert_eq!(result.status, SiteStatus::Down);
        assert_eq!(result.status_code, Some(404));
    }

    #[tokio::test]
    async fn test_probe_follows_redirects() {
        let mut server = Server::new_async().await;
        let target = format!("{}/home", server.url());
        server
            .mock("HEAD", "/")
            .with_status(301)
            .with_header("location", &target)
            .create_async()
            .await;
        let landed = server
            .mock("HEAD", "/home")
            .with_status(200)
            .create_async()
            .await;

        let result = probe_with_timeout(10).probe(&server.url()).await;

        landed.assert_async().await;
        assert!(result.is_up());
        assert_eq!(result.status_code, Some(200));
    }

    #[tokio::test]
    async fn test_probe_down_without_code_on_connection_error() {
        // Bind then drop so nothing is listening on the port.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{}", addr);
        let result = probe_with_timeout(2).probe(&url).await;

        assert_eq!(result, ProbeResult::down(url));
    }

    #[tokio::test]
    async fn test_probe_down_without_code_on_timeout() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let url = format!("http://{}", addr);
        let result = probe_with_timeout(1).probe(&url).await;

        assert_eq!(result, ProbeResult::down(url));
    }
}
