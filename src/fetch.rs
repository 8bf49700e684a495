use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, USER_AGENT};
use reqwest::Client;

use crate::error::IngestError;

/// Browser-like agent; many recipe sites reject obvious bots
const AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Option<Duration>) -> Self {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));
        let mut headers = HeaderMap::new();
        if let Ok(agent) = AGENT.parse() {
            headers.insert(USER_AGENT, agent);
        }
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| Client::new());

        Fetcher { client }
    }

    /// Fetch a page body. A non-2xx status is surfaced to the caller as a
    /// strategy-blocking error, never silently retried here.
    pub async fn fetch(&self, url: &str) -> Result<String, IngestError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::HttpStatus(status.as_u16()));
        }
        let body = response.text().await?;
        debug!("fetched {} bytes from {url}", body.len());
        Ok(body)
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Fetcher::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_fetch_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/recipe")
            .with_status(200)
            .with_body("<html><body>hello</body></html>")
            .create();

        let fetcher = Fetcher::default();
        let body = fetcher.fetch(&format!("{}/recipe", server.url())).await.unwrap();
        assert!(body.contains("hello"));
        mock.assert();
    }

    #[tokio::test]
    async fn test_non_success_status_is_surfaced() {
        let mut server = Server::new_async().await;
        let mock = server.mock("GET", "/gone").with_status(404).create();

        let fetcher = Fetcher::default();
        let result = fetcher.fetch(&format!("{}/gone", server.url())).await;
        assert!(matches!(result, Err(IngestError::HttpStatus(404))));
        mock.assert();
    }
}
