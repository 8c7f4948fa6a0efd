use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use url::Url;

use crate::error::Result;

const USER_AGENT_STRING: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Downloads raw page markup the way a browser tab would request it.
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, page_url: &str) -> Result<String> {
        let url = Url::parse(page_url)
            .map_err(|e| anyhow::anyhow!("Invalid URL {}: {}", page_url, e))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!("Unsupported URL scheme: {}", url.scheme()).into());
        }

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            tracing::debug!("Failed to fetch {}: {}", page_url, response.status());
            return Err(anyhow::anyhow!("Failed to fetch page: HTTP {}", response.status()).into());
        }

        let html = response.text().await?;
        tracing::debug!("Fetched {} ({} bytes)", page_url, html.len());
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_markup_with_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>hi</body></html>"))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new().unwrap();
        let html = fetcher.fetch(&format!("{}/article", server.uri())).await.unwrap();
        assert!(html.contains("hi"));
    }

    #[tokio::test]
    async fn error_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new().unwrap();
        assert!(fetcher.fetch(&format!("{}/missing", server.uri())).await.is_err());
    }

    #[tokio::test]
    async fn rejects_non_http_urls() {
        let fetcher = PageFetcher::new().unwrap();
        assert!(fetcher.fetch("ftp://example.com/file").await.is_err());
        assert!(fetcher.fetch("not a url").await.is_err());
    }
}
