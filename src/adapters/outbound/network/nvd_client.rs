use super::nvd_mapper::{NvdMapper, NvdResponse};
use crate::ports::outbound::{FeedBatch, VulnerabilityFeed};
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use std::time::Duration;

/// NVD CVE API 2.0 client
///
/// Fetches the CVEs published within a trailing window of days, page by
/// page.
///
/// # Rate limiting
/// The API allows roughly 100 requests per minute with a key and 10
/// without; the client waits 0.6 s or 6 s between pages accordingly.
/// A failed page stops paging; records fetched so far are kept.
pub struct NvdClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    window_days: i64,
    page_delay: Duration,
}

impl NvdClient {
    const API_ENDPOINT: &'static str = "https://services.nvd.nist.gov/rest/json/cves/2.0";
    const TIMEOUT_SECONDS: u64 = 30;
    const RESULTS_PER_PAGE: usize = 2000;
    const DELAY_WITH_KEY: Duration = Duration::from_millis(600);
    const DELAY_WITHOUT_KEY: Duration = Duration::from_secs(6);

    /// Creates a client for the public endpoint
    ///
    /// # Arguments
    /// * `api_key` - Optional NVD API key, sent as the `apiKey` header
    /// * `window_days` - How many days back to fetch
    pub fn new(api_key: Option<String>, window_days: u32) -> Result<Self> {
        let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .timeout(Duration::from_secs(Self::TIMEOUT_SECONDS))
            .user_agent(user_agent)
            .build()?;

        let page_delay = if api_key.is_some() {
            Self::DELAY_WITH_KEY
        } else {
            Self::DELAY_WITHOUT_KEY
        };

        Ok(Self {
            client,
            base_url: Self::API_ENDPOINT.to_string(),
            api_key,
            window_days: i64::from(window_days),
            page_delay,
        })
    }

    /// Points the client at another endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    fn page_url(&self, start_index: usize) -> String {
        let end = Utc::now();
        let start = end - ChronoDuration::days(self.window_days);
        let pub_start = start.format("%Y-%m-%dT00:00:00.000").to_string();
        let pub_end = end.format("%Y-%m-%dT23:59:59.999").to_string();

        format!(
            "{}?pubStartDate={}&pubEndDate={}&startIndex={}&resultsPerPage={}",
            self.base_url,
            urlencoding::encode(&pub_start),
            urlencoding::encode(&pub_end),
            start_index,
            Self::RESULTS_PER_PAGE
        )
    }

    async fn fetch_page(&self, start_index: usize) -> Result<NvdResponse> {
        let mut request = self.client.get(self.page_url(start_index));
        if let Some(key) = &self.api_key {
            request = request.header("apiKey", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            anyhow::bail!("NVD API returned status code {}", response.status());
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl VulnerabilityFeed for NvdClient {
    async fn fetch(&self) -> Result<FeedBatch> {
        let mut batch = FeedBatch::default();
        let mut start_index = 0;

        loop {
            tracing::info!(start_index, "requesting CVE page");
            let page = match self.fetch_page(start_index).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!(start_index, error = %e, "failed to fetch CVE page, stopping");
                    break;
                }
            };

            if page.vulnerabilities.is_empty() {
                break;
            }
            let total_results = page.total_results;
            let mapped = NvdMapper::map_response(page);
            tracing::info!(
                fetched = mapped.vulnerabilities.len(),
                rejected = mapped.rejected,
                total_results,
                "retrieved CVE page"
            );
            batch.vulnerabilities.extend(mapped.vulnerabilities);
            batch.rejected += mapped.rejected;

            if start_index + Self::RESULTS_PER_PAGE >= total_results {
                break;
            }
            start_index += Self::RESULTS_PER_PAGE;
            tokio::time::sleep(self.page_delay).await;
        }

        tracing::info!(total = batch.vulnerabilities.len(), "CVE fetch finished");
        Ok(batch)
    }
}
