use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use rcfinder_core::Provider;

use crate::error::SearchError;
use crate::query::{Scope, SearchQuery};
use crate::retry::retry_with_backoff;

/// The network seam of the search pipeline. The coordinator only knows this
/// trait, so its debounce/cache/single-flight behavior is testable without
/// a live endpoint.
pub trait SearchBackend: Send + Sync + 'static {
    fn search_providers(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<Provider>, SearchError>> + Send;
}

/// One region record as the region-by-ZIP collaborator returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub acronym: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// HTTP client for the provider search API.
///
/// Handles rate limiting (429), not-found (404), and other non-2xx responses
/// as typed errors. Transient errors (429, network failures) are
/// automatically retried with exponential backoff up to `max_retries`
/// additional attempts; 404s and parse failures are not.
#[derive(Debug)]
pub struct ProviderApiClient {
    client: Client,
    base_url: reqwest::Url,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff: `backoff_base_secs * 2^attempt`.
    backoff_base_secs: u64,
}

impl ProviderApiClient {
    /// Creates a `ProviderApiClient` with configured timeout, `User-Agent`,
    /// and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidBaseUrl`] for an unparseable base URL and
    /// [`SearchError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, SearchError> {
        let base_url =
            reqwest::Url::parse(base_url).map_err(|e| SearchError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: e.to_string(),
            })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Fetches raw provider records for a canonical query.
    ///
    /// `Scope::Radius` queries hit the generic radius endpoint;
    /// `Scope::Zip` queries hit the regional-center-scoped endpoint.
    ///
    /// # Errors
    ///
    /// - [`SearchError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`SearchError::NotFound`] — HTTP 404 (not retried).
    /// - [`SearchError::UnexpectedStatus`] — any other non-2xx status (not retried).
    /// - [`SearchError::Http`] — network failure after all retries exhausted.
    /// - [`SearchError::Deserialize`] — response body does not match the
    ///   expected shape (not retried).
    pub async fn fetch_providers(&self, query: &SearchQuery) -> Result<Vec<Provider>, SearchError> {
        let path = match query.scope {
            Scope::Radius => "api/v1/providers/search",
            Scope::Zip => "api/v1/providers/by-zip",
        };
        let url = self.endpoint(path, &query.params)?;
        self.get_json(url, "provider search").await
    }

    /// Looks up the region covering a ZIP code via the region-by-ZIP
    /// collaborator. A 404 means "no region covers this ZIP" and maps to
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::fetch_providers`], except 404.
    pub async fn region_by_zip(&self, zip: &str) -> Result<Option<RegionRecord>, SearchError> {
        let params = vec![("zip_code".to_string(), zip.to_string())];
        let url = self.endpoint("api/v1/regional-centers/by-zip", &params)?;
        match self.get_json::<RegionRecord>(url, "region by ZIP").await {
            Ok(record) => Ok(Some(record)),
            Err(SearchError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn endpoint(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<reqwest::Url, SearchError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| SearchError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: reqwest::Url,
        context: &str,
    ) -> Result<T, SearchError> {
        let max_retries = self.max_retries;
        let backoff_base_secs = self.backoff_base_secs;

        retry_with_backoff(max_retries, backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(SearchError::RateLimited { retry_after_secs });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(SearchError::NotFound {
                        url: url.to_string(),
                    });
                }

                if !status.is_success() {
                    return Err(SearchError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<T>(&body).map_err(|e| SearchError::Deserialize {
                    context: context.to_owned(),
                    source: e,
                })
            }
        })
        .await
    }
}

impl SearchBackend for ProviderApiClient {
    async fn search_providers(&self, query: &SearchQuery) -> Result<Vec<Provider>, SearchError> {
        self.fetch_providers(query).await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
