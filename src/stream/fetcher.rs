//! Paginated fetcher for one Medusa admin resource

use super::types::{ReplicationContext, StreamConfig};
use crate::auth::AuthMethod;
use crate::config::MedusaConfig;
use crate::decode::{JsonDecoder, RecordDecoder};
use crate::error::Result;
use crate::http::{ApiResponse, HttpClient, RequestConfig};
use crate::pagination::OffsetPaginator;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Format used for `[gt]` replication filters
pub const FILTER_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Admin API root for a configured base URL
///
/// Trailing slashes are dropped and `/admin` appended unless already present,
/// so applying it twice gives the same result.
pub fn compute_base_url(root: &str) -> String {
    let root = root.trim_end_matches('/');
    if root.ends_with("/admin") {
        root.to_string()
    } else {
        format!("{root}/admin")
    }
}

/// Render a replication filter timestamp
pub fn format_filter_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(FILTER_TIMESTAMP_FORMAT).to_string()
}

/// One fetched page
#[derive(Debug, Clone)]
pub struct Page {
    /// Records found at the stream's records path
    pub records: Vec<Value>,
    /// Cursor for the next request; `None` ends pagination
    pub next_token: Option<u64>,
    /// URL the page was fetched from
    pub url: String,
}

/// Builds requests for one stream and interprets its responses
#[derive(Debug, Clone)]
pub struct MedusaStream {
    config: StreamConfig,
    auth: AuthMethod,
    http: HttpClient,
    url_base: String,
    user_agent: Option<String>,
    start_date: Option<DateTime<Utc>>,
    decoder: JsonDecoder,
    paginator: OffsetPaginator,
}

impl MedusaStream {
    /// Create a fetcher for `config` using the tap settings and shared auth
    pub fn new(
        config: StreamConfig,
        tap_config: &MedusaConfig,
        auth: AuthMethod,
        http: HttpClient,
    ) -> Self {
        let decoder = JsonDecoder::with_path(config.records_path.clone());
        Self {
            url_base: compute_base_url(&tap_config.base_url),
            user_agent: tap_config.user_agent.clone(),
            start_date: tap_config.start_date(),
            config,
            auth,
            http,
            decoder,
            paginator: OffsetPaginator::default(),
        }
    }

    /// Stream name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Stream configuration
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Authentication shared with other streams
    pub fn auth(&self) -> &AuthMethod {
        &self.auth
    }

    /// Admin API root
    pub fn url_base(&self) -> &str {
        &self.url_base
    }

    /// Full resource URL
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.url_base,
            self.config.path.trim_start_matches('/')
        )
    }

    /// Headers for the next request
    ///
    /// With bearer auth this may trigger a login exchange.
    pub async fn build_headers(&self) -> Result<HashMap<String, String>> {
        let mut headers = HashMap::new();
        if let Some(agent) = &self.user_agent {
            headers.insert("User-Agent".to_string(), agent.clone());
        }

        let (name, value) = self.auth.header().await?;
        headers.insert(name.to_string(), value);
        Ok(headers)
    }

    /// Replication key the date filter applies to
    fn replication_key<'a>(&'a self, context: &'a ReplicationContext) -> Option<&'a str> {
        context
            .replication_key
            .as_deref()
            .or(self.config.replication_key.as_deref())
    }

    /// Effective start: the bookmark, else the configured start date
    pub fn starting_time(&self, context: &ReplicationContext) -> Option<DateTime<Utc>> {
        context.starting_timestamp.or(self.start_date)
    }

    /// Query parameters for the page after `previous_token`
    pub fn build_url_params(
        &self,
        context: &ReplicationContext,
        previous_token: Option<u64>,
    ) -> HashMap<String, String> {
        let mut params = self.config.additional_params.clone();
        params.extend(self.paginator.page_params(previous_token));

        let key = self.replication_key(context);
        if let (Some(key), Some(start)) = (key, self.starting_time(context)) {
            // strictly greater than the boundary record
            let start = start + Duration::seconds(1);
            params.insert(format!("{key}[gt]"), format_filter_timestamp(start));
        }

        params
    }

    /// Records in a successful response
    pub fn parse_records(&self, response: &ApiResponse) -> Result<Vec<Value>> {
        let body = response.json()?;
        self.decoder.records(&body)
    }

    /// Next pagination cursor; `None` once a page comes back empty
    pub fn next_page_token(
        &self,
        response: &ApiResponse,
        previous_token: Option<u64>,
    ) -> Result<Option<u64>> {
        let records = self.parse_records(response)?;
        Ok(self.paginator.next_token(previous_token, records.len()))
    }

    /// Diagnostic for a failed response
    pub fn describe_response_error(&self, response: &ApiResponse) -> String {
        response.describe_error()
    }

    /// Fetch the page after `previous_token`
    ///
    /// A 401 under bearer auth drops the rejected token and retries once.
    pub async fn fetch_page(
        &self,
        context: &ReplicationContext,
        previous_token: Option<u64>,
    ) -> Result<Page> {
        let url = self.url();
        let params = self.build_url_params(context, previous_token);

        let headers = self.build_headers().await?;
        let response = match self.send(&url, &params, headers.clone()).await {
            Err(e) if e.status() == Some(401) => {
                let (Some(manager), Some(rejected)) =
                    (self.auth.credential_manager(), bearer_token(&headers))
                else {
                    return Err(e);
                };
                manager.invalidate(rejected).await;
                warn!(stream = %self.name(), "Request unauthorized, retrying with a new token");
                let headers = self.build_headers().await?;
                self.send(&url, &params, headers).await?
            }
            other => other?,
        };

        let records = self.parse_records(&response)?;
        let next_token = self.paginator.next_token(previous_token, records.len());

        debug!(
            stream = %self.name(),
            offset = previous_token.unwrap_or(0),
            records = records.len(),
            "Fetched page"
        );

        Ok(Page {
            records,
            next_token,
            url: response.url,
        })
    }

    async fn send(
        &self,
        url: &str,
        params: &HashMap<String, String>,
        headers: HashMap<String, String>,
    ) -> Result<ApiResponse> {
        let request = RequestConfig::new()
            .with_headers(headers)
            .with_query(params.clone());
        self.http.get(url, &request).await
    }
}

fn bearer_token(headers: &HashMap<String, String>) -> Option<&str> {
    headers.get("Authorization")?.strip_prefix("Bearer ")
}
