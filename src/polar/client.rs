use backon::{ExponentialBuilder, Retryable};
use meetmind_schema::PolarOrderList;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::PolarConfig;
use crate::error::{IsRetryable, PolarError};

/// Characters of an upstream error body kept for logs and error messages.
pub const UPSTREAM_BODY_PREVIEW_CHARS: usize = 300;

const POLAR_USER_AGENT: &str = concat!("meetmind/", env!("CARGO_PKG_VERSION"));

static POLAR_RETRY_POLICY: LazyLock<ExponentialBuilder> = LazyLock::new(|| {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_millis(300))
        .with_max_times(2)
        .with_jitter()
});

/// Thin client for the Polar REST API.
#[derive(Debug, Clone)]
pub struct PolarClient {
    http: reqwest::Client,
    api_base: Url,
    access_token: Option<String>,
    pub organization_id: String,
    pub page_limit: u32,
    pub max_pages: u32,
}

impl PolarClient {
    pub fn new(cfg: &PolarConfig) -> Result<Self, PolarError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(POLAR_USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60));

        if let Some(proxy_url) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }

        Ok(Self {
            http: builder.build()?,
            api_base: cfg.api_base.clone(),
            access_token: cfg.token().map(str::to_string),
            organization_id: cfg.organization_id.clone(),
            page_limit: cfg.page_limit.max(1),
            max_pages: cfg.max_pages.max(1),
        })
    }

    pub fn has_token(&self) -> bool {
        self.access_token.is_some()
    }

    fn token(&self) -> Result<&str, PolarError> {
        self.access_token
            .as_deref()
            .ok_or(PolarError::MissingAccessToken)
    }

    fn endpoint(&self, path: &str) -> Result<Url, PolarError> {
        Ok(self.api_base.join(path)?)
    }

    /// One GET with bearer auth; returns the status and the raw body.
    async fn get_once(&self, url: &Url) -> Result<(StatusCode, String), PolarError> {
        let resp = self
            .http
            .get(url.clone())
            .bearer_auth(self.token()?)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PolarError::UpstreamStatus {
                status,
                body: format!("{body:.len$}", len = UPSTREAM_BODY_PREVIEW_CHARS),
            });
        }
        Ok((status, body))
    }

    async fn get_with_retry(&self, url: Url) -> Result<(StatusCode, String), PolarError> {
        (|| async { self.get_once(&url).await })
            .retry(*POLAR_RETRY_POLICY)
            .when(|e: &PolarError| e.is_retryable())
            .notify(|err, dur: Duration| {
                warn!(url = %url, "Polar GET retrying after error {}, sleeping {:?}", err, dur);
            })
            .await
    }

    /// `GET /v1/orders` for the configured organization.
    pub async fn list_orders(&self, page: u32) -> Result<PolarOrderList, PolarError> {
        let mut url = self.endpoint("/v1/orders")?;
        url.query_pairs_mut()
            .append_pair("organization_id", &self.organization_id)
            .append_pair("limit", &self.page_limit.to_string())
            .append_pair("page", &page.to_string());

        let (status, body) = self.get_with_retry(url).await?;
        if !status.is_success() {
            return Err(PolarError::UpstreamStatus {
                status,
                body: format!("{body:.len$}", len = UPSTREAM_BODY_PREVIEW_CHARS),
            });
        }
        let list: PolarOrderList = serde_json::from_str(&body)?;
        debug!(
            page,
            items = list.items.len(),
            max_page = list.pagination.map(|p| p.max_page),
            "Polar orders page fetched"
        );
        Ok(list)
    }

    /// `GET /v1/organizations`, returned as-is so callers can show what the token sees.
    pub async fn organizations(&self) -> Result<(StatusCode, Value), PolarError> {
        let url = self.endpoint("/v1/organizations")?;
        let (status, body) = self.get_with_retry(url).await?;
        let data = serde_json::from_str(&body).unwrap_or(Value::String(body));
        Ok((status, data))
    }
}
