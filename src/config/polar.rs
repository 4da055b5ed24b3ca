use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

/// Polar (payment provider) settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolarConfig {
    /// Base URL of the Polar API.
    /// TOML: `polar.api_base`. Default: `https://sandbox-api.polar.sh`.
    #[serde(default = "default_api_base")]
    pub api_base: Url,

    /// Organization whose orders are synchronized.
    /// TOML: `polar.organization_id`.
    #[serde(default = "default_organization_id")]
    pub organization_id: String,

    /// Page size for `GET /v1/orders`.
    /// TOML: `polar.page_limit`. Default: `100`.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Upper bound on pages fetched by one sync run.
    /// TOML: `polar.max_pages`. Default: `20`.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Organization access token. Env: `POLAR_ACCESS_TOKEN`.
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    pub access_token: Option<String>,

    /// Webhook signing secret. Env: `POLAR_WEBHOOK_SECRET`.
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    pub webhook_secret: Option<String>,

    /// Optional outbound HTTP proxy, e.g. `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,
}

impl Default for PolarConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            organization_id: default_organization_id(),
            page_limit: default_page_limit(),
            max_pages: default_max_pages(),
            access_token: None,
            webhook_secret: None,
            proxy: None,
        }
    }
}

impl PolarConfig {
    /// Access token, ignoring blank values.
    pub fn token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Webhook secret, ignoring blank values.
    pub fn secret(&self) -> Option<&str> {
        self.webhook_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn deserialize_opt_string_lax<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;

    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(serde::de::Error::custom("expected a string or a number")),
    }
}

fn default_api_base() -> Url {
    Url::parse("https://sandbox-api.polar.sh").expect("static polar api base is a valid url")
}

fn default_organization_id() -> String {
    "0306569d-30de-43af-ab82-bf19c982fbb0".to_string()
}

fn default_page_limit() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    20
}
