use std::time::Duration;

use async_trait::async_trait;
use odx_core::Page;
use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{info, warn};

use crate::FetchError;
use crate::handler::{PageRequest, PageSource};

pub const DEFAULT_SERVICE_PATH: &str = "/sap/opu/odata/sap/API_BUSINESS_PARTNER/A_BusinessPartner";

/// Connection settings for an OData v2 entity set
#[derive(Debug, Clone)]
pub struct ODataSettings {
    pub host: String,
    pub service_path: String,
    pub user: String,
    pub password: String,
    /// Extra query options (`$filter`, `$expand`, `sap-client`, ...), already
    /// stripped of empty values.
    pub params: Vec<(String, String)>,
    /// Skip TLS certificate validation. Only for self-signed internal hosts.
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
}

/// Reads an OData v2 entity set with `$top`/`$skip` paging over HTTP basic auth
pub struct ODataSource {
    client: reqwest::Client,
    settings: ODataSettings,
}

impl ODataSource {
    pub fn new(settings: ODataSettings) -> Result<Self, FetchError> {
        if settings.accept_invalid_certs {
            warn!(host = %settings.host, "TLS certificate validation is disabled");
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(concat!("odx/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()
            .map_err(|e| FetchError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, settings })
    }

    /// Full request URL for one page.
    ///
    /// Caller-supplied params override the fixed paging options of the same name.
    pub fn url(&self, request: PageRequest) -> Result<Url, FetchError> {
        let mut query: Vec<(String, String)> = vec![
            ("$format".to_string(), "json".to_string()),
            ("$inlinecount".to_string(), "allpages".to_string()),
            ("$top".to_string(), request.top.to_string()),
            ("$skip".to_string(), request.skip.to_string()),
        ];

        for (key, value) in &self.settings.params {
            match query.iter_mut().find(|(k, _)| k == key) {
                Some(existing) => existing.1 = value.clone(),
                None => query.push((key.clone(), value.clone())),
            }
        }

        let base = format!(
            "{}{}",
            self.settings.host.trim_end_matches('/'),
            self.settings.service_path
        );

        Url::parse_with_params(&base, &query)
            .map_err(|e| FetchError::Request(format!("Invalid service URL {}: {}", base, e)))
    }
}

#[async_trait]
impl PageSource for ODataSource {
    async fn fetch(&self, request: PageRequest) -> Result<Page, FetchError> {
        let url = self.url(request)?;
        info!(url = %url, "Fetching page");

        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.settings.user, Some(&self.settings.password))
            .send()
            .await
            .map_err(|e| FetchError::from_transport(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_transport(url.as_str(), e))?;

        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| FetchError::Decode(format!("Invalid JSON: {}", e)))?;

        decode_envelope(body)
    }
}

/// Unwrap `{ "d": { "__count": ..., "results": [...] } }` into a [`Page`].
///
/// A missing or null `results` is an empty page.
pub fn decode_envelope(body: Value) -> Result<Page, FetchError> {
    let Value::Object(mut root) = body else {
        return Err(FetchError::Decode("expected a JSON object".to_string()));
    };
    let Some(Value::Object(mut d)) = root.remove("d") else {
        return Err(FetchError::Decode("missing `d` envelope".to_string()));
    };

    let total_count = d.remove("__count");
    let records = match d.remove("results") {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            return Err(FetchError::Decode("`d.results` is not an array".to_string()));
        }
    };

    Ok(Page::new(total_count, records))
}
