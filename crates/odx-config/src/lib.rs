use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Extraction job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Scheme and authority of the OData server, e.g. `https://sap.example.com:44300`
    pub host: String,

    pub auth: AuthConfig,

    /// Extra OData query options (`$filter`, `$select`, `$expand`, `sap-client`, ...).
    /// Entries with an empty or null value are not sent.
    #[serde(default)]
    pub params: BTreeMap<String, Option<String>>,

    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Upper bound on records extracted. Absent or 0 means everything the server reports.
    #[serde(default)]
    pub max_records: Option<u64>,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Slash-delimited field paths to anonymize, applied in order.
    #[serde(default)]
    pub anonymize_fields: Vec<String>,

    #[serde(default = "default_service_path")]
    pub service_path: String,

    /// Field whose value names each output file.
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Disable TLS certificate validation (self-signed internal endpoints only).
    #[serde(default)]
    pub accept_invalid_certs: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub user: String,
    pub pass: String,
}

fn default_page_size() -> u64 {
    50
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("business_partners")
}

fn default_service_path() -> String {
    "/sap/opu/odata/sap/API_BUSINESS_PARTNER/A_BusinessPartner".to_string()
}

fn default_id_field() -> String {
    "BusinessPartner".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Load a config document. `.toml` files are parsed as TOML, anything else as JSON.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = Self::parse(&content, path)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        Ok(config)
    }

    fn parse(content: &str, path: &Path) -> anyhow::Result<Self> {
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Ok(toml::from_str(content)?)
        } else {
            Ok(serde_json::from_str(content)?)
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.host.starts_with("http://") && !self.host.starts_with("https://") {
            bail!("host must start with http:// or https://: {:?}", self.host);
        }
        if self.timeout_secs == 0 {
            bail!("timeoutSecs must be at least 1");
        }
        if !self.service_path.starts_with('/') {
            bail!("servicePath must start with '/': {:?}", self.service_path);
        }
        Ok(())
    }

    /// Query options to send, skipping unset entries.
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .filter_map(|(key, value)| match value.as_deref() {
                Some(v) if !v.is_empty() => Some((key.clone(), v.to_string())),
                _ => None,
            })
            .collect()
    }
}
