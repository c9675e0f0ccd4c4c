//! Field anonymization for extracted records

use odx_core::{FieldPath, Record, apply_at_path};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Marker used for values that have no type-specific masking rule.
pub const ANONYMIZED: &str = "ANONIMIZADO";

const EMAIL_DOMAIN: &str = "anonimizado.com";
const ODATA_DATE_PREFIX: &str = "/Date(";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnonymizationInfo {
    pub path: String,
    pub count: usize,
}

/// Applies a fixed list of field paths to each record it is given.
#[derive(Debug, Clone, Default)]
pub struct Anonymizer {
    paths: Vec<FieldPath>,
}

impl Anonymizer {
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Self {
        let paths = fields
            .iter()
            .map(|f| FieldPath::new(f.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        Self { paths }
    }

    pub fn paths(&self) -> &[FieldPath] {
        &self.paths
    }

    /// Mask every configured path in `record`, in configuration order.
    ///
    /// Paths that do not resolve on this record are skipped and not reported.
    pub fn anonymize(&self, record: &mut Record) -> Vec<AnonymizationInfo> {
        let mut infos = Vec::new();

        for path in &self.paths {
            let count = apply_at_path(record, path, anonymize_value);
            if count > 0 {
                infos.push(AnonymizationInfo {
                    path: path.to_string(),
                    count,
                });
            }
        }

        infos
    }
}

/// Mask a single value according to its type and field name.
///
/// Output is randomized per call; only its shape is stable.
pub fn anonymize_value(value: &Value, field: &str) -> Value {
    match value {
        Value::Null | Value::Bool(_) => value.clone(),
        Value::String(s) if s.starts_with(ODATA_DATE_PREFIX) => value.clone(),
        Value::String(s) if is_email(s, field) => {
            Value::String(format!("anon_{}@{}", random_token(6), EMAIL_DOMAIN))
        }
        Value::String(_) => Value::String(format!("{}_{}", ANONYMIZED, random_token(8))),
        Value::Number(_) => Value::from(random_number()),
        Value::Array(_) | Value::Object(_) => Value::String(ANONYMIZED.to_string()),
    }
}

fn is_email(value: &str, field: &str) -> bool {
    field.to_ascii_lowercase().contains("email") || value.contains('@')
}

/// Lowercase hex drawn from a v4 UUID; `len` is capped at 32.
fn random_token(len: usize) -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(len);
    token
}

/// Integer in `[100000, 999999]`, taken from the 122 random bits of a v4 UUID
/// (the modulo bias is negligible for masking).
fn random_number() -> u64 {
    (Uuid::new_v4().as_u128() % 900_000) as u64 + 100_000
}
