use serde_json::Value;

use crate::{Error, Result};

/// A single OData entity as returned by the server: an arbitrarily nested
/// JSON tree of objects, arrays and scalars.
pub type Record = Value;

/// One page of results from the remote source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Raw `__count` value. Only meaningful on the first page.
    pub total_count: Option<Value>,
    pub records: Vec<Record>,
}

impl Page {
    pub fn new(total_count: Option<Value>, records: Vec<Record>) -> Self {
        Self {
            total_count,
            records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Parse the server-reported total.
    ///
    /// OData v2 reports `__count` as a decimal string; a bare JSON integer is
    /// accepted as well. Anything else (absent, negative, fractional, text)
    /// is an [`Error::InvalidTotalCount`].
    pub fn total(&self) -> Result<u64> {
        match &self.total_count {
            Some(Value::String(s)) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::InvalidTotalCount(s.clone())),
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| Error::InvalidTotalCount(n.to_string())),
            Some(other) => Err(Error::InvalidTotalCount(other.to_string())),
            None => Err(Error::InvalidTotalCount("missing __count".to_string())),
        }
    }
}

/// Extract the identifying key of a record as a string.
///
/// String and integer ids are accepted; anything else is reported as missing.
pub fn record_id(record: &Record, field: &str) -> Result<String> {
    match record.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) if n.is_u64() || n.is_i64() => Ok(n.to_string()),
        _ => Err(Error::MissingRecordId(field.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_total_from_string() {
        let page = Page::new(Some(json!("120")), vec![]);
        assert_eq!(page.total().unwrap(), 120);
    }

    #[test]
    fn test_total_from_number() {
        let page = Page::new(Some(json!(7)), vec![]);
        assert_eq!(page.total().unwrap(), 7);
    }

    #[test]
    fn test_total_rejects_text() {
        let page = Page::new(Some(json!("abc")), vec![]);
        assert!(matches!(page.total(), Err(Error::InvalidTotalCount(s)) if s == "abc"));
    }

    #[test]
    fn test_total_missing() {
        let page = Page::new(None, vec![json!({"BusinessPartner": "1"})]);
        assert!(page.total().is_err());
    }

    #[test]
    fn test_record_id() {
        let record = json!({"BusinessPartner": "1000042", "Name": "ACME"});
        assert_eq!(record_id(&record, "BusinessPartner").unwrap(), "1000042");

        let numeric = json!({"BusinessPartner": 17});
        assert_eq!(record_id(&numeric, "BusinessPartner").unwrap(), "17");

        let missing = json!({"Name": "ACME"});
        assert!(matches!(
            record_id(&missing, "BusinessPartner"),
            Err(Error::MissingRecordId(_))
        ));
    }
}
