//! Path-addressed editing of nested OData records

use std::fmt;

use serde_json::Value;

/// Server-injected key carrying no business data.
pub const METADATA_KEY: &str = "__metadata";

/// Key under which OData v2 wraps a to-many navigation property.
pub const RESULTS_KEY: &str = "results";

/// A slash-delimited sequence of keys, e.g.
/// `to_BusinessPartnerAddress/to_EmailAddress/EmailAddress`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn new(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// True when `node` is an expansion wrapper: an object holding a `results` array.
pub fn is_expansion(node: &Value) -> bool {
    matches!(node.get(RESULTS_KEY), Some(Value::Array(_)))
}

/// Remove every `__metadata` key at any depth.
pub fn strip_metadata(node: &mut Value) {
    strip_key(node, METADATA_KEY);
}

/// Remove every occurrence of `key` at any depth, descending through objects and arrays.
pub fn strip_key(node: &mut Value, key: &str) {
    match node {
        Value::Object(map) => {
            map.shift_remove(key);
            for child in map.values_mut() {
                strip_key(child, key);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip_key(item, key);
            }
        }
        _ => {}
    }
}

/// Replace the value at `path` with `transform(value, key)`.
///
/// Intermediate segments may name nested objects or expansion wrappers; an
/// expansion fans the remaining suffix out to every element of its `results`.
/// A segment that is absent, or that resolves to a non-object before the last
/// segment, leaves that branch untouched.
///
/// Returns the number of values replaced.
pub fn apply_at_path<F>(node: &mut Value, path: &FieldPath, mut transform: F) -> usize
where
    F: FnMut(&Value, &str) -> Value,
{
    apply_segments(node, path.segments(), &mut transform)
}

fn apply_segments<F>(node: &mut Value, segments: &[String], transform: &mut F) -> usize
where
    F: FnMut(&Value, &str) -> Value,
{
    let Some((head, rest)) = segments.split_first() else {
        return 0;
    };
    let Some(child) = node.as_object_mut().and_then(|map| map.get_mut(head)) else {
        return 0;
    };

    if rest.is_empty() {
        *child = transform(&*child, head.as_str());
        return 1;
    }

    if is_expansion(child) {
        return match child.get_mut(RESULTS_KEY) {
            Some(Value::Array(items)) => items
                .iter_mut()
                .map(|item| apply_segments(item, rest, transform))
                .sum(),
            _ => 0,
        };
    }

    if child.is_object() {
        apply_segments(child, rest, transform)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mask(_: &Value, _: &str) -> Value {
        json!("MASKED")
    }

    #[test]
    fn test_strip_metadata_nested() {
        let mut record = json!({
            "__metadata": {"uri": "https://host/A_BusinessPartner('1')"},
            "BusinessPartner": "1",
            "to_BusinessPartnerAddress": {
                "results": [
                    {"__metadata": {"type": "A_BusinessPartnerAddressType"}, "CityName": "Lisboa"},
                    {"__metadata": {"type": "A_BusinessPartnerAddressType"}, "CityName": "Porto"}
                ]
            }
        });

        strip_metadata(&mut record);

        assert_eq!(
            record,
            json!({
                "BusinessPartner": "1",
                "to_BusinessPartnerAddress": {
                    "results": [{"CityName": "Lisboa"}, {"CityName": "Porto"}]
                }
            })
        );
    }

    #[test]
    fn test_strip_metadata_idempotent() {
        let mut once = json!({
            "__metadata": {},
            "a": [{"__metadata": 1, "b": {"__metadata": null, "c": [1, 2]}}]
        });
        strip_metadata(&mut once);
        let mut twice = once.clone();
        strip_metadata(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_strip_metadata_inside_plain_arrays() {
        let mut value = json!([[{"__metadata": 1, "x": 2}]]);
        strip_metadata(&mut value);
        assert_eq!(value, json!([[{"x": 2}]]));
    }

    #[test]
    fn test_field_path_parsing() {
        let path = FieldPath::new("to_A/to_B/Field");
        assert_eq!(path.segments(), ["to_A", "to_B", "Field"]);
        assert_eq!(path.to_string(), "to_A/to_B/Field");
        assert!(FieldPath::new("").is_empty());
        assert_eq!(FieldPath::new("/a//b/").segments(), ["a", "b"]);
    }

    #[test]
    fn test_apply_top_level_field() {
        let mut record = json!({"FirstName": "Ana", "LastName": "Silva"});
        let count = apply_at_path(&mut record, &FieldPath::new("FirstName"), mask);
        assert_eq!(count, 1);
        assert_eq!(record, json!({"FirstName": "MASKED", "LastName": "Silva"}));
    }

    #[test]
    fn test_apply_absent_path_is_noop() {
        let mut record = json!({"BusinessPartner": "1", "to_X": {"results": []}});
        let before = record.to_string();
        let count = apply_at_path(&mut record, &FieldPath::new("to_Missing/Field"), mask);
        assert_eq!(count, 0);
        assert_eq!(record.to_string(), before);
    }

    #[test]
    fn test_apply_fans_out_over_expansion() {
        let mut record = json!({"to_X": {"results": [{"F": "a", "G": 1}, {"F": "b", "G": 2}]}});
        let count = apply_at_path(&mut record, &FieldPath::new("to_X/F"), mask);
        assert_eq!(count, 2);
        assert_eq!(
            record,
            json!({"to_X": {"results": [{"F": "MASKED", "G": 1}, {"F": "MASKED", "G": 2}]}})
        );
    }

    #[test]
    fn test_apply_nested_expansions() {
        let mut record = json!({
            "to_BusinessPartnerAddress": {"results": [
                {"to_EmailAddress": {"results": [{"EmailAddress": "a@x.com"}, {"EmailAddress": "b@x.com"}]}},
                {"to_EmailAddress": {"results": []}},
                {"CityName": "Braga"}
            ]}
        });
        let path = FieldPath::new("to_BusinessPartnerAddress/to_EmailAddress/EmailAddress");
        let count = apply_at_path(&mut record, &path, mask);
        assert_eq!(count, 2);
        assert_eq!(
            record["to_BusinessPartnerAddress"]["results"][0]["to_EmailAddress"]["results"],
            json!([{"EmailAddress": "MASKED"}, {"EmailAddress": "MASKED"}])
        );
        assert_eq!(
            record["to_BusinessPartnerAddress"]["results"][2],
            json!({"CityName": "Braga"})
        );
    }

    #[test]
    fn test_apply_through_plain_object() {
        let mut record = json!({"to_Customer": {"CustomerName": "ACME", "Customer": "C1"}});
        let count = apply_at_path(&mut record, &FieldPath::new("to_Customer/CustomerName"), mask);
        assert_eq!(count, 1);
        assert_eq!(
            record,
            json!({"to_Customer": {"CustomerName": "MASKED", "Customer": "C1"}})
        );
    }

    #[test]
    fn test_apply_through_scalar_aborts() {
        let mut record = json!({"to_Customer": "not-an-object", "Other": 1});
        let before = record.clone();
        let count = apply_at_path(&mut record, &FieldPath::new("to_Customer/CustomerName"), mask);
        assert_eq!(count, 0);
        assert_eq!(record, before);
    }

    #[test]
    fn test_apply_passes_key_name() {
        let mut record = json!({"a": {"EmailAddress": "x"}});
        let mut seen = Vec::new();
        apply_at_path(&mut record, &FieldPath::new("a/EmailAddress"), |v, key| {
            seen.push(key.to_string());
            v.clone()
        });
        assert_eq!(seen, ["EmailAddress"]);
    }

    #[test]
    fn test_is_expansion() {
        assert!(is_expansion(&json!({"results": []})));
        assert!(!is_expansion(&json!({"results": "nope"})));
        assert!(!is_expansion(&json!([1, 2])));
        assert!(!is_expansion(&json!({"Name": "x"})));
    }
}
