//! User records and the collection they are decoded into.
//!
//! A collection is a JSON object mapping user identifiers to attribute
//! objects. Records are kept as raw JSON so each pipeline can apply its own
//! lookup rules: the online pipeline folds keys to lowercase, the age
//! pipeline and the geo counter look fields up exactly.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Format of calendar date fields such as `registered`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Epoch numbers at or below one year of seconds are rejected.
const MIN_EPOCH_SECONDS: i64 = 31_536_000;

/// Mapping from user identifier to record, in document order.
pub type UserCollection = IndexMap<String, UserRecord>;

/// A single user's attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord {
    fields: Map<String, Value>,
}

impl UserRecord {
    /// Create a record from a JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Exact-case field lookup.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Exact-case lookup that ignores `null`.
    pub fn present(&self, name: &str) -> Option<&Value> {
        self.field(name).filter(|v| !v.is_null())
    }

    /// Exact-case lookup that treats falsy values as missing.
    ///
    /// `null`, `false`, `0`, `""`, `[]` and `{}` all count as absent.
    pub fn truthy(&self, name: &str) -> Option<&Value> {
        self.field(name).filter(|v| is_truthy(v))
    }

    /// A copy of the record with every key folded to lowercase.
    ///
    /// When two keys fold to the same name the later one in document order
    /// wins.
    pub fn lowercased(&self) -> UserRecord {
        let mut fields = Map::with_capacity(self.fields.len());
        for (key, value) in &self.fields {
            fields.insert(key.to_lowercase(), value.clone());
        }
        UserRecord { fields }
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for UserRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// JSON truthiness: everything except `null`, `false`, zero and empty
/// containers or strings.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Decode a collection from JSON text.
pub fn parse_collection(text: &str) -> Result<UserCollection> {
    Ok(serde_json::from_str(text)?)
}

/// Read and decode a collection file.
pub fn load_collection(path: impl AsRef<Path>) -> Result<UserCollection> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_collection(&text)
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_calendar_date(field: &str, value: &Value) -> Result<NaiveDate> {
    let invalid = || Error::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    };
    let text = value.as_str().ok_or_else(invalid)?;
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| invalid())
}

/// Parse a timestamp given as a date, a date-time string or an epoch number.
///
/// Offsets in RFC 3339 strings are applied and the result is expressed in
/// naive UTC. Integer epochs are read as seconds, milliseconds,
/// microseconds or nanoseconds, whichever is the first unit whose
/// nanosecond count fits in an `i64` (years 1677 to 2262).
pub fn parse_timestamp(field: &str, value: &Value) -> Result<NaiveDateTime> {
    let invalid = || Error::InvalidTimestamp {
        field: field.to_string(),
        value: value.to_string(),
    };
    match value {
        Value::String(text) => parse_timestamp_str(text.trim()).ok_or_else(invalid),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(epoch_to_datetime)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn parse_timestamp_str(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn epoch_to_datetime(epoch: i64) -> Option<NaiveDateTime> {
    if epoch <= MIN_EPOCH_SECONDS {
        return None;
    }
    // The first unit whose value fits in i64 nanoseconds wins.
    [1_000_000_000i64, 1_000_000, 1_000, 1]
        .into_iter()
        .find_map(|nanos_per_unit| epoch.checked_mul(nanos_per_unit))
        .map(|nanos| DateTime::from_timestamp_nanos(nanos).naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use serde_json::json;

    fn record(value: Value) -> UserRecord {
        match value {
            Value::Object(map) => UserRecord::new(map),
            _ => UserRecord::default(),
        }
    }

    #[test]
    fn test_parse_collection_preserves_order() -> anyhow::Result<()> {
        let users = parse_collection(r#"{"b": {"age": 1}, "a": {"age": 2}, "c": {}}"#)?;
        let ids: Vec<_> = users.keys().map(String::as_str).collect();
        assert_eq!(ids, ["b", "a", "c"]);
        assert!(users.get("c").is_some_and(UserRecord::is_empty));
        Ok(())
    }

    #[test]
    fn test_parse_collection_rejects_non_objects() {
        assert!(parse_collection("[1, 2]").is_err_and(|e| e.is_decode()));
        assert!(parse_collection(r#"{"u1": 5}"#).is_err_and(|e| e.is_decode()));
        assert!(parse_collection("{").is_err_and(|e| e.is_decode()));
    }

    #[test]
    fn test_lowercased_folds_keys() {
        let rec = record(json!({"Registered": "2020-01-01", "LAST_LOGIN": "2020-01-02"}));
        let folded = rec.lowercased();
        assert_eq!(folded.field("registered"), Some(&json!("2020-01-01")));
        assert_eq!(folded.field("last_login"), Some(&json!("2020-01-02")));
        assert!(folded.field("Registered").is_none());
        assert!(rec.field("registered").is_none());
    }

    #[test]
    fn test_lowercased_later_duplicate_wins() -> anyhow::Result<()> {
        let users = parse_collection(r#"{"u": {"Region": "A", "region": "B"}}"#)?;
        let folded = users.get("u").map(UserRecord::lowercased).unwrap_or_default();
        assert_eq!(folded.field("region"), Some(&json!("B")));
        assert_eq!(folded.len(), 1);
        Ok(())
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!("NY")));
        assert!(is_truthy(&json!(3)));
        assert!(is_truthy(&json!({"a": 1})));
    }

    #[test]
    fn test_parse_calendar_date() -> anyhow::Result<()> {
        let date = parse_calendar_date("registered", &json!("2021-03-04"))?;
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 3, 4).unwrap_or_default());

        for bad in [json!("2021/03/04"), json!("2021-02-30"), json!(20210304), json!("")] {
            let err = parse_calendar_date("registered", &bad);
            assert!(matches!(err, Err(Error::InvalidDate { .. })), "{bad} accepted");
        }
        Ok(())
    }

    #[test]
    fn test_parse_timestamp_strings() -> anyhow::Result<()> {
        let day = NaiveDate::from_ymd_opt(2021, 3, 4).unwrap_or_default();
        let midnight = day.and_time(NaiveTime::MIN);
        let afternoon = day.and_hms_opt(15, 30, 0).unwrap_or_default();

        assert_eq!(parse_timestamp("t", &json!("2021-03-04"))?, midnight);
        assert_eq!(parse_timestamp("t", &json!("2021-03-04 15:30:00"))?, afternoon);
        assert_eq!(parse_timestamp("t", &json!("2021-03-04T15:30:00"))?, afternoon);
        assert_eq!(parse_timestamp("t", &json!("2021-03-04T15:30"))?, afternoon);
        assert_eq!(parse_timestamp("t", &json!("2021-03-04T17:30:00+02:00"))?, afternoon);
        Ok(())
    }

    #[test]
    fn test_parse_timestamp_epochs() -> anyhow::Result<()> {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 4)
            .and_then(|d| d.and_hms_opt(15, 30, 0))
            .unwrap_or_default();
        let seconds = 1_614_871_800i64;

        assert_eq!(parse_timestamp("t", &json!(seconds))?, expected);
        assert_eq!(parse_timestamp("t", &json!(seconds * 1_000))?, expected);
        assert_eq!(parse_timestamp("t", &json!(seconds * 1_000_000))?, expected);
        assert_eq!(parse_timestamp("t", &json!(seconds * 1_000_000_000))?, expected);
        Ok(())
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        for bad in [json!("yesterday"), json!(true), json!(12), json!([1])] {
            let err = parse_timestamp("last_login", &bad);
            assert!(matches!(err, Err(Error::InvalidTimestamp { .. })), "{bad} accepted");
        }
    }
}
