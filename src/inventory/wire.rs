//! Upstream wire format.
//!
//! The inventory API is loose about key casing and about whether
//! `Agent.DataLastCommunication` / `Network.PublicIp` arrive as literal
//! dotted keys or as nested objects. Every object is normalized first:
//! keys are lowercased and nested objects flattened into dotted paths.
//! Field mapping then happens against the normalized names only.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::inventory::asset::AssetRecord;

/// Errors produced while decoding an upstream body.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected {expected}, found {found}")]
    Shape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("asset record rejected: {0}")]
    Record(String),
}

#[derive(Debug, Deserialize)]
struct WireAsset {
    #[serde(rename = "id", default, deserialize_with = "lenient_string")]
    id: String,

    #[serde(rename = "name", default, deserialize_with = "lenient_string")]
    name: String,

    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    asset_type: String,

    #[serde(rename = "serialnumber", default, deserialize_with = "lenient_string")]
    serial_number: String,

    #[serde(
        rename = "agent.datalastcommunication",
        default,
        deserialize_with = "lenient_timestamp"
    )]
    last_communication_at: Option<DateTime<Utc>>,

    #[serde(rename = "network.publicip", default, deserialize_with = "lenient_opt_string")]
    public_ip: Option<String>,
}

impl TryFrom<WireAsset> for AssetRecord {
    type Error = WireError;

    fn try_from(wire: WireAsset) -> Result<Self, Self::Error> {
        if wire.id.trim().is_empty() {
            return Err(WireError::Record("missing id".to_string()));
        }
        Ok(AssetRecord::new(wire.id, wire.name, wire.asset_type)
            .with_serial_number(wire.serial_number)
            .with_last_communication(wire.last_communication_at)
            .with_public_ip(wire.public_ip))
    }
}

/// Parse the `GetAssets` listing body.
///
/// The body must be a JSON array. Individual entries that cannot be mapped
/// (not an object, no id, bad field types) are dropped with a warning so one
/// bad record does not discard the whole inventory.
pub fn parse_asset_list(body: &str) -> Result<Vec<AssetRecord>, WireError> {
    let value: Value = serde_json::from_str(body)?;
    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(WireError::Shape {
                expected: "array",
                found: kind(&other),
            })
        }
    };

    let total = entries.len();
    let records: Vec<AssetRecord> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match decode_entry(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed asset entry");
                None
            }
        })
        .collect();

    if records.len() < total {
        tracing::debug!(kept = records.len(), total, "Asset listing partially decoded");
    }
    Ok(records)
}

/// Parse the `GetAsset/{id}` body.
pub fn parse_asset(body: &str) -> Result<AssetRecord, WireError> {
    let value: Value = serde_json::from_str(body)?;
    decode_entry(value)
}

fn decode_entry(entry: Value) -> Result<AssetRecord, WireError> {
    let object = match entry {
        Value::Object(object) => object,
        other => {
            return Err(WireError::Shape {
                expected: "object",
                found: kind(&other),
            })
        }
    };
    let wire: WireAsset = serde_json::from_value(Value::Object(normalize_keys(object)))?;
    AssetRecord::try_from(wire)
}

/// Lowercase every key and flatten nested objects into dotted paths.
///
/// When two keys collide after normalization the winner is picked in this
/// order:
/// 1. a non-null value beats a null one,
/// 2. a key written at the top level (including a literal dotted key) beats
///    a path produced by flattening a nested object,
/// 3. otherwise the original key that sorts first byte-wise wins.
pub fn normalize_keys(object: Map<String, Value>) -> Map<String, Value> {
    let mut slots = BTreeMap::new();
    flatten_into("", object, false, &mut slots);
    slots
        .into_iter()
        .map(|(key, slot)| (key, slot.value))
        .collect()
}

struct Slot {
    value: Value,
    nested: bool,
}

impl Slot {
    fn outranked_by(&self, value: &Value, nested: bool) -> bool {
        match (self.value.is_null(), value.is_null()) {
            (true, false) => true,
            (false, true) => false,
            _ => self.nested && !nested,
        }
    }
}

fn flatten_into(
    prefix: &str,
    object: Map<String, Value>,
    nested: bool,
    out: &mut BTreeMap<String, Slot>,
) {
    for (key, value) in object {
        let key = if prefix.is_empty() {
            key.to_lowercase()
        } else {
            format!("{}.{}", prefix, key.to_lowercase())
        };
        match value {
            Value::Object(inner) => flatten_into(&key, inner, true, out),
            value => match out.entry(key) {
                Entry::Vacant(entry) => {
                    entry.insert(Slot { value, nested });
                }
                Entry::Occupied(mut entry) => {
                    if entry.get().outranked_by(&value, nested) {
                        entry.insert(Slot { value, nested });
                    }
                }
            },
        }
    }
}

/// Parse an upstream timestamp.
///
/// Accepts RFC 3339, or an ISO-8601 date-time without offset which is read
/// as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!(
            "expected string, found {}",
            kind(&other)
        ))),
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", s))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_dotted_keys_any_case() {
        let body = r#"[{
            "ID": "a-1",
            "name": "PC-01",
            "TYPE": "Desktop",
            "serialnumber": "SN1",
            "agent.DATALASTCOMMUNICATION": "2024-01-10T08:00:00Z",
            "Network.PublicIp": "177.1.2.3"
        }]"#;

        let records = parse_asset_list(body).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id(), "a-1");
        assert_eq!(record.name(), "PC-01");
        assert_eq!(record.asset_type(), "Desktop");
        assert_eq!(record.serial_number(), "SN1");
        assert_eq!(
            record.last_communication_at(),
            Some(Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap())
        );
        assert_eq!(record.public_ip(), Some("177.1.2.3"));
    }

    #[test]
    fn test_parse_nested_objects() {
        let body = r#"{
            "Id": 42,
            "Name": "Laptop-7",
            "Type": "Laptop",
            "Agent": { "DataLastCommunication": "2024-03-01T10:30:00" },
            "Network": { "PublicIp": null }
        }"#;

        let record = parse_asset(body).unwrap();
        assert_eq!(record.id(), "42");
        assert_eq!(
            record.last_communication_at(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap())
        );
        assert_eq!(record.public_ip(), None);
        assert_eq!(record.serial_number(), "");
    }

    #[test]
    fn test_missing_timestamp_means_never() {
        let record = parse_asset(r#"{"Id":"x","Agent":{"DataLastCommunication":null}}"#).unwrap();
        assert_eq!(record.last_communication_at(), None);
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let body = r#"[
            {"Id": "ok", "Type": "Computer"},
            {"Name": "no id"},
            {"Id": "bad-ts", "Agent.DataLastCommunication": "yesterday"},
            "not an object"
        ]"#;

        let records = parse_asset_list(body).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["ok"]);
    }

    #[test]
    fn test_listing_must_be_array() {
        let err = parse_asset_list(r#"{"Id":"1"}"#).unwrap_err();
        assert!(matches!(err, WireError::Shape { expected: "array", .. }));

        assert!(matches!(parse_asset_list("<html>"), Err(WireError::Json(_))));
    }

    #[test]
    fn test_single_asset_requires_id() {
        assert!(matches!(parse_asset(r#"{"Name":"x"}"#), Err(WireError::Record(_))));
        assert!(matches!(parse_asset("[]"), Err(WireError::Shape { .. })));
    }

    #[test]
    fn test_normalize_keys_same_level_collision_is_byte_ordered() {
        let object: Map<String, Value> =
            serde_json::from_str(r#"{"Name":"first","NAME":"second"}"#).unwrap();
        let normalized = normalize_keys(object);
        assert_eq!(normalized.len(), 1);
        // "NAME" sorts before "Name".
        assert_eq!(normalized["name"], Value::from("second"));

        let record = parse_asset(r#"{"Id":"1","Name":"first","NAME":"second"}"#).unwrap();
        assert_eq!(record.name(), "second");
    }

    #[test]
    fn test_nested_null_does_not_hide_dotted_timestamp() {
        let record = parse_asset(
            r#"{"Id":"1","Agent.DataLastCommunication":"2024-01-01T00:00:00Z","Agent":{"DataLastCommunication":null}}"#,
        )
        .unwrap();
        assert_eq!(
            record.last_communication_at(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_dotted_null_does_not_hide_nested_timestamp() {
        let record = parse_asset(
            r#"{"Id":"1","Agent.DataLastCommunication":null,"Agent":{"DataLastCommunication":"2024-01-01T00:00:00Z"}}"#,
        )
        .unwrap();
        assert_eq!(
            record.last_communication_at(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_dotted_key_beats_nested_path() {
        let object: Map<String, Value> = serde_json::from_str(
            r#"{"Network":{"PublicIp":"10.0.0.1"},"Network.PublicIp":"200.1.1.1"}"#,
        )
        .unwrap();
        let normalized = normalize_keys(object);
        assert_eq!(normalized["network.publicip"], Value::from("200.1.1.1"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_timestamp("2024-05-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-02T00:04:05-03:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-02T03:04:05"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-02 03:04:05"), Some(expected));
        assert!(parse_timestamp("2024-05-02T03:04:05.123").is_some());
        assert_eq!(parse_timestamp("02/05/2024"), None);
    }
}
