//! On-chain document rows.
//!
//! A chain document is a hierarchical record: an ordered list of content
//! groups, each an ordered list of typed `{label, value}` contents. The
//! wire form of a content value is the two-element array
//! `["<type tag>", <scalar>]`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::errors::ParseError;

/// Content value types carried by chain documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Name,
    String,
    Int64,
    Asset,
    TimePoint,
    Checksum256,
}

impl ContentType {
    /// The suffix appended to stored field names for this type.
    pub fn field_suffix(&self) -> &'static str {
        match self {
            Self::Name => "_n",
            Self::String => "_s",
            Self::Int64 => "_i",
            Self::Asset => "_a",
            Self::TimePoint => "_t",
            Self::Checksum256 => "_c",
        }
    }

    /// The on-chain type tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::String => "string",
            Self::Int64 => "int64",
            Self::Asset => "asset",
            Self::TimePoint => "time_point",
            Self::Checksum256 => "checksum256",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single typed content inside a content group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainContent {
    pub label: String,
    /// The `[<type tag>, <scalar>]` pair as delivered on chain.
    pub value: (ContentType, Value),
}

impl ChainContent {
    /// Create a content from its parts.
    pub fn new(label: impl Into<String>, content_type: ContentType, value: Value) -> Self {
        Self {
            label: label.into(),
            value: (content_type, value),
        }
    }

    /// The declared content type.
    pub fn content_type(&self) -> ContentType {
        self.value.0
    }

    /// Coerce the raw scalar to its declared type.
    ///
    /// Int64 scalars may arrive as JSON numbers or numeric strings; time
    /// points are normalized to carry a trailing `Z`; everything else must
    /// be a string and passes through unchanged.
    pub fn typed_value(&self) -> Result<Value, ParseError> {
        let (content_type, raw) = &self.value;
        match content_type {
            ContentType::Int64 => match raw {
                Value::Number(n) => n
                    .as_i64()
                    .map(Value::from)
                    .ok_or_else(|| {
                        ParseError::invalid_value(&self.label, format!("{} is not an int64", n))
                    }),
                Value::String(s) => s.parse::<i64>().map(Value::from).map_err(|e| {
                    ParseError::invalid_value(&self.label, format!("'{}' is not an int64: {}", s, e))
                }),
                other => Err(ParseError::invalid_value(
                    &self.label,
                    format!("{} cannot be coerced to int64", other),
                )),
            },
            ContentType::TimePoint => match raw {
                Value::String(s) => Ok(Value::String(format_timestamp(s))),
                other => Err(ParseError::invalid_value(
                    &self.label,
                    format!("{} is not a time point", other),
                )),
            },
            _ => match raw {
                Value::String(s) => Ok(Value::String(s.clone())),
                other => Err(ParseError::invalid_value(
                    &self.label,
                    format!("{} is not a {} string", other, content_type),
                )),
            },
        }
    }
}

/// An on-chain document row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDocument {
    #[serde(deserialize_with = "de_u64")]
    pub id: u64,
    pub creator: String,
    #[serde(default)]
    pub contract: String,
    pub created_date: String,
    pub updated_date: String,
    #[serde(default)]
    pub content_groups: Vec<Vec<ChainContent>>,
}

impl ChainDocument {
    /// The document id in its stored string form.
    pub fn doc_id(&self) -> String {
        self.id.to_string()
    }
}

/// Normalize a chain timestamp to ISO-8601 with a trailing `Z`.
///
/// The fractional-second precision of the input is preserved verbatim.
pub fn format_timestamp(raw: &str) -> String {
    if raw.ends_with('Z') {
        raw.to_string()
    } else {
        format!("{}Z", raw)
    }
}

/// Chain clients disagree on whether 64-bit ids are JSON numbers or
/// strings; accept both.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum U64OrString {
    U64(u64),
    String(String),
}

fn de_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match U64OrString::deserialize(deserializer)? {
        U64OrString::U64(v) => Ok(v),
        U64OrString::String(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_document_row() {
        let row = json!({
            "id": 2,
            "creator": "dao.hypha",
            "contract": "contract1",
            "created_date": "2020-11-12T18:27:47.000",
            "updated_date": "2020-11-12T19:27:47.000",
            "content_groups": [
                [
                    { "label": "content_group_label", "value": ["string", "details"] },
                    { "label": "time_share_x100", "value": ["int64", "60"] }
                ]
            ]
        });

        let doc: ChainDocument = serde_json::from_value(row).unwrap();
        assert_eq!(doc.doc_id(), "2");
        assert_eq!(doc.creator, "dao.hypha");
        assert_eq!(doc.content_groups.len(), 1);
        assert_eq!(doc.content_groups[0][1].content_type(), ContentType::Int64);
    }

    #[test]
    fn test_decode_string_id() {
        let row = json!({
            "id": "21",
            "creator": "dao.hypha",
            "created_date": "2020-11-12T18:27:47.000",
            "updated_date": "2020-11-12T19:27:47.000",
            "content_groups": []
        });

        let doc: ChainDocument = serde_json::from_value(row).unwrap();
        assert_eq!(doc.id, 21);
        assert_eq!(doc.contract, "");
    }

    #[test]
    fn test_int64_from_number_and_string() {
        let from_string = ChainContent::new("number", ContentType::Int64, json!("90"));
        assert_eq!(from_string.typed_value().unwrap(), json!(90));

        let from_number = ChainContent::new("number", ContentType::Int64, json!(90));
        assert_eq!(from_number.typed_value().unwrap(), json!(90));
    }

    #[test]
    fn test_int64_rejects_garbage() {
        let content = ChainContent::new("number", ContentType::Int64, json!("ninety"));
        assert!(matches!(
            content.typed_value(),
            Err(ParseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_time_point_gets_zulu_suffix() {
        let content = ChainContent::new(
            "original_approved_date",
            ContentType::TimePoint,
            json!("2021-04-12T05:09:36.5"),
        );
        assert_eq!(content.typed_value().unwrap(), json!("2021-04-12T05:09:36.5Z"));
    }

    #[test]
    fn test_format_timestamp_is_idempotent() {
        assert_eq!(format_timestamp("2020-11-12T18:27:47.000"), "2020-11-12T18:27:47.000Z");
        assert_eq!(format_timestamp("2020-11-12T18:27:47.000Z"), "2020-11-12T18:27:47.000Z");
    }

    #[test]
    fn test_string_types_pass_through() {
        let asset = ChainContent::new("salary", ContentType::Asset, json!("4133.04 HVOICE"));
        assert_eq!(asset.typed_value().unwrap(), json!("4133.04 HVOICE"));

        let name = ChainContent::new("account", ContentType::Name, json!("member1"));
        assert_eq!(name.typed_value().unwrap(), json!("member1"));
    }
}
