use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use ciborium::Value as Cbor;

use super::cbor;
use crate::core::error::DecodeError;

/// RFC 8949 standard date/time string.
const TAG_TDATE: u64 = 0;
/// RFC 8949 epoch-based date/time.
const TAG_EPOCH_DATETIME: u64 = 1;
/// RFC 8943 days since 1970-01-01.
const TAG_EPOCH_DAYS: u64 = 100;
/// RFC 8943 `full-date` string.
const TAG_FULL_DATE: u64 = 1004;

const SECONDS_PER_DAY: i64 = 86_400;

/// A date-valued element, e.g. `birth_date` or `date_of_registration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    FullDate(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

impl DateValue {
    /// `YYYY-MM-DD` for full dates, RFC 3339 (with `Z` for UTC) for date-times.
    pub fn to_iso_string(&self) -> String {
        match self {
            DateValue::FullDate(date) => date.format("%Y-%m-%d").to_string(),
            DateValue::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

/// The value of a disclosed data element.
///
/// The variant is chosen from the CBOR item itself, no external schema is consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    Text(String),
    Bool(bool),
    Integer(i64),
    Date(DateValue),
    Bytes(Vec<u8>),
    Array(Vec<ElementValue>),
    /// Text-keyed map, in encoded order.
    Map(Vec<(String, ElementValue)>),
}

impl ElementValue {
    pub fn kind(&self) -> &'static str {
        match self {
            ElementValue::Text(_) => "text",
            ElementValue::Bool(_) => "boolean",
            ElementValue::Integer(_) => "integer",
            ElementValue::Date(_) => "date",
            ElementValue::Bytes(_) => "bytes",
            ElementValue::Array(_) => "array",
            ElementValue::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ElementValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ElementValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ElementValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ElementValue> {
        match self {
            ElementValue::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub(crate) fn from_cbor(value: Cbor, path: &str) -> Result<Self, DecodeError> {
        match value {
            Cbor::Text(s) => Ok(ElementValue::Text(s)),
            Cbor::Bool(b) => Ok(ElementValue::Bool(b)),
            Cbor::Integer(i) => cbor::into_int(i, path).map(ElementValue::Integer),
            Cbor::Bytes(b) => Ok(ElementValue::Bytes(b)),
            Cbor::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| Self::from_cbor(item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(ElementValue::Array),
            Cbor::Map(entries) => {
                let mut map: Vec<(String, ElementValue)> = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = cbor::into_text(key, &format!("{path} (map key)"))?;
                    if map.iter().any(|(k, _)| *k == key) {
                        return Err(DecodeError::DuplicateKey {
                            path: path.to_owned(),
                            key,
                        });
                    }
                    let value = Self::from_cbor(value, &format!("{path}.{key}"))?;
                    map.push((key, value));
                }
                Ok(ElementValue::Map(map))
            }
            Cbor::Tag(tag, inner) => date_from_tag(tag, *inner, path).map(ElementValue::Date),
            other => Err(DecodeError::UnsupportedValue {
                path: path.to_owned(),
                reason: format!("{} elements are not supported", cbor::type_name(&other)),
            }),
        }
    }
}

fn invalid_date(path: &str, reason: impl ToString) -> DecodeError {
    DecodeError::InvalidDate {
        path: path.to_owned(),
        reason: reason.to_string(),
    }
}

fn date_from_tag(tag: u64, inner: Cbor, path: &str) -> Result<DateValue, DecodeError> {
    match (tag, inner) {
        (TAG_TDATE, Cbor::Text(s)) => DateTime::parse_from_rfc3339(&s)
            .map(DateValue::DateTime)
            .map_err(|e| invalid_date(path, format!("`{s}`: {e}"))),
        (TAG_FULL_DATE, Cbor::Text(s)) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(DateValue::FullDate)
            .map_err(|e| invalid_date(path, format!("`{s}`: {e}"))),
        (TAG_EPOCH_DATETIME, Cbor::Integer(i)) => {
            let secs = cbor::into_int(i, path)?;
            DateTime::from_timestamp(secs, 0)
                .map(|dt| DateValue::DateTime(dt.fixed_offset()))
                .ok_or_else(|| invalid_date(path, format!("timestamp {secs} out of range")))
        }
        (TAG_EPOCH_DAYS, Cbor::Integer(i)) => {
            let days = cbor::into_int(i, path)?;
            days.checked_mul(SECONDS_PER_DAY)
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|dt| DateValue::FullDate(dt.date_naive()))
                .ok_or_else(|| invalid_date(path, format!("day count {days} out of range")))
        }
        (TAG_TDATE | TAG_FULL_DATE | TAG_EPOCH_DATETIME | TAG_EPOCH_DAYS, other) => {
            Err(invalid_date(
                path,
                format!("tag {tag} wraps a {}", cbor::type_name(&other)),
            ))
        }
        (tag, _) => Err(DecodeError::UnsupportedValue {
            path: path.to_owned(),
            reason: format!("tag {tag} is not supported"),
        }),
    }
}
