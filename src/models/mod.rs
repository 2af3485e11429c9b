//! Typed request and response schemas, grouped by API family.
//!
//! Response models are strict where the platform is: required fields and
//! enumerated values that do not match fail deserialization, which the
//! dispatcher reports as [`BrightcoveError::Schema`](crate::BrightcoveError::Schema).
//! Request models implement [`Validate`] and are checked before sending.

pub mod analytics;
pub mod cms;
pub mod ingest;
pub mod syndication;

use crate::errors::{BrightcoveError, Result};

/// Field-level validation for request models.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Reject `value` if it is blank or longer than `max` characters.
pub(crate) fn check_text(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BrightcoveError::InvalidRequest(format!(
            "{field} must not be empty"
        )));
    }
    check_len(field, value, max)
}

pub(crate) fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(BrightcoveError::InvalidRequest(format!(
            "{field} is {len} characters, the maximum is {max}"
        )));
    }
    Ok(())
}

pub(crate) fn check_opt_len(field: &str, value: Option<&String>, max: usize) -> Result<()> {
    match value {
        Some(v) => check_len(field, v, max),
        None => Ok(()),
    }
}

/// Deserialization helpers for the platform's loosely-typed fields.
pub(crate) mod de {
    use serde::de::{self, Deserialize, Deserializer};
    use serde_json::Value;

    /// Ids are documented as strings but some endpoints return numbers.
    pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(de::Error::invalid_type(
                unexpected(&other),
                &"a string or number id",
            )),
        }
    }

    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        opt_string_or_number(deserializer)?
            .ok_or_else(|| de::Error::custom("expected a string or number id, got null"))
    }

    /// Accept either a single object or an array of them.
    pub fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum OneOrMany<T> {
            Many(Vec<T>),
            One(T),
        }

        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        })
    }

    fn unexpected(value: &Value) -> de::Unexpected<'_> {
        match value {
            Value::Bool(b) => de::Unexpected::Bool(*b),
            Value::Array(_) => de::Unexpected::Seq,
            Value::Object(_) => de::Unexpected::Map,
            _ => de::Unexpected::Other("value"),
        }
    }
}
