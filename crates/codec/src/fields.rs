//! Scalar codecs for the vendor's string-encoded booleans and identifiers.

use adrenaline_common::{CodecError, GameId};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const TRUE: &str = "TRUE";
const FALSE: &str = "FALSE";

/// `"true"` in any case is true; anything else, absent or null included, is false.
pub fn read_bool(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if s.eq_ignore_ascii_case(TRUE))
}

/// Always upper case.
pub fn write_bool(value: bool) -> Value {
    Value::String(if value { TRUE } else { FALSE }.to_string())
}

/// Strict identifier read: the value must be a string holding a 128-bit id,
/// braced or not.
pub fn read_id(value: &Value) -> Result<GameId, CodecError> {
    match value {
        Value::String(text) => GameId::parse(text),
        other => Err(CodecError::InvalidId(other.to_string())),
    }
}

pub fn write_id(id: GameId) -> Value {
    Value::String(id.to_string())
}

/// Canonical textual form of a raw `guid` value, for collision checks.
///
/// Parsable ids compare by value regardless of case or braces; anything else
/// compares by its trimmed upper-cased text. Non-string values have no
/// textual form.
pub fn canonical_id_text(value: &Value) -> Option<String> {
    let text = value.as_str()?;
    Some(match GameId::parse(text) {
        Ok(id) => id.to_string(),
        Err(_) => text.trim().to_uppercase(),
    })
}

pub(crate) fn deserialize_vendor_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(read_bool(value.as_ref()))
}

pub(crate) fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = "{be540504-826a-4fc6-8ea2-fca1a4373f63}";

    #[test]
    fn test_read_bool() {
        assert!(read_bool(Some(&json!("TRUE"))));
        assert!(read_bool(Some(&json!("true"))));
        assert!(!read_bool(Some(&json!("FALSE"))));
        assert!(!read_bool(Some(&json!("False"))));
        assert!(!read_bool(Some(&json!("Non-boolean"))));
        assert!(!read_bool(Some(&Value::Null)));
        assert!(!read_bool(Some(&json!(true))));
        assert!(!read_bool(None));
    }

    #[test]
    fn test_write_bool() {
        assert_eq!(write_bool(true), json!("TRUE"));
        assert_eq!(write_bool(false), json!("FALSE"));
    }

    #[test]
    fn test_read_id_braced() {
        let id = read_id(&json!(SAMPLE)).unwrap();
        assert_eq!(id, GameId::parse("be540504-826a-4fc6-8ea2-fca1a4373f63").unwrap());
    }

    #[test]
    fn test_read_id_null_is_format_error() {
        assert!(matches!(read_id(&Value::Null), Err(CodecError::InvalidId(_))));
        assert!(matches!(read_id(&json!(42)), Err(CodecError::InvalidId(_))));
        assert!(matches!(read_id(&json!("nope")), Err(CodecError::InvalidId(_))));
    }

    #[test]
    fn test_write_id_braced_upper() {
        let id = read_id(&json!(SAMPLE)).unwrap();
        assert_eq!(write_id(id), json!("{BE540504-826A-4FC6-8EA2-FCA1A4373F63}"));
    }

    #[test]
    fn test_canonical_id_text() {
        assert_eq!(
            canonical_id_text(&json!(SAMPLE)).as_deref(),
            Some("{BE540504-826A-4FC6-8EA2-FCA1A4373F63}")
        );
        assert_eq!(
            canonical_id_text(&json!("be540504-826a-4fc6-8ea2-fca1a4373f63")).as_deref(),
            Some("{BE540504-826A-4FC6-8EA2-FCA1A4373F63}")
        );
        assert_eq!(canonical_id_text(&json!(" odd ")).as_deref(), Some("ODD"));
        assert_eq!(canonical_id_text(&Value::Null), None);
    }
}
