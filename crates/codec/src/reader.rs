use adrenaline_common::{CodecError, GameId, GameInfo};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::field;
use crate::fields::{deserialize_lenient_string, deserialize_vendor_bool};
use crate::strip_bom;

// ---------------------------------------------------------------------------
// Typed read model
// ---------------------------------------------------------------------------

/// Identifier of a decoded record. The list view tolerates records whose id
/// is absent or unreadable; they are still enumerated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RecordId {
    Valid(GameId),
    #[default]
    Missing,
    Invalid(String),
}

impl RecordId {
    pub fn game_id(&self) -> GameId {
        match self {
            RecordId::Valid(id) => *id,
            RecordId::Missing | RecordId::Invalid(_) => GameId::NIL,
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            None => RecordId::Missing,
            Some(value) => match crate::fields::read_id(&value) {
                Ok(id) => RecordId::Valid(id),
                Err(_) => RecordId::Invalid(value.to_string()),
            },
        })
    }
}

/// The recognised subset of one vendor game record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GameRecord {
    #[serde(rename = "guid")]
    pub id: RecordId,

    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub title: String,

    #[serde(rename = "commandline", deserialize_with = "deserialize_lenient_string")]
    pub command_line: String,

    #[serde(rename = "image_info", deserialize_with = "deserialize_lenient_string")]
    pub image_path: String,

    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub exe_path: String,

    #[serde(rename = "manual", deserialize_with = "deserialize_vendor_bool")]
    pub is_manual: bool,

    #[serde(rename = "is_appforlink", deserialize_with = "deserialize_vendor_bool")]
    pub is_app_for_link: bool,

    #[serde(rename = "hidden", deserialize_with = "deserialize_vendor_bool")]
    pub is_hidden: bool,
}

impl GameRecord {
    /// Shell-link placeholders and hidden entries are not shown to users.
    pub fn is_visible(&self) -> bool {
        !self.is_hidden && !self.is_app_for_link
    }

    pub fn into_game_info(self) -> GameInfo {
        GameInfo {
            id: self.id.game_id(),
            display_name: self.title,
            image_path: self.image_path,
            command_line: self.command_line,
            exe_path: self.exe_path,
            is_manual: self.is_manual,
            is_hidden: self.is_hidden,
        }
    }
}

/// Non-fatal oddities found while decoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeDiagnostics {
    /// `null` entries inside the `games` array (skipped).
    pub null_entries: usize,
    /// Records without a `guid` field, or with a `null` one.
    pub missing_ids: usize,
    /// Records whose `guid` is present but not a valid identifier.
    pub invalid_ids: usize,
}

impl DecodeDiagnostics {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedGames {
    pub records: Vec<GameRecord>,
    pub diagnostics: DecodeDiagnostics,
}

#[derive(Deserialize)]
struct GamesDocument {
    #[serde(default)]
    games: Option<Vec<Option<GameRecord>>>,
}

/// Decode the typed read model.
///
/// A top-level `null` means "no database yet" and yields no records. Missing
/// fields take their defaults. Bytes that are not JSON, or a top-level value
/// that is neither `null` nor an object, are an error.
pub fn decode(bytes: &[u8]) -> Result<DecodedGames, CodecError> {
    let root: Value = serde_json::from_slice(strip_bom(bytes))?;
    let entries = match root {
        Value::Null => Vec::new(),
        root @ Value::Object(_) => serde_json::from_value::<GamesDocument>(root)?
            .games
            .unwrap_or_default(),
        _ => return Err(CodecError::NotAnObject),
    };

    let mut decoded = DecodedGames::default();
    for entry in entries {
        let Some(record) = entry else {
            decoded.diagnostics.null_entries += 1;
            continue;
        };
        match record.id {
            RecordId::Valid(_) => {}
            RecordId::Missing => decoded.diagnostics.missing_ids += 1,
            RecordId::Invalid(_) => decoded.diagnostics.invalid_ids += 1,
        }
        decoded.records.push(record);
    }

    if !decoded.diagnostics.is_clean() {
        debug!(diagnostics = ?decoded.diagnostics, "decoded games data with irregular entries");
    }
    Ok(decoded)
}

// ---------------------------------------------------------------------------
// Raw tree for rewrites
// ---------------------------------------------------------------------------

/// The full document, held as a generic JSON tree.
///
/// The `games` array is split out of the root object so mutation paths can
/// reach it without re-validating; [`crate::writer::encode`] puts it back.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDocument {
    fields: Map<String, Value>,
    games: Vec<Value>,
}

impl RawDocument {
    pub fn games(&self) -> &[Value] {
        &self.games
    }

    pub fn games_mut(&mut self) -> &mut Vec<Value> {
        &mut self.games
    }

    /// Top-level fields other than `games`.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub(crate) fn into_parts(self) -> (Map<String, Value>, Vec<Value>) {
        (self.fields, self.games)
    }
}

/// Decode the full tree for a mutation.
///
/// Fails with [`CodecError::NotAnObject`] when the top-level value is not an
/// object (including `null`) and with [`CodecError::MissingGames`] when the
/// object has no `games` array.
pub fn decode_raw(bytes: &[u8]) -> Result<RawDocument, CodecError> {
    let root: Value = serde_json::from_slice(strip_bom(bytes))?;
    let Value::Object(mut fields) = root else {
        return Err(CodecError::NotAnObject);
    };

    match fields.remove(field::GAMES) {
        Some(Value::Array(games)) => Ok(RawDocument { fields, games }),
        _ => Err(CodecError::MissingGames),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_ID: &str = "{be540504-826a-4fc6-8ea2-fca1a4373f63}";

    fn single_game(hidden: &str, app_for_link: &str) -> String {
        format!(
            r#"{{
              "games": [
                {{
                  "commandline": "Path_To_CommandLine",
                  "exe_path": "Path_To_Exe.exe",
                  "guid": "{SAMPLE_ID}",
                  "hidden": "{hidden}",
                  "image_info": "Path_To_Image.png",
                  "is_appforlink": "{app_for_link}",
                  "manual": "TRUE",
                  "title": "Test Game"
                }}
              ]
            }}"#
        )
    }

    #[test]
    fn test_decode_maps_fields() {
        let decoded = decode(single_game("FALSE", "FALSE").as_bytes()).unwrap();
        assert!(decoded.diagnostics.is_clean());

        let record = &decoded.records[0];
        assert_eq!(record.id, RecordId::Valid(GameId::parse(SAMPLE_ID).unwrap()));
        assert_eq!(record.title, "Test Game");
        assert_eq!(record.command_line, "Path_To_CommandLine");
        assert_eq!(record.exe_path, "Path_To_Exe.exe");
        assert_eq!(record.image_path, "Path_To_Image.png");
        assert!(record.is_manual);
        assert!(record.is_visible());

        let info = record.clone().into_game_info();
        assert_eq!(info.display_name, "Test Game");
        assert_eq!(info.id, GameId::parse(SAMPLE_ID).unwrap());
    }

    #[test]
    fn test_decode_visibility_flags() {
        let hidden = decode(single_game("TRUE", "FALSE").as_bytes()).unwrap();
        assert!(!hidden.records[0].is_visible());

        let link = decode(single_game("FALSE", "true").as_bytes()).unwrap();
        assert!(!link.records[0].is_visible());
    }

    #[test]
    fn test_decode_null_document_is_empty() {
        let decoded = decode(b"null").unwrap();
        assert!(decoded.records.is_empty());

        let decoded = decode(b"  null\n").unwrap();
        assert!(decoded.records.is_empty());
    }

    #[test]
    fn test_decode_missing_or_null_games_is_empty() {
        assert!(decode(b"{}").unwrap().records.is_empty());
        assert!(decode(br#"{"games": null}"#).unwrap().records.is_empty());
    }

    #[test]
    fn test_decode_defaults_for_missing_fields() {
        let decoded = decode(br#"{"games": [{"title": null}]}"#).unwrap();
        let record = &decoded.records[0];
        assert_eq!(record, &GameRecord::default());
        assert_eq!(decoded.diagnostics.missing_ids, 1);
    }

    #[test]
    fn test_decode_tolerates_irregular_entries() {
        let json = br#"{"games": [null, {"guid": "garbage", "title": "A"}, {"guid": null}]}"#;
        let decoded = decode(json).unwrap();
        assert_eq!(decoded.records.len(), 2);
        assert_eq!(
            decoded.diagnostics,
            DecodeDiagnostics { null_entries: 1, missing_ids: 1, invalid_ids: 1 }
        );
        assert_eq!(decoded.records[0].id.game_id(), GameId::NIL);
    }

    #[test]
    fn test_decode_accepts_bom() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(single_game("FALSE", "FALSE").as_bytes());
        assert_eq!(decode(&bytes).unwrap().records.len(), 1);
    }

    #[test]
    fn test_decode_malformed_is_error() {
        assert!(matches!(decode(b"{ \"games\": [ "), Err(CodecError::Json(_))));
        assert!(matches!(decode(b"[1, 2]"), Err(CodecError::Json(_))));
    }

    #[test]
    fn test_decode_non_object_root_is_error() {
        for text in ["[]", "[null]", "[{\"games\": []}]", "42", "\"games\"", "true"] {
            let err = decode(text.as_bytes()).unwrap_err();
            assert!(matches!(err, CodecError::NotAnObject), "{text}: {err:?}");
        }
    }

    #[test]
    fn test_decode_raw_null_is_not_an_object() {
        assert!(matches!(decode_raw(b"null"), Err(CodecError::NotAnObject)));
        assert!(matches!(decode_raw(b"[]"), Err(CodecError::NotAnObject)));
    }

    #[test]
    fn test_decode_raw_missing_games() {
        assert!(matches!(decode_raw(b"{}"), Err(CodecError::MissingGames)));
        assert!(matches!(decode_raw(br#"{"games": {}}"#), Err(CodecError::MissingGames)));
    }

    #[test]
    fn test_decode_raw_keeps_everything() {
        let json = br#"{"version": 3, "games": [null, {"steam_id": 570, "x": [1, 2]}]}"#;
        let document = decode_raw(json).unwrap();
        assert_eq!(document.games().len(), 2);
        assert!(document.games()[0].is_null());
        assert_eq!(document.games()[1]["steam_id"], serde_json::json!(570));
        assert_eq!(document.fields()["version"], serde_json::json!(3));
        assert!(!document.fields().contains_key("games"));
    }
}
