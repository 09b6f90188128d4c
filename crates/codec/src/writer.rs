use adrenaline_common::{CodecError, GameId, GameInfo};
use serde_json::{Map, Value};

use crate::field;
use crate::fields::{read_id, write_bool, write_id};
use crate::reader::RawDocument;
use crate::template::new_game_record;

/// Encode the document as indented JSON.
///
/// Object keys are emitted in lexicographic order at every level, which is
/// the vendor's own field order, so rewrites produce stable diffs no matter
/// how the tree was built. Numbers keep their original text.
pub fn encode(document: RawDocument) -> Result<Vec<u8>, CodecError> {
    let (mut fields, games) = document.into_parts();
    fields.insert(field::GAMES.to_string(), Value::Array(games));
    let root = canonicalize(Value::Object(fields));
    Ok(serde_json::to_vec_pretty(&root)?)
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, canonicalize(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Build the vendor record for a newly added game stored under `id`.
///
/// Starts from the default template; only the identifier, title, command
/// line, executable path and image path come from the caller.
pub fn new_record(game: &GameInfo, id: GameId) -> Value {
    let mut record = new_game_record();
    record.insert(field::GUID.to_string(), write_id(id));
    record.insert(field::TITLE.to_string(), Value::String(game.display_name.clone()));
    record.insert(field::COMMAND_LINE.to_string(), Value::String(game.command_line.clone()));
    record.insert(field::EXE_PATH.to_string(), Value::String(game.exe_path.clone()));
    record.insert(field::IMAGE_INFO.to_string(), Value::String(game.image_path.clone()));
    Value::Object(record)
}

/// Overwrite the caller-owned fields of an existing record. Every other
/// field is left as it was.
pub fn update_record(record: &mut Map<String, Value>, game: &GameInfo) {
    record.insert(field::TITLE.to_string(), Value::String(game.display_name.clone()));
    record.insert(field::IMAGE_INFO.to_string(), Value::String(game.image_path.clone()));
    record.insert(field::COMMAND_LINE.to_string(), Value::String(game.command_line.clone()));
    record.insert(field::EXE_PATH.to_string(), Value::String(game.exe_path.clone()));
    record.insert(field::MANUAL.to_string(), write_bool(game.is_manual));
    record.insert(field::HIDDEN.to_string(), write_bool(game.is_hidden));
}

/// The first record whose `guid` parses to `id`.
pub fn find_record_mut(games: &mut [Value], id: GameId) -> Option<&mut Map<String, Value>> {
    games.iter_mut().filter_map(Value::as_object_mut).find(|record| {
        record
            .get(field::GUID)
            .and_then(|value| read_id(value).ok())
            .is_some_and(|found| found == id)
    })
}
