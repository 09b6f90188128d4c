use std::collections::HashSet;

use adrenaline_codec::field;
use adrenaline_codec::fields::canonical_id_text;
use adrenaline_common::{GameId, StoreError};
use serde_json::Value;

/// Source of fresh identifiers.
pub trait IdSource: Send {
    fn next_id(&mut self) -> GameId;
}

/// Random (v4) identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn next_id(&mut self) -> GameId {
        GameId::new_random()
    }
}

/// Canonical text of every identifier present in the `games` array.
/// Entries that are not objects, or that carry no string `guid`, contribute
/// nothing.
pub fn existing_ids(games: &[Value]) -> HashSet<String> {
    games
        .iter()
        .filter_map(|game| game.get(field::GUID))
        .filter_map(canonical_id_text)
        .collect()
}

/// Pick the identifier for a new entry.
///
/// `seed` is kept unless it is nil or already taken; otherwise fresh ids are
/// drawn from `source` until one is free. Gives up after `max_attempts`
/// draws.
pub fn allocate(
    existing: &HashSet<String>,
    seed: GameId,
    source: &mut dyn IdSource,
    max_attempts: usize,
) -> Result<GameId, StoreError> {
    let is_free = |id: &GameId| !id.is_nil() && !existing.contains(&id.to_string());

    if is_free(&seed) {
        return Ok(seed);
    }

    for _ in 0..max_attempts {
        let candidate = source.next_id();
        if is_free(&candidate) {
            return Ok(candidate);
        }
    }

    Err(StoreError::IdentityExhausted {
        attempts: max_attempts,
    })
}
