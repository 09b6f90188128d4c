use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// 128-bit identifier of a game entry.
///
/// The vendor file stores it brace-decorated (`{XXXXXXXX-XXXX-...}`). Parsing
/// accepts the value with or without braces in any letter case; `Display`
/// always renders the braced upper-case form, which is also the form used
/// when comparing identifiers textually.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameId(Uuid);

impl GameId {
    /// The all-zero identifier. Never persisted for a new entry.
    pub const NIL: GameId = GameId(Uuid::nil());

    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Parse from text, tolerating surrounding whitespace and brace decoration.
    pub fn parse(text: &str) -> Result<Self, CodecError> {
        let trimmed = text.trim();
        // uuid accepts braced input, but only balanced braces.
        let bare = trimmed
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(trimmed);
        Uuid::parse_str(bare)
            .map(Self)
            .map_err(|_| CodecError::InvalidId(text.to_string()))
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::NIL
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Uuid::encode_buffer();
        f.write_str(self.0.braced().encode_upper(&mut buf))
    }
}

impl FromStr for GameId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for GameId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GameId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        GameId::parse(&text).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Packaged-app launch identifiers
// ---------------------------------------------------------------------------

/// Application user model id of a packaged app: `<package family>!<app id>`.
///
/// A game's command line holds one of these when the game is launched
/// through the OS package manager rather than from an executable path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AppUserModelId {
    package_family_name: String,
    package_app_id: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AppUserModelIdError {
    #[error("application user model id is empty")]
    Empty,

    #[error("the input string '{0}' was not in a correct format")]
    Format(String),
}

impl AppUserModelId {
    pub fn new(package_family_name: impl Into<String>, package_app_id: impl Into<String>) -> Self {
        Self {
            package_family_name: package_family_name.into(),
            package_app_id: package_app_id.into(),
        }
    }

    /// Split on the last `!`. Both halves must be non-empty.
    pub fn parse(text: &str) -> Result<Self, AppUserModelIdError> {
        if text.trim().is_empty() {
            return Err(AppUserModelIdError::Empty);
        }

        match text.rfind('!') {
            Some(sep) if sep > 0 && sep + 1 < text.len() => {
                Ok(Self::new(&text[..sep], &text[sep + 1..]))
            }
            _ => Err(AppUserModelIdError::Format(text.to_string())),
        }
    }

    pub fn package_family_name(&self) -> &str {
        &self.package_family_name
    }

    pub fn package_app_id(&self) -> &str {
        &self.package_app_id
    }
}

impl fmt::Display for AppUserModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.package_family_name, self.package_app_id)
    }
}

// ---------------------------------------------------------------------------
// Public game value
// ---------------------------------------------------------------------------

/// A game entry as seen by callers: the editable subset of a vendor record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: GameId,
    pub display_name: String,
    pub image_path: String,
    pub command_line: String,
    pub exe_path: String,
    pub is_manual: bool,
    pub is_hidden: bool,
}

impl GameInfo {
    /// The packaged app this game launches, if its command line is an
    /// application user model id rather than an executable invocation.
    pub fn packaged_app(&self) -> Option<AppUserModelId> {
        let command = self.command_line.trim();
        // Executable paths never contain '!' in practice, but they do contain
        // path separators, which a package family name cannot.
        if command.contains(['\\', '/', ' ']) {
            return None;
        }
        AppUserModelId::parse(command).ok()
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Change notifications raised by the game database. Neither carries a
/// payload; consumers re-read the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    GamesChanged,
    RestartRequiredChanged,
}

// ---------------------------------------------------------------------------
// Consumer-facing traits
// ---------------------------------------------------------------------------

/// The game database as used by front ends.
#[async_trait]
pub trait GameDatabase: Send + Sync {
    /// Current visible games (hidden and shell-link placeholders excluded).
    fn games(&self) -> std::sync::Arc<Vec<GameInfo>>;

    /// Whether Adrenaline must be restarted to pick up written changes.
    fn is_restart_required(&self) -> bool;

    /// Append a new game. Returns the identifier that was persisted, which
    /// differs from `game.id` when that was nil or already taken.
    async fn add(&self, game: GameInfo) -> Result<GameId, StoreError>;

    /// Update the caller-owned fields of an existing game in place.
    async fn save(&self, game: GameInfo) -> Result<(), StoreError>;
}

/// Restart control over the external Adrenaline process.
#[async_trait]
pub trait AdrenalineProcess: Send + Sync {
    /// Kill and relaunch Adrenaline. `Ok(false)` means no window appeared
    /// before the timeout.
    async fn restart(&self) -> Result<bool, RestartError>;
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse Adrenaline data file")]
    NotAnObject,

    #[error("failed to find games data in Adrenaline data file")]
    MissingGames,

    #[error("invalid game identifier: {0:?}")]
    InvalidId(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("could not allocate a free game identifier after {attempts} attempts")]
    IdentityExhausted { attempts: usize },

    #[error("game {0} not found in Adrenaline data file")]
    GameNotFound(GameId),

    #[error("file watch error: {0}")]
    Watch(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RestartError {
    #[error("failed to terminate process {pid}: {source}")]
    Kill { pid: u32, source: std::io::Error },

    #[error("process {pid} did not exit in time")]
    ExitTimeout { pid: u32 },

    #[error("failed to launch {path}: {source}")]
    Launch {
        path: String,
        source: std::io::Error,
    },

    #[error("restart cancelled")]
    Cancelled,
}
