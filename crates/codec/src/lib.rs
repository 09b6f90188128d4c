//! Codec for the Adrenaline game database (`gmdb.blb`).
//!
//! Two views of the same document:
//! - [`reader::decode`] projects each record onto the handful of fields the
//!   editor understands ([`GameRecord`]).
//! - [`reader::decode_raw`] keeps the whole JSON tree ([`RawDocument`]) so a
//!   rewrite preserves every vendor field untouched.

pub mod fields;
pub mod reader;
pub mod template;
pub mod writer;

pub use reader::{decode, decode_raw, DecodeDiagnostics, DecodedGames, GameRecord, RawDocument, RecordId};
pub use writer::encode;

/// Vendor field names used by the editor.
pub mod field {
    pub const GAMES: &str = "games";
    pub const GUID: &str = "guid";
    pub const TITLE: &str = "title";
    pub const IMAGE_INFO: &str = "image_info";
    pub const COMMAND_LINE: &str = "commandline";
    pub const EXE_PATH: &str = "exe_path";
    pub const MANUAL: &str = "manual";
    pub const APP_FOR_LINK: &str = "is_appforlink";
    pub const HIDDEN: &str = "hidden";
}

/// The vendor writes UTF-8 and sometimes prefixes a byte order mark, which
/// serde_json rejects.
pub(crate) fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}
