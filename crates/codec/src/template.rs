//! Default vendor record used for newly added games.
//!
//! Adrenaline expects every record to carry its full schema. The table below
//! lists each field with the sentinel value a fresh entry starts from; keep it
//! in the vendor's (lexicographic) field order so it can be audited against a
//! real `gmdb.blb`.

use serde_json::{Map, Number, Value};

use crate::fields::write_bool;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sentinel {
    Int(i64),
    Text(&'static str),
    Flag(bool),
    EmptyList,
}

impl Sentinel {
    pub fn to_value(self) -> Value {
        match self {
            Sentinel::Int(n) => Value::Number(Number::from(n)),
            Sentinel::Text(s) => Value::String(s.to_string()),
            Sentinel::Flag(b) => write_bool(b),
            Sentinel::EmptyList => Value::Array(Vec::new()),
        }
    }
}

pub const NEW_GAME_FIELDS: &[(&str, Sentinel)] = &[
    ("amdId", Sentinel::Int(-1)),
    ("appDisplayScalingSet", Sentinel::Flag(false)),
    ("appHistogramCapture", Sentinel::Flag(false)),
    ("arguments", Sentinel::Text("")),
    ("athena_support", Sentinel::Flag(false)),
    ("auto_enable_ps_state", Sentinel::Text("USEGLOBAL")),
    ("averageFPS", Sentinel::Int(-1)),
    ("color_enabled", Sentinel::Flag(false)),
    ("colors", Sentinel::EmptyList),
    ("commandline", Sentinel::Text("")),
    ("exe_path", Sentinel::Text("")),
    ("eyefinity_enabled", Sentinel::Flag(false)),
    ("framegen_enabled", Sentinel::Int(0)),
    ("freeSyncForceSet", Sentinel::Flag(false)),
    ("guid", Sentinel::Text("")),
    ("has_framegen_profile", Sentinel::Flag(false)),
    ("has_upscaling_profile", Sentinel::Flag(false)),
    ("hidden", Sentinel::Flag(false)),
    ("image_info", Sentinel::Text("")),
    ("install_location", Sentinel::Text("")),
    ("installer_id", Sentinel::Text("")),
    ("is_appforlink", Sentinel::Flag(false)),
    ("is_favourite", Sentinel::Flag(false)),
    ("last_played_mins", Sentinel::Int(0)),
    ("lastlaunchtime", Sentinel::Text("")),
    ("lastperformancereporttime", Sentinel::Text("")),
    ("lnk_path", Sentinel::Text("")),
    ("manual", Sentinel::Flag(true)),
    ("origin_id", Sentinel::Int(-1)),
    ("overdrive", Sentinel::EmptyList),
    ("overdrive_enabled", Sentinel::Flag(false)),
    ("percentile95_msec", Sentinel::Int(-1)),
    ("profileCustomized", Sentinel::Flag(false)),
    ("profileEnabled", Sentinel::Flag(true)),
    ("rayTracing", Sentinel::Flag(false)),
    ("rendering_process", Sentinel::Text("")),
    ("revertuserprofiletype", Sentinel::Int(-1)),
    ("smartshift_enabled", Sentinel::Flag(false)),
    ("special_flags", Sentinel::Text("")),
    ("steam_id", Sentinel::Int(-1)),
    ("title", Sentinel::Text("")),
    ("total_played_mins", Sentinel::Int(0)),
    ("uninstall_location", Sentinel::Int(-1)),
    ("uninstalled", Sentinel::Flag(false)),
    ("uplay_id", Sentinel::Int(-1)),
    ("upscaling_enabled", Sentinel::Flag(false)),
    ("upscaling_sharpness", Sentinel::Int(75)),
    ("upscaling_target_resolution", Sentinel::Text("")),
    ("upscaling_use_borderless", Sentinel::Flag(false)),
    ("useEyefinity", Sentinel::Flag(false)),
    ("userprofiletype", Sentinel::Int(-1)),
    ("week_played_mins", Sentinel::Int(0)),
];

/// A fresh record with every vendor field at its sentinel value.
pub fn new_game_record() -> Map<String, Value> {
    NEW_GAME_FIELDS
        .iter()
        .map(|(name, sentinel)| (name.to_string(), sentinel.to_value()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_is_sorted_and_unique() {
        for pair in NEW_GAME_FIELDS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} must sort before {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn test_sentinels() {
        let record = new_game_record();
        assert_eq!(record.len(), NEW_GAME_FIELDS.len());

        for id_field in ["amdId", "origin_id", "steam_id", "uplay_id"] {
            assert_eq!(record[id_field], json!(-1), "{id_field}");
        }
        assert_eq!(record["revertuserprofiletype"], json!(-1));
        assert_eq!(record["userprofiletype"], json!(-1));
        for counter in ["last_played_mins", "total_played_mins", "week_played_mins"] {
            assert_eq!(record[counter], json!(0), "{counter}");
        }
        assert_eq!(record["upscaling_sharpness"], json!(75));
        assert_eq!(record["manual"], json!("TRUE"));
        assert_eq!(record["profileEnabled"], json!("TRUE"));
        assert_eq!(record["hidden"], json!("FALSE"));
        assert_eq!(record["rayTracing"], json!("FALSE"));
        assert_eq!(record["colors"], json!([]));
        assert_eq!(record["overdrive"], json!([]));
        assert_eq!(record["title"], json!(""));
    }

    #[test]
    fn test_flags_other_than_manual_and_profile_are_false() {
        for (name, sentinel) in NEW_GAME_FIELDS {
            if let Sentinel::Flag(value) = sentinel {
                assert_eq!(*value, matches!(*name, "manual" | "profileEnabled"), "{name}");
            }
        }
    }
}
