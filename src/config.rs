//! Engine configuration
//!
//! Knobs the host can tune without touching SQL semantics proper: how much of
//! an offending statement is echoed back, and which join semantics apply.

use serde::{Deserialize, Serialize};

/// How RIGHT/FULL/CROSS joins execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JoinSemantics {
    /// INNER, LEFT, RIGHT, FULL and CROSS each behave as in standard SQL
    #[default]
    Standard,

    /// Legacy behavior: RIGHT, FULL and CROSS run as LEFT joins
    LeftCompat,
}

impl JoinSemantics {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Standard => "standard join semantics",
            Self::LeftCompat => "RIGHT/FULL/CROSS executed as LEFT",
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Characters of an unrecognized statement quoted in its SyntaxError
    pub statement_preview_chars: usize,

    /// Characters of `Error.sql` a host should display
    pub error_sql_preview_chars: usize,

    /// Join execution mode
    pub join_semantics: JoinSemantics,

    /// Text cell width cap used by the grid renderer
    pub max_display_width: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            statement_preview_chars: 40,
            error_sql_preview_chars: 80,
            join_semantics: JoinSemantics::default(),
            max_display_width: 50,
        }
    }
}

impl EngineConfig {
    /// Reproduces the legacy engine's join behavior
    pub fn compat() -> Self {
        Self {
            join_semantics: JoinSemantics::LeftCompat,
            ..Default::default()
        }
    }

    /// Untruncated messages, handy when asserting on error text
    pub fn for_testing() -> Self {
        Self {
            statement_preview_chars: usize::MAX,
            error_sql_preview_chars: usize::MAX,
            ..Default::default()
        }
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Cut `text` to at most `max` characters, on a char boundary
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_presets() {
        let default = EngineConfig::default();
        assert_eq!(default.statement_preview_chars, 40);
        assert_eq!(default.error_sql_preview_chars, 80);
        assert_eq!(default.join_semantics, JoinSemantics::Standard);

        let compat = EngineConfig::compat();
        assert_eq!(compat.join_semantics, JoinSemantics::LeftCompat);
        assert!(compat.join_semantics.description().contains("LEFT"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"join_semantics": "left_compat"}"#).unwrap();
        assert_eq!(config.join_semantics, JoinSemantics::LeftCompat);
        assert_eq!(config.error_sql_preview_chars, 80);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
