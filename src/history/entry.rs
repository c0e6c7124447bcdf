//! A single recorded evaluation.

use serde::{Deserialize, Serialize};

/// Calculator mode the expression was entered in.
///
/// Purely informational: both modes evaluate the same grammar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Standard,
    Scientific,
}

impl Mode {
    /// Interpret a client supplied mode, falling back to `Standard` for
    /// anything missing or unrecognized.
    pub fn from_request(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("scientific") => Self::Scientific,
            _ => Self::Standard,
        }
    }

    /// Lowercase name, as stored and displayed.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Scientific => "scientific",
        }
    }
}

/// A successful evaluation kept in the history log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Monotonic identifier, never reused.
    pub id: u64,
    pub mode: Mode,
    /// The expression exactly as the client sent it.
    pub expression: String,
    /// Canonical rendering of the result.
    pub result: String,
    /// Local time, `%Y-%m-%d %H:%M:%S`.
    pub created_at: String,
}
