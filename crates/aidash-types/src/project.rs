//! Project profiles: the preconfigured endpoints a user can chat with.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Which JSON body shape a project's chat endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    /// `{"prompt": ..., "model": ...}`
    #[default]
    Generate,
    /// `{"query": ...}`
    Query,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadKind::Generate => write!(f, "generate"),
            PayloadKind::Query => write!(f, "query"),
        }
    }
}

impl FromStr for PayloadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generate" => Ok(PayloadKind::Generate),
            "query" => Ok(PayloadKind::Query),
            other => Err(format!("invalid payload kind: '{other}'")),
        }
    }
}

/// A single selectable AI project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProfile {
    /// Stable identifier, also the chat history key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Base URL of the backend (e.g. "http://localhost:11434").
    pub endpoint: String,
    /// Path of the streaming chat endpoint, appended to `endpoint`.
    pub chat_path: String,
    /// Path of the document upload endpoint, if the backend has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_path: Option<String>,
    #[serde(default)]
    pub file_upload_enabled: bool,
    #[serde(default)]
    pub payload: PayloadKind,
    /// Model override; falls back to the global default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_kind_roundtrip() {
        for kind in [PayloadKind::Generate, PayloadKind::Query] {
            let parsed: PayloadKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_project_profile_minimal_toml() {
        let toml_str = r#"
id = "simple-ai-chat"
name = "Simple AI Chat"
endpoint = "http://localhost:11434"
chat_path = "/api/generate"
"#;
        let profile: ProjectProfile = toml::from_str(toml_str).unwrap();
        assert_eq!(profile.payload, PayloadKind::Generate);
        assert!(!profile.file_upload_enabled);
        assert!(profile.upload_path.is_none());
        assert!(profile.model.is_none());
    }
}
