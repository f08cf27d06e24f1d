//! Global configuration types for aidash.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! default model, HTTP timeouts, the split-fragment policy and the project
//! table.

use serde::{Deserialize, Serialize};

use crate::project::{PayloadKind, ProjectProfile};
use crate::stream::FragmentPolicy;

/// Top-level configuration.
///
/// Loaded from `~/.aidash/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Model sent with `generate` payloads when a project has no override.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Project opened when none is named.
    #[serde(default = "default_project")]
    pub default_project: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Upper bound on a whole request, body included.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Longest silence tolerated between two body chunks.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    #[serde(default)]
    pub fragment_policy: FragmentPolicy,

    /// Project table. Empty means the built-in table.
    #[serde(default)]
    pub projects: Vec<ProjectProfile>,
}

fn default_model() -> String {
    "deepseek-r1:7b".to_string()
}

fn default_project() -> String {
    "simple-ai-chat".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_idle_timeout_secs() -> u64 {
    120
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            default_project: default_project(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            fragment_policy: FragmentPolicy::default(),
            projects: Vec::new(),
        }
    }
}

impl GlobalConfig {
    /// The configured projects, or the built-in table when none are configured.
    pub fn effective_projects(&self) -> Vec<ProjectProfile> {
        if self.projects.is_empty() {
            builtin_projects()
        } else {
            self.projects.clone()
        }
    }
}

const LOCAL_OLLAMA: &str = "http://localhost:11434";
const LANGCHAIN_BACKEND: &str = "http://127.0.0.1:8000/api/langchain-ai";
const RAG_BACKEND: &str = "http://127.0.0.1:8000/api/rag-langchain-ai";

fn profile(
    id: &str,
    name: &str,
    endpoint: &str,
    chat_path: &str,
    payload: PayloadKind,
) -> ProjectProfile {
    ProjectProfile {
        id: id.to_string(),
        name: name.to_string(),
        endpoint: endpoint.to_string(),
        chat_path: chat_path.to_string(),
        upload_path: None,
        file_upload_enabled: false,
        payload,
        model: None,
    }
}

/// The eight projects shipped with the dashboard.
pub fn builtin_projects() -> Vec<ProjectProfile> {
    let mut document_search = profile(
        "document-search-qa-web-app",
        "Document Search & Q&A",
        RAG_BACKEND,
        "/chat",
        PayloadKind::Query,
    );
    document_search.upload_path = Some("/upload-document".to_string());
    document_search.file_upload_enabled = true;

    vec![
        profile(
            "simple-ai-chat",
            "Simple AI Chat",
            LOCAL_OLLAMA,
            "/api/generate",
            PayloadKind::Generate,
        ),
        profile(
            "langchain-ai-chat-langchain",
            "Langchain AI Chat",
            LANGCHAIN_BACKEND,
            "/chat",
            PayloadKind::Query,
        ),
        document_search,
        profile(
            "knowledge-base-chatbot",
            "Personal Knowledge Base Chatbot",
            LANGCHAIN_BACKEND,
            "/api/generate",
            PayloadKind::Generate,
        ),
        profile(
            "automated-customer-support",
            "Automated Customer Support",
            LANGCHAIN_BACKEND,
            "/api/generate",
            PayloadKind::Generate,
        ),
        profile(
            "code-review",
            "AI-Powered Code Review",
            LANGCHAIN_BACKEND,
            "/api/generate",
            PayloadKind::Generate,
        ),
        profile(
            "dynamic-report-generation",
            "Dynamic Report Generation from Data",
            LANGCHAIN_BACKEND,
            "/api/generate",
            PayloadKind::Generate,
        ),
        profile(
            "multi-agent-system",
            "Multi-Agent System for Workflow Automation",
            LANGCHAIN_BACKEND,
            "/api/generate",
            PayloadKind::Generate,
        ),
    ]
}
