//! Project registry for runtime project lookup.
//!
//! An ordered, id-indexed table of project profiles plus the defaults needed
//! to turn a prompt into a `GenerationRequest`.

use aidash_types::config::GlobalConfig;
use aidash_types::project::{PayloadKind, ProjectProfile};
use aidash_types::stream::{GenerationRequest, RequestPayload};

/// Registry of configured projects.
///
/// Keeps insertion order so listings match the configuration file.
#[derive(Debug, Clone)]
pub struct ProjectRegistry {
    projects: Vec<ProjectProfile>,
    default_project: String,
    default_model: String,
}

impl ProjectRegistry {
    /// Create a registry. Later duplicates of an id replace earlier ones.
    pub fn new(
        projects: Vec<ProjectProfile>,
        default_project: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        let mut registry = Self {
            projects: Vec::with_capacity(projects.len()),
            default_project: default_project.into(),
            default_model: default_model.into(),
        };
        for project in projects {
            registry.register(project);
        }
        registry
    }

    /// Build from the global config, falling back to the built-in projects.
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self::new(
            config.effective_projects(),
            config.default_project.clone(),
            config.default_model.clone(),
        )
    }

    /// Register a project, replacing any with the same id in place.
    pub fn register(&mut self, project: ProjectProfile) {
        match self.projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project,
            None => self.projects.push(project),
        }
    }

    /// Look up a project by id.
    pub fn get(&self, id: &str) -> Option<&ProjectProfile> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn list(&self) -> &[ProjectProfile] {
        &self.projects
    }

    /// The configured default project, or the first one if that id is unknown.
    pub fn default_project(&self) -> Option<&ProjectProfile> {
        self.get(&self.default_project)
            .or_else(|| self.projects.first())
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Full URL of the project's streaming chat endpoint.
    pub fn chat_url(&self, project: &ProjectProfile) -> String {
        join_url(&project.endpoint, &project.chat_path)
    }

    /// Full upload URL, or `None` when uploads are off for the project.
    pub fn upload_url(&self, project: &ProjectProfile) -> Option<String> {
        if !project.file_upload_enabled {
            return None;
        }
        project
            .upload_path
            .as_deref()
            .map(|path| join_url(&project.endpoint, path))
    }

    /// Resolve the endpoint and payload for one prompt.
    pub fn request_for(&self, project: &ProjectProfile, prompt: &str) -> GenerationRequest {
        let payload = match project.payload {
            PayloadKind::Generate => RequestPayload::Generate {
                prompt: prompt.to_string(),
                model: project
                    .model
                    .clone()
                    .unwrap_or_else(|| self.default_model.clone()),
            },
            PayloadKind::Query => RequestPayload::Query {
                query: prompt.to_string(),
            },
        };
        GenerationRequest {
            url: self.chat_url(project),
            payload,
        }
    }
}

fn join_url(endpoint: &str, path: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
