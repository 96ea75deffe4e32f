//! Task type to preferred provider mapping
//!
//! Built once at startup: compiled-in defaults, then overrides from an
//! optional JSON file. The result is shared behind an `Arc` and never
//! mutated afterwards.
//!
//! Accepted file shapes:
//!
//! ```json
//! { "icp": "deepseek", "strategy": "anthropic" }
//! ```
//!
//! ```json
//! { "mappings": { "icp": "deepseek" }, "default_provider": "openai" }
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use super::ProviderKind;
use crate::domain::DomainError;

/// Task type used by the answering engine
pub const ANSWERING_TASK: &str = "answering";

const DEFAULT_MAPPINGS: &[(&str, ProviderKind)] = &[
    ("icp", ProviderKind::DeepSeek),
    ("persona", ProviderKind::DeepSeek),
    ("email_sequence", ProviderKind::DeepSeek),
    ("social_posts", ProviderKind::Groq),
    ("summarization", ProviderKind::Groq),
    ("landing_page", ProviderKind::OpenAi),
    ("quiz_generation", ProviderKind::OpenAi),
    ("course_outline", ProviderKind::Anthropic),
    ("strategy", ProviderKind::Anthropic),
    (ANSWERING_TASK, ProviderKind::DeepSeek),
];

#[derive(Debug, Clone, Serialize)]
pub struct ToolProviderMapping {
    mappings: BTreeMap<String, ProviderKind>,
    default_provider: ProviderKind,
}

impl ToolProviderMapping {
    /// An empty mapping; every task resolves to `default_provider`
    pub fn empty(default_provider: ProviderKind) -> Self {
        Self {
            mappings: BTreeMap::new(),
            default_provider,
        }
    }

    /// The compiled-in defaults
    pub fn defaults() -> Self {
        DEFAULT_MAPPINGS
            .iter()
            .fold(Self::empty(ProviderKind::DeepSeek), |mapping, (task, kind)| {
                mapping.with_mapping(*task, *kind)
            })
    }

    /// Defaults merged with the given file when present
    pub fn load(path: Option<&Path>) -> Result<Self, DomainError> {
        match path {
            Some(path) => Self::defaults().merge_file(path),
            None => Ok(Self::defaults()),
        }
    }

    pub fn with_mapping(mut self, task_type: impl Into<String>, kind: ProviderKind) -> Self {
        self.mappings.insert(task_type.into(), kind);
        self
    }

    pub fn with_default_provider(mut self, kind: ProviderKind) -> Self {
        self.default_provider = kind;
        self
    }

    /// Apply overrides from a JSON file. Unreadable or malformed files and
    /// unknown provider names are configuration errors.
    pub fn merge_file(self, path: &Path) -> Result<Self, DomainError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read provider mapping file {}: {}",
                path.display(),
                e
            ))
        })?;

        let merged = self.merge_json(&raw).map_err(|e| match e {
            DomainError::Configuration { message } => DomainError::configuration(format!(
                "{} ({})",
                message,
                path.display()
            )),
            other => other,
        })?;

        info!(
            path = %path.display(),
            task_types = merged.mappings.len(),
            "Loaded provider mapping overrides"
        );

        Ok(merged)
    }

    /// Apply overrides from a JSON document
    pub fn merge_json(mut self, raw: &str) -> Result<Self, DomainError> {
        let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
            DomainError::configuration(format!("Malformed provider mapping: {}", e))
        })?;

        let serde_json::Value::Object(mut root) = value else {
            return Err(DomainError::configuration(
                "Provider mapping must be a JSON object",
            ));
        };

        if let Some(default) = root.remove("default_provider") {
            self.default_provider = parse_kind("default_provider", &default)?;
        }

        let entries = match root.remove("mappings") {
            Some(serde_json::Value::Object(nested)) => nested,
            Some(_) => {
                return Err(DomainError::configuration(
                    "Provider mapping field 'mappings' must be an object",
                ));
            }
            None => root,
        };

        for (task_type, value) in entries {
            let kind = parse_kind(&task_type, &value)?;
            self.mappings.insert(task_type, kind);
        }

        Ok(self)
    }

    /// Explicitly mapped provider for a task type
    pub fn get(&self, task_type: &str) -> Option<ProviderKind> {
        self.mappings.get(task_type).copied()
    }

    /// Mapped provider, or the default provider for unknown task types
    pub fn preferred(&self, task_type: &str) -> ProviderKind {
        self.get(task_type).unwrap_or(self.default_provider)
    }

    pub fn default_provider(&self) -> ProviderKind {
        self.default_provider
    }

    /// Mapped task types in sorted order
    pub fn task_types(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ProviderKind)> {
        self.mappings.iter().map(|(task, kind)| (task.as_str(), *kind))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl Default for ToolProviderMapping {
    fn default() -> Self {
        Self::defaults()
    }
}

fn parse_kind(key: &str, value: &serde_json::Value) -> Result<ProviderKind, DomainError> {
    match value.as_str() {
        Some(name) => name.parse().map_err(|e: DomainError| {
            DomainError::configuration(format!("Task '{}': {}", key, e))
        }),
        None => Err(DomainError::configuration(format!(
            "Task '{}': provider must be a string",
            key
        ))),
    }
}
