use serde::{Deserialize, Serialize};

use crate::engine::llm_client::Backend;

/// Where and how to reach the model server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub backend: Backend,

    /// Unset means the backend's usual local port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,

    /// Per-request timeout; generation on a laptop can be slow
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Ollama,
            base_url: None,
            model: "llama3.2".into(),
            temperature: 0.7,
            timeout_secs: 300,
        }
    }
}

/// Command-line values that take precedence over the settings file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub backend: Option<Backend>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

impl ModelSettings {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.backend.default_base_url())
    }

    pub fn apply(&mut self, overrides: SettingsOverrides) {
        if let Some(backend) = overrides.backend {
            // A stored URL belongs to the old backend.
            if backend != self.backend {
                self.base_url = None;
            }
            self.backend = backend;
        }
        if overrides.base_url.is_some() {
            self.base_url = overrides.base_url;
        }
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(temperature) = overrides.temperature {
            self.temperature = temperature;
        }
    }
}
