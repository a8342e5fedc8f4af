use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

use crate::ui::settings::ModelSettings;

pub fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("story-forge");
    path.push("settings.json");
    path
}

/// Missing or unreadable settings fall back to the defaults.
pub fn load_settings(path: &Path) -> ModelSettings {
    let Ok(text) = fs::read_to_string(path) else {
        debug!(path = %path.display(), "no settings file, using defaults");
        return ModelSettings::default();
    };

    serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring malformed settings file");
        ModelSettings::default()
    })
}

pub fn save_settings(path: &Path, settings: &ModelSettings) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::llm_client::Backend;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_settings(&dir.path().join("nope.json"));
        assert_eq!(loaded, ModelSettings::default());
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings(&path), ModelSettings::default());
    }

    #[test]
    fn backend_only_file_uses_that_backends_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"backend": "openai"}"#).unwrap();

        let loaded = load_settings(&path);
        assert_eq!(loaded.backend, Backend::Openai);
        assert_eq!(loaded.base_url(), "http://localhost:1234");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = ModelSettings {
            backend: Backend::Openai,
            base_url: Some("http://gpu-box:1234".into()),
            model: "local-model".into(),
            temperature: 0.3,
            timeout_secs: 60,
        };
        save_settings(&path, &settings).unwrap();

        assert_eq!(load_settings(&path), settings);
    }
}
