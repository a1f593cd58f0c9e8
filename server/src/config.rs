use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::fs;

pub const DEFAULT_CONFIG_FILE: &str = "gemchat.json";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub model: String,
    pub base_url: String,
    /// Name of the environment variable holding the provider key.
    pub api_key_env: String,
    pub max_body_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3001)),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            max_body_bytes: 20 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    fn apply_env<F>(mut self, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = var("GEMCHAT_BIND") {
            self.bind = bind
                .parse()
                .with_context(|| format!("GEMCHAT_BIND is not a socket address: {}", bind))?;
        }
        if let Some(model) = var("GEMINI_MODEL") {
            self.model = model;
        }
        if let Some(base_url) = var("GEMINI_BASE_URL") {
            self.base_url = base_url;
        }
        Ok(self)
    }
}

/// Reads the JSON config at `path` (defaults when the file does not exist),
/// then applies environment overrides.
pub async fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    let config = match fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("no config file at {}, using defaults", path.display());
            AppConfig::default()
        }
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    config.apply_env(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
}

/// Where the provider credential comes from. Resolved on every request.
#[derive(Debug, Clone)]
pub enum KeySource {
    Env(String),
    Static(Option<String>),
}

impl KeySource {
    pub fn resolve(&self) -> Option<String> {
        let key = match self {
            KeySource::Env(name) => std::env::var(name).ok(),
            KeySource::Static(key) => key.clone(),
        };
        key.filter(|k| !k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.json")).await.unwrap();
        assert_eq!(config.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.max_body_bytes, AppConfig::default().max_body_bytes);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gemchat.json");
        std::fs::write(&path, r#"{"model": "gemini-2.0-flash", "bind": "0.0.0.0:8080"}"#).unwrap();

        let config: AppConfig = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.api_key_env, "GEMINI_API_KEY");
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gemchat.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_config(&path).await.is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("GEMCHAT_BIND", "127.0.0.1:9000"),
            ("GEMINI_BASE_URL", "http://localhost:1"),
        ]
        .into_iter()
        .collect();
        let config = AppConfig::default()
            .apply_env(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.base_url, "http://localhost:1");
        assert_eq!(config.model, "gemini-2.5-flash");

        let bad = AppConfig::default().apply_env(|name| (name == "GEMCHAT_BIND").then(|| "nope".to_string()));
        assert!(bad.is_err());
    }

    #[test]
    fn blank_keys_are_missing() {
        assert_eq!(KeySource::Static(Some("  ".into())).resolve(), None);
        assert_eq!(KeySource::Static(None).resolve(), None);
        assert_eq!(KeySource::Static(Some("k".into())).resolve().as_deref(), Some("k"));
    }
}
