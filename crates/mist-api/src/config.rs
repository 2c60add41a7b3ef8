use anyhow::{Context, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paging::DEFAULT_PAGE_SIZE;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const API_URL_ENV: &str = "MIST_API_URL";
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Client-local settings persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Overrides the API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    /// Labels scored against a document's image embedding
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Settings {
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".mist").join("settings.toml"))
    }

    /// Load settings from the default location; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string(self)?;
        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|f| {
                f.write_all(contents.as_bytes())?;
                f.flush()
            })
            .map_err(|err| anyhow::anyhow!("Failed to write {}: {err}", path.display()))?;
        Ok(())
    }

    /// Set the base URL override after validating it.
    pub fn set_api_base_url(&mut self, url: &str) -> Result<()> {
        self.api_base_url = Some(normalize_base_url(url)?);
        Ok(())
    }

    /// Add a label; returns false if it is blank or already present.
    pub fn add_label(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || self.labels.iter().any(|l| l == label) {
            return false;
        }
        self.labels.push(label.to_string());
        true
    }

    pub fn remove_label(&mut self, label: &str) -> bool {
        let before = self.labels.len();
        self.labels.retain(|l| l != label.trim());
        self.labels.len() != before
    }
}

/// Validate a base URL and strip its trailing slash.
pub fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    let parsed =
        url::Url::parse(trimmed).with_context(|| format!("Invalid API base URL: {trimmed}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("API base URL must use http or https: {trimmed}");
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Everything needed to talk to the backend, passed in explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub page_size: u32,
    pub labels: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
            labels: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Resolve the base URL: explicit override, then settings, then the
    /// environment, then the built-in default.
    pub fn resolve(
        override_url: Option<&str>,
        settings: &Settings,
        env_url: Option<String>,
    ) -> Result<Self> {
        let base_url = match (override_url, &settings.api_base_url, env_url) {
            (Some(url), _, _) => normalize_base_url(url)?,
            (None, Some(url), _) => normalize_base_url(url)?,
            (None, None, Some(url)) => normalize_base_url(&url)?,
            (None, None, None) => DEFAULT_API_BASE_URL.to_string(),
        };
        Ok(Self {
            base_url,
            labels: settings.labels.clone(),
            ..Self::default()
        })
    }

    /// `resolve` with the URL taken from the process environment
    pub fn from_env(override_url: Option<&str>, settings: &Settings) -> Result<Self> {
        Self::resolve(override_url, settings, std::env::var(API_URL_ENV).ok())
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        assert_eq!(Settings::load_from(&path).unwrap(), Settings::default());

        let mut settings = Settings::default();
        settings.set_api_base_url("https://mist.example.com/").unwrap();
        assert!(settings.add_label("cat"));
        assert!(settings.add_label(" dog "));
        assert!(!settings.add_label("cat"));
        assert!(!settings.add_label("  "));
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.api_base_url.as_deref(), Some("https://mist.example.com"));
        assert_eq!(loaded.labels, vec!["cat", "dog"]);
    }

    #[test]
    fn test_remove_label() {
        let mut settings = Settings::default();
        settings.add_label("cat");
        assert!(settings.remove_label("cat"));
        assert!(!settings.remove_label("cat"));
        assert!(settings.labels.is_empty());
    }

    #[test]
    fn test_invalid_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "labels = 3").unwrap();
        assert!(Settings::load_from(&path).is_err());
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:5000/").unwrap(),
            "http://localhost:5000"
        );
        assert!(normalize_base_url("localhost:5000").is_err());
        assert!(normalize_base_url("ftp://example.com").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_base_url_precedence() {
        let mut settings = Settings::default();
        let env = Some("http://env:1".to_string());

        let config = ClientConfig::resolve(None, &settings, None).unwrap();
        assert_eq!(config.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.timeout, Duration::from_millis(10_000));

        let config = ClientConfig::resolve(None, &settings, env.clone()).unwrap();
        assert_eq!(config.base_url, "http://env:1");

        settings.api_base_url = Some("http://saved:2/".to_string());
        settings.labels = vec!["cat".to_string()];
        let config = ClientConfig::resolve(None, &settings, env.clone()).unwrap();
        assert_eq!(config.base_url, "http://saved:2");
        assert_eq!(config.labels, vec!["cat"]);

        let config = ClientConfig::resolve(Some("http://flag:3"), &settings, env).unwrap();
        assert_eq!(config.base_url, "http://flag:3");
    }

    #[test]
    fn test_endpoint() {
        let config = ClientConfig::new("http://localhost:5000/");
        assert_eq!(
            config.endpoint("/list-documents"),
            "http://localhost:5000/list-documents"
        );
        assert_eq!(ClientConfig::default().with_page_size(0).page_size, 1);
    }
}
