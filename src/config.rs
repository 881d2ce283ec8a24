use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::domain::entities::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: Option<PathBuf>,
    pub default_page_size: i64,
    pub page_size_options: Vec<i64>,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: vec![10, 25, 50, 100],
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `config.toml` from the user config dir. A missing file means
    /// defaults.
    pub fn load() -> Result<Self> {
        let dirs = project_dirs()?;
        Self::from_path(&dirs.config_dir().join(CONFIG_FILE))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config.normalized())
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_local_dir().join("records.sqlite")),
        }
    }

    fn normalized(mut self) -> Self {
        self.default_page_size = self.default_page_size.clamp(1, MAX_PAGE_SIZE);
        self.page_size_options
            .retain(|size| (1..=MAX_PAGE_SIZE).contains(size));
        if !self.page_size_options.contains(&self.default_page_size) {
            self.page_size_options.push(self.default_page_size);
        }
        self.page_size_options.sort_unstable();
        self.page_size_options.dedup();
        self
    }
}

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "hellhbbd", "recordgrid")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))
}

pub fn default_webview_data_dir() -> Result<PathBuf> {
    let webview_data_dir = project_dirs()?.data_local_dir().join("webview2");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").expect("empty config should parse");

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            default_page_size = 50
            log_filter = "recordgrid=debug"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.default_page_size, 50);
        assert_eq!(config.log_filter, "recordgrid=debug");
        assert_eq!(config.page_size_options, vec![10, 25, 50, 100]);
    }

    #[test]
    fn page_sizes_are_clamped_and_default_is_offered() {
        let config = AppConfig::from_toml(
            r#"
            default_page_size = 0
            page_size_options = [0, 20, 20, 5000]
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.default_page_size, 1);
        assert_eq!(config.page_size_options, vec![1, 20]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(AppConfig::from_toml("default_page_size = \"ten\"").is_err());
    }

    #[test]
    fn explicit_database_path_wins() {
        let config = AppConfig::from_toml(r#"database_path = "/tmp/grid.sqlite""#)
            .expect("config should parse");

        assert_eq!(
            config.database_path().expect("path"),
            PathBuf::from("/tmp/grid.sqlite")
        );
    }
}
