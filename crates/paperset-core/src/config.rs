use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root configuration, loaded from `~/.config/paperset/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub fetch: FetchConfig,
    pub normalize: NormalizeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Newline-delimited JSON written by `fetch`, read by `normalize`.
    pub raw: PathBuf,
    /// Directory holding the three finished tables.
    pub processed: PathBuf,
    /// Parent of the dated release directories.
    pub releases: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub base_url: String,
    pub queries: Vec<String>,
    pub per_page: u32,
    pub pages: u32,
    pub min_interval_ms: u64,
    pub max_retries: u32,
    /// OpenAlex polite-pool address. `OPENALEX_EMAIL` wins when set.
    pub mailto: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub orphan_rows: OrphanRows,
}

/// What happens to citation and author rows emitted by a record that later
/// loses the dedup merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanRows {
    /// Rows are emitted as each record is read and never revisited.
    #[default]
    Keep,
    /// Rows whose pid has no surviving paper are dropped at the end of the pass.
    Drop,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for PathsConfig {
    fn default() -> Self {
        let data = PathBuf::from("data");
        Self {
            raw: data.join("raw").join("papers.jsonl"),
            processed: data.join("processed"),
            releases: data.join("releases"),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openalex.org".to_string(),
            queries: vec![
                "transformers".to_string(),
                "text generation".to_string(),
                "diffusion models".to_string(),
                "instruction tuning".to_string(),
            ],
            per_page: 200,
            pages: 5,
            min_interval_ms: 300,
            max_retries: 3,
            mailto: String::new(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/paperset/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PAPERSET_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("paperset")
            .join("config.toml")
    }

    /// Load config from a specific path, falling back to defaults if the file
    /// doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as the TOML that `load_from` accepts.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Applies `OPENALEX_EMAIL` on top of whatever the file said.
    pub fn apply_env(&mut self) {
        if let Ok(email) = std::env::var("OPENALEX_EMAIL")
            && !email.trim().is_empty()
        {
            self.fetch.mailto = email.trim().to_string();
        }
    }
}
