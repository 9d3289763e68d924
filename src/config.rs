use std::{path::{Path, PathBuf}, time::Duration};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// Latest NHC 5 km wind speed probability archive.
pub const DEFAULT_ARCHIVE_URL: &str = "https://www.nhc.noaa.gov/gis/forecast/archive/wsp_120hr5km_latest.zip";

/// dBase column carrying the probability band in the NHC datasets.
pub const DEFAULT_ATTRIBUTE_FIELD: &str = "PERCENTAGE";

/// Where the polygon archive comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveSource {
    Url(String),
    Path(PathBuf),
}

impl std::fmt::Display for ArchiveSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveSource::Url(url) => f.write_str(url),
            ArchiveSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Default for ArchiveSource {
    fn default() -> Self { Self::Url(DEFAULT_ARCHIVE_URL.to_string()) }
}

/// Engine settings. Every field has a default, so a config file may set any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub archive: ArchiveSource,
    pub attribute_field: String,
    pub max_batch_size: usize,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    /// Parent of the per-fetch scratch directories; the system temp directory when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            archive: ArchiveSource::default(),
            attribute_field: DEFAULT_ATTRIBUTE_FIELD.to_string(),
            max_batch_size: 50,
            fetch_timeout_secs: 30,
            user_agent: format!("riskband/{}", env!("CARGO_PKG_VERSION")),
            scratch_dir: None,
        }
    }
}

impl EngineConfig {
    /// Load settings from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_batch_size > 0, "max_batch_size must be at least 1");
        ensure!(self.fetch_timeout_secs > 0, "fetch_timeout_secs must be at least 1");
        ensure!(!self.attribute_field.trim().is_empty(), "attribute_field must not be empty");
        Ok(())
    }

    #[inline]
    pub fn fetch_timeout(&self) -> Duration { Duration::from_secs(self.fetch_timeout_secs) }
}
