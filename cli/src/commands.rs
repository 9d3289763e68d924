pub mod evaluate;
pub mod layers;

use anyhow::Result;
use riskband::{ArchiveSource, EngineConfig, ReqwestClient};

use crate::cli::SourceArgs;

/// Config file (or defaults) with command-line overrides applied.
pub(crate) fn load_config(args: &SourceArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(url) = &args.url { config.archive = ArchiveSource::Url(url.clone()) }
    if let Some(path) = &args.archive { config.archive = ArchiveSource::Path(path.clone()) }
    if let Some(timeout) = args.timeout { config.fetch_timeout_secs = timeout }
    config.validate()?;
    Ok(config)
}

pub(crate) fn http_client(config: &EngineConfig) -> Result<ReqwestClient> {
    ReqwestClient::new(config.fetch_timeout(), &config.user_agent)
}
