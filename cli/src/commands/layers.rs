use anyhow::{Context, Result};
use riskband::BatchEvaluator;
use tracing::info;

use crate::{cli::LayersArgs, commands::{http_client, load_config}};

pub fn run(args: &LayersArgs) -> Result<()> {
    let config = load_config(&args.source)?;
    info!(archive = %config.archive, "[layers] listing datasets");

    let evaluator = BatchEvaluator::new(http_client(&config)?, config);
    let layers = evaluator.list_layers()
        .with_context(|| format!("failed to read archive {}", evaluator.config().archive))?;

    for layer in layers {
        println!("{layer}");
    }
    Ok(())
}
