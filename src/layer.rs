use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};

/// Extension of the polygon datasets inside an archive.
pub const DATASET_EXTENSION: &str = "shp";

fn is_dataset(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DATASET_EXTENSION))
}

/// Pick the single dataset whose file name contains `tag`.
///
/// Only `.shp` files are considered. No match is [`EngineError::LayerNotFound`];
/// more than one is [`EngineError::AmbiguousLayer`].
pub fn select_layer(files: &[PathBuf], tag: &str) -> Result<PathBuf> {
    let mut matches: Vec<PathBuf> = files.iter()
        .filter(|path| is_dataset(path))
        .filter(|path| path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains(tag)))
        .cloned()
        .collect();

    match matches.len() {
        0 => Err(EngineError::LayerNotFound { tag: tag.to_string() }),
        1 => Ok(matches.remove(0)),
        _ => {
            matches.sort();
            Err(EngineError::AmbiguousLayer { tag: tag.to_string(), matches })
        }
    }
}

/// File stems of every dataset in `files`, sorted.
pub fn available_layers(files: &[PathBuf]) -> Vec<String> {
    let mut stems: Vec<String> = files.iter()
        .filter(|path| is_dataset(path))
        .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .collect();
    stems.sort();
    stems
}
