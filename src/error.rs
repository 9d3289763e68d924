use std::path::PathBuf;

/// Failures raised while acquiring, selecting, or loading a layer.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Remote fetch failed: transport error, timeout, or non-success status.
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    /// The fetched (or local) payload is not a readable zip archive.
    #[error("invalid archive from {source_name}: {reason}")]
    Archive { source_name: String, reason: String },

    /// More than one dataset in the archive matches the layer tag.
    #[error("layer tag {tag:?} is ambiguous, it matches {} datasets: {}", .matches.len(), display_paths(.matches))]
    AmbiguousLayer { tag: String, matches: Vec<PathBuf> },

    /// No dataset in the archive matches the layer tag.
    #[error("no dataset in the archive matches layer tag {tag:?}")]
    LayerNotFound { tag: String },

    /// The selected dataset is unreadable, malformed, or empty.
    #[error("dataset {}{}: {reason}", .path.display(), layer_suffix(.layer))]
    Dataset { path: PathBuf, layer: Option<String>, reason: String },
}

impl EngineError {
    pub(crate) fn network(url: &str, reason: impl ToString) -> Self {
        Self::Network { url: url.to_string(), reason: reason.to_string() }
    }

    pub(crate) fn archive(source_name: impl ToString, reason: impl ToString) -> Self {
        Self::Archive { source_name: source_name.to_string(), reason: reason.to_string() }
    }

    pub(crate) fn dataset(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Dataset { path: path.into(), layer: None, reason: reason.to_string() }
    }

    /// Attach the layer tag to a dataset failure so an aborted batch names the layer.
    pub(crate) fn with_layer(self, tag: &str) -> Self {
        match self {
            Self::Dataset { path, reason, .. } => Self::Dataset { path, layer: Some(tag.to_string()), reason },
            other => other,
        }
    }

    /// Whether this failure aborts a whole batch (everything except a missing layer).
    pub fn is_batch_fatal(&self) -> bool {
        !matches!(self, Self::LayerNotFound { .. })
    }
}

fn layer_suffix(layer: &Option<String>) -> String {
    layer.as_ref().map(|tag| format!(" (layer {tag:?})")).unwrap_or_default()
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths.iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, EngineError>;
