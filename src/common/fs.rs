use std::{io::Cursor, path::{Path, PathBuf}};

use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::{EngineError, Result};

/// Extracts an in-memory `.zip` payload into `dest_dir`.
/// `source_name` identifies the payload (URL or path) in error messages.
pub(crate) fn extract_zip(bytes: &[u8], dest_dir: &Path, source_name: &str) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| EngineError::archive(source_name, format!("failed to read zip archive: {e}")))?;

    archive.extract(dest_dir)
        .map_err(|e| EngineError::archive(source_name, format!("failed to extract to {}: {e}", dest_dir.display())))?;

    Ok(())
}

/// Lists every regular file below `dir`, sorted by path.
pub(crate) fn list_files(dir: &Path, source_name: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry
            .map_err(|e| EngineError::archive(source_name, format!("failed to list extracted files: {e}")))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
