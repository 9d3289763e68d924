use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::{
    common::{extract_zip, list_files, HttpClient},
    config::ArchiveSource,
    error::{EngineError, Result},
};

/// Files extracted from one archive into a private scratch directory.
/// The directory and its contents are removed when this value is dropped.
#[derive(Debug)]
pub struct ExtractedArchive {
    dir: TempDir,
    files: Vec<PathBuf>,
}

impl ExtractedArchive {
    /// Paths of every extracted file, sorted.
    #[inline] pub fn files(&self) -> &[PathBuf] { &self.files }

    /// Root of the scratch directory.
    #[inline] pub fn dir(&self) -> &Path { self.dir.path() }
}

/// Downloads (or opens) a zip of polygon datasets and extracts it to scratch storage.
/// Each call fetches again; callers cache what they load.
pub struct ArchiveFetcher<C> {
    client: C,
    scratch_root: Option<PathBuf>,
}

impl<C: HttpClient> ArchiveFetcher<C> {
    pub fn new(client: C) -> Self { Self { client, scratch_root: None } }

    /// Create scratch directories under `root` instead of the system temp directory.
    pub fn with_scratch_root(mut self, root: Option<PathBuf>) -> Self {
        self.scratch_root = root;
        self
    }

    /// Fetch from whichever source the configuration names.
    pub fn fetch_source(&self, source: &ArchiveSource) -> Result<ExtractedArchive> {
        match source {
            ArchiveSource::Url(url) => self.fetch(url),
            ArchiveSource::Path(path) => self.open(path),
        }
    }

    /// GET `url` and extract the response body.
    pub fn fetch(&self, url: &str) -> Result<ExtractedArchive> {
        debug!(%url, "[download] fetching archive");
        let bytes = self.client.get(url)?;
        debug!(%url, bytes = bytes.len(), "[download] received archive");
        self.unpack(&bytes, url)
    }

    /// Extract a local `.zip` file.
    pub fn open(&self, path: &Path) -> Result<ExtractedArchive> {
        let name = path.display().to_string();
        let bytes = std::fs::read(path)
            .map_err(|e| EngineError::archive(&name, format!("failed to read archive file: {e}")))?;
        self.unpack(&bytes, &name)
    }

    fn unpack(&self, bytes: &[u8], source_name: &str) -> Result<ExtractedArchive> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("riskband-");
        let dir = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| EngineError::archive(source_name, format!("failed to create scratch directory: {e}")))?;

        // `dir` drops (and is removed) if either step fails.
        extract_zip(bytes, dir.path(), source_name)?;
        let files = list_files(dir.path(), source_name)?;

        debug!(source = source_name, dir = %dir.path().display(), files = files.len(), "[extract] archive extracted");
        Ok(ExtractedArchive { dir, files })
    }
}
