//! Archive ingestion.
//!
//! [`ArchiveExtractor`] turns a ZIP archive into an [`ExtractedArchive`]:
//! a map from normalized relative path to text content, plus a project name
//! taken from the archive's file name.
//!
//! ## Pipeline
//!
//! 1. [`entry`]: read the central directory, drop directories and `__MACOSX/` metadata
//! 2. [`paths`]: strip the single wrapping folder, if every file has one
//! 3. [`content`]: decode all files concurrently and assemble the map
//!
//! Only a failure to read the archive itself, or an archive with nothing
//! left after filtering, fails the extraction. A file that cannot be
//! decoded is skipped and reported to the [`DiagnosticSink`].

pub mod content;
pub mod entry;
pub mod paths;
pub mod project;

pub use content::{ExtractedFileMap, FileRecord};
pub use entry::{ArchiveEntry, METADATA_DIR};
pub use project::{DEFAULT_PROJECT_NAME, project_name};

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ExtractOptions;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{EmptyArchiveError, ExtractError, Result};
use crate::io::{MemoryReader, ReadAt};
use crate::zip::ZipParser;

use content::PendingFile;

/// Files of an archive ready to load into a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedArchive {
    pub files: ExtractedFileMap,
    pub project_name: String,
}

/// Loads ZIP archives into [`ExtractedArchive`]s.
///
/// Holds no state between calls: extracting the same bytes twice gives
/// equal results.
#[derive(Debug, Clone, Default)]
pub struct ArchiveExtractor {
    options: ExtractOptions,
}

impl ArchiveExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract an archive held in memory.
    pub async fn extract(
        &self,
        archive: impl Into<Arc<[u8]>>,
        archive_file_name: &str,
        sink: &dyn DiagnosticSink,
    ) -> Result<ExtractedArchive> {
        let reader = Arc::new(MemoryReader::new(archive));
        self.extract_from(reader, archive_file_name, sink).await
    }

    /// Like [`extract`](Self::extract), failing with
    /// [`ExtractError::TimedOut`] if the whole run takes longer than `timeout`.
    pub async fn extract_with_timeout(
        &self,
        archive: impl Into<Arc<[u8]>>,
        archive_file_name: &str,
        sink: &dyn DiagnosticSink,
        timeout: Duration,
    ) -> Result<ExtractedArchive> {
        with_timeout(timeout, self.extract(archive, archive_file_name, sink)).await
    }

    /// Extract an archive from any random-access source.
    pub async fn extract_from<R: ReadAt>(
        &self,
        reader: Arc<R>,
        archive_file_name: &str,
        sink: &dyn DiagnosticSink,
    ) -> Result<ExtractedArchive> {
        let project_name = project_name(archive_file_name);
        sink.emit(Diagnostic::info(format!(
            "Reading archive {} ({} bytes)",
            archive_file_name,
            reader.size()
        )));

        let parser = ZipParser::new(reader);
        let records = parser.central_directory().await?;
        let total = records.len();

        let enumeration = entry::enumerate(records);
        tracing::debug!(
            total,
            files = enumeration.files.len(),
            directories = enumeration.directories,
            metadata = enumeration.metadata,
            "central directory enumerated"
        );
        sink.emit(Diagnostic::info(format!(
            "Found {} files in {} entries",
            enumeration.files.len(),
            total
        )));

        let root = paths::infer_root(enumeration.files.iter().map(|f| f.path.as_str()));
        if let Some(root) = root {
            sink.emit(Diagnostic::info(format!("Using {root}/ as the project root")));
        }

        let mut pending = Vec::with_capacity(enumeration.files.len());
        for file in &enumeration.files {
            let path = paths::strip_root(&file.path, root);
            if path.is_empty() || entry::is_metadata(path) {
                tracing::debug!(raw_path = %file.raw_path, "entry has no usable path");
                continue;
            }
            pending.push(PendingFile {
                path: path.to_string(),
                raw_path: file.raw_path.clone(),
                content: file.content.clone(),
            });
        }

        let files = content::materialize(&parser, pending, &self.options, sink).await;
        if files.is_empty() {
            return Err(EmptyArchiveError.into());
        }

        sink.emit(Diagnostic::success(format!(
            "Loaded {} files into {}",
            files.len(),
            project_name
        )));
        Ok(ExtractedArchive {
            files,
            project_name,
        })
    }
}

/// Run an extraction, failing with [`ExtractError::TimedOut`] once `timeout` elapses.
///
/// The extraction itself has no cancellation points of its own; the
/// timeout drops it as a whole.
pub async fn with_timeout<T>(
    timeout: Duration,
    extraction: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, extraction)
        .await
        .map_err(|_| ExtractError::TimedOut(timeout))?
}

/// Extract `archive` with default options.
pub async fn extract(
    archive: impl Into<Arc<[u8]>>,
    archive_file_name: &str,
    sink: &dyn DiagnosticSink,
) -> Result<ExtractedArchive> {
    ArchiveExtractor::default()
        .extract(archive, archive_file_name, sink)
        .await
}
