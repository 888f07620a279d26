//! # zipspace
//!
//! Load a ZIP archive into a normalized in-memory project file map.
//!
//! Given an uploaded archive and its file name, the extractor produces a map
//! from relative path to text content that an editor workspace can load
//! directly, and a project name taken from the archive's file name.
//!
//! ## Features
//!
//! - Strips the single folder many archivers wrap a project in
//! - Drops directory entries and `__MACOSX/` metadata
//! - Decodes entries concurrently; an undecodable file is skipped and reported, not fatal
//! - Support for ZIP64 format and archive comments
//! - Support for STORED (uncompressed) and DEFLATE compression methods
//! - Reads archives from memory, local files, or HTTP URLs using Range requests
//!
//! ## Example
//!
//! ```no_run
//! use zipspace::{ArchiveExtractor, TracingSink};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bytes = std::fs::read("myapp.zip")?;
//!
//!     let project = ArchiveExtractor::default()
//!         .extract(bytes, "myapp.zip", &TracingSink)
//!         .await?;
//!
//!     println!("{}", project.project_name);
//!     for path in project.files.keys() {
//!         println!("  {}", path);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod io;
pub mod upload;
pub mod zip;

pub use cli::Cli;
pub use config::{ExtractOptions, TextDecoding};
pub use diagnostics::{
    Diagnostic, DiagnosticSink, MemorySink, NullSink, Severity, TracingSink,
};
pub use error::{ArchiveError, EmptyArchiveError, EntryDecodeError, ExtractError};
pub use extract::{
    ArchiveEntry, ArchiveExtractor, DEFAULT_PROJECT_NAME, ExtractedArchive, ExtractedFileMap,
    FileRecord, extract, project_name,
};
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use upload::{UploadError, UploadPolicy};
