//! Content materialization.
//!
//! Each retained entry is read, inflated and decoded as text independently
//! of the others. Decodes run concurrently up to the configured width and
//! are all joined before the map is assembled.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::{ExtractOptions, TextDecoding};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::EntryDecodeError;
use crate::io::ReadAt;
use crate::zip::{CentralDirectoryEntry, ZipParser, decompress};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One project file ready for the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: String,
    pub content: String,
}

/// Normalized path to file, unordered by contract.
pub type ExtractedFileMap = BTreeMap<String, FileRecord>;

/// A file scheduled for decoding under its final path.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub path: String,
    pub raw_path: String,
    pub content: CentralDirectoryEntry,
}

/// Decode entry bytes as text, dropping a leading byte order mark.
pub fn decode_text(mut data: Vec<u8>, mode: TextDecoding) -> Result<String, EntryDecodeError> {
    if data.starts_with(UTF8_BOM) {
        data.drain(..UTF8_BOM.len());
    }
    match mode {
        TextDecoding::Strict => Ok(String::from_utf8(data)?),
        TextDecoding::Lossy => Ok(String::from_utf8_lossy(&data).into_owned()),
    }
}

async fn decode_entry<R: ReadAt>(
    parser: &ZipParser<R>,
    entry: &CentralDirectoryEntry,
    options: &ExtractOptions,
) -> Result<String, EntryDecodeError> {
    // Refuse before reading anything an entry that could never be kept.
    if entry.uncompressed_size > options.max_entry_size {
        return Err(EntryDecodeError::TooLarge(entry.uncompressed_size));
    }

    let raw = parser.read_raw(entry).await?;
    let record = entry.clone();
    let limit = options.max_entry_size;
    let mode = options.text_decoding;

    tokio::task::spawn_blocking(move || decode_text(decompress(&record, &raw, limit)?, mode))
        .await?
}

/// Decode every pending file and assemble the map.
///
/// Failed entries are reported to `sink` and left out. When two entries
/// share a path, the one enumerated later wins, whatever order the decodes
/// finished in.
pub async fn materialize<R: ReadAt>(
    parser: &ZipParser<R>,
    pending: Vec<PendingFile>,
    options: &ExtractOptions,
    sink: &dyn DiagnosticSink,
) -> ExtractedFileMap {
    let mut decoded: Vec<_> = stream::iter(pending.into_iter().enumerate())
        .map(|(index, file)| async move {
            let result = decode_entry(parser, &file.content, options).await;
            (index, file, result)
        })
        .buffer_unordered(options.concurrency.get())
        .collect()
        .await;
    decoded.sort_unstable_by_key(|(index, _, _)| *index);

    let mut files = ExtractedFileMap::new();
    for (_, file, result) in decoded {
        let content = match result {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!(path = %file.raw_path, error = ?err, "entry skipped");
                sink.emit(Diagnostic::error(format!(
                    "Skipped {}: {}",
                    file.raw_path, err
                )));
                continue;
            }
        };

        let record = FileRecord {
            path: file.path.clone(),
            content,
        };
        if files.insert(file.path, record).is_some() {
            sink.emit(Diagnostic::info(format!(
                "{} replaces an earlier entry with the same path",
                file.raw_path
            )));
        }
    }

    files
}
