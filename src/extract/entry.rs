//! Entry enumeration.
//!
//! Turns central directory records into [`ArchiveEntry`] values and drops
//! everything that can never become a project file: directory markers and
//! platform metadata written by archivers.

use crate::zip::CentralDirectoryEntry;

use super::paths::normalize_separators;

/// Top-level directory macOS Finder writes resource forks into.
pub const METADATA_DIR: &str = "__MACOSX";

/// One item of the archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Path exactly as stored in the archive.
    pub raw_path: String,
    pub is_directory: bool,
    /// Location and compression metadata of the content, `None` for directories.
    pub raw_content: Option<CentralDirectoryEntry>,
}

impl From<CentralDirectoryEntry> for ArchiveEntry {
    fn from(record: CentralDirectoryEntry) -> Self {
        let is_directory = record.is_directory();
        Self {
            raw_path: record.file_name.clone(),
            is_directory,
            raw_content: (!is_directory).then_some(record),
        }
    }
}

/// A file entry that survived enumeration, with its separator-normalized path.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: String,
    pub raw_path: String,
    pub content: CentralDirectoryEntry,
}

/// Result of walking the central directory.
#[derive(Debug, Default)]
pub struct Enumeration {
    /// File entries, in archive order.
    pub files: Vec<FileEntry>,
    pub directories: usize,
    pub metadata: usize,
}

/// True when `path` lives under the metadata directory.
pub fn is_metadata(path: &str) -> bool {
    path.split('/').next() == Some(METADATA_DIR)
}

/// Classify every record, keeping only files outside the metadata directory.
pub fn enumerate(records: impl IntoIterator<Item = CentralDirectoryEntry>) -> Enumeration {
    let mut enumeration = Enumeration::default();

    for entry in records.into_iter().map(ArchiveEntry::from) {
        let path = normalize_separators(&entry.raw_path);
        if is_metadata(&path) {
            enumeration.metadata += 1;
            continue;
        }
        match entry.raw_content {
            Some(content) => enumeration.files.push(FileEntry {
                path,
                raw_path: entry.raw_path,
                content,
            }),
            None => enumeration.directories += 1,
        }
    }

    enumeration
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::CompressionMethod;

    fn record(name: &str) -> CentralDirectoryEntry {
        CentralDirectoryEntry {
            file_name: name.to_string(),
            flags: 0,
            compression_method: CompressionMethod::Stored,
            compressed_size: 1,
            uncompressed_size: 1,
            crc32: 0,
            lfh_offset: 0,
            external_attrs: 0,
        }
    }

    #[test]
    fn directories_carry_no_content() {
        let entry = ArchiveEntry::from(record("app/src/"));
        assert!(entry.is_directory);
        assert!(entry.raw_content.is_none());

        let entry = ArchiveEntry::from(record("app/src/main.js"));
        assert!(!entry.is_directory);
        assert!(entry.raw_content.is_some());
    }

    #[test]
    fn drops_directories_and_metadata() {
        let enumeration = enumerate([
            record("app/"),
            record("app/index.js"),
            record("__MACOSX/"),
            record("__MACOSX/app/._index.js"),
            record("app/style.css"),
        ]);
        let paths: Vec<_> = enumeration.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["app/index.js", "app/style.css"]);
        assert_eq!(enumeration.directories, 1);
        assert_eq!(enumeration.metadata, 2);
    }

    #[test]
    fn metadata_aliases_are_dropped() {
        let enumeration = enumerate([record("/__MACOSX/._a.js"), record("__MACOSX\\._b.js")]);
        assert!(enumeration.files.is_empty());
        assert_eq!(enumeration.metadata, 2);
    }

    #[test]
    fn metadata_match_is_on_the_whole_segment() {
        assert!(is_metadata("__MACOSX/._x"));
        assert!(!is_metadata("__MACOSX_notes/readme.md"));
        assert!(!is_metadata("app/__MACOSX/._x"));
    }
}
