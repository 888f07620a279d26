//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For extraction, read each file's Local File Header and data
//!
//! Every failure in steps 1-3 is an [`ArchiveError`]: nothing is usable
//! until the whole central directory has been read. Step 4 happens per
//! entry and fails with an [`EntryDecodeError`].

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::error::{ArchiveError, EntryDecodeError};
use crate::io::{ReadAt, read_exact_at};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// ZIP64 extended information extra field ID.
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Low-level ZIP file parser.
///
/// Generic over the reader type so the same parsing runs over uploaded
/// bytes, local files and HTTP sources. Typically used through
/// [`ArchiveExtractor`](crate::ArchiveExtractor).
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Returns the record and its offset in the archive. The common case of
    /// an archive without a comment is checked first; otherwise the tail is
    /// searched backwards for a signature whose comment length matches.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64), ArchiveError> {
        let eocd_size = EndOfCentralDirectory::SIZE as u64;
        if self.size < eocd_size {
            return Err(ArchiveError::NotZip);
        }

        let offset = self.size - eocd_size;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        read_exact_at(self.reader.as_ref(), offset, &mut buf).await?;
        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && buf[20..22] == [0, 0] {
            let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
            return Ok((eocd, offset));
        }

        let search_size = (MAX_COMMENT_SIZE + eocd_size).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        read_exact_at(self.reader.as_ref(), search_start, &mut buf).await?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
                continue;
            }
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let eocd =
                    EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                return Ok((eocd, search_start + i as u64));
            }
        }

        Err(ArchiveError::NotZip)
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD has saturated fields. The locator sits
    /// immediately before the regular EOCD.
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD, ArchiveError> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or(ArchiveError::InvalidRecord("ZIP64 End of Central Directory Locator"))?;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        read_exact_at(self.reader.as_ref(), locator_offset, &mut locator_buf).await?;

        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;
        if locator.total_disks > 1 {
            return Err(ArchiveError::MultiDisk);
        }

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        read_exact_at(self.reader.as_ref(), locator.eocd64_offset, &mut eocd64_buf).await?;

        let eocd64 = Zip64EOCD::from_bytes(&eocd64_buf)?;
        if eocd64.disk_number != 0 || eocd64.disk_with_cd != 0 {
            return Err(ArchiveError::MultiDisk);
        }
        Ok(eocd64)
    }

    /// Read every record of the central directory, in archive order.
    pub async fn central_directory(&self) -> Result<Vec<CentralDirectoryEntry>, ArchiveError> {
        let (eocd, eocd_offset) = self.find_eocd().await?;
        if eocd.is_multi_disk() {
            return Err(ArchiveError::MultiDisk);
        }

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        // The directory must lie before the record that points at it.
        if cd_offset
            .checked_add(cd_size)
            .is_none_or(|cd_end| cd_end > eocd_offset)
        {
            return Err(ArchiveError::InvalidRecord("Central Directory bounds"));
        }

        // Read the entire Central Directory in one request
        // (efficient for HTTP as it's a single Range request)
        let mut cd_data = vec![0u8; cd_size as usize];
        read_exact_at(self.reader.as_ref(), cd_offset, &mut cd_data).await?;

        let mut entries = Vec::with_capacity(total_entries.min(cd_size / CDFH_MIN_SIZE as u64) as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for read in 0..total_entries {
            let remaining = cd_data.len() as u64 - cursor.position();
            if remaining < CDFH_MIN_SIZE as u64 {
                return Err(ArchiveError::Truncated {
                    expected: total_entries,
                    read,
                });
            }
            let entry = parse_cdfh(&mut cursor).map_err(|err| match err {
                ArchiveError::Io(_) => ArchiveError::Truncated {
                    expected: total_entries,
                    read,
                },
                other => other,
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Get the actual data offset for a file entry.
    ///
    /// The Local File Header repeats the name and carries its own extra
    /// field, which may differ in length from the central directory's, so
    /// the data offset can only be found by reading it.
    pub async fn data_offset(&self, entry: &CentralDirectoryEntry) -> Result<u64, EntryDecodeError> {
        let mut lfh_buf = [0u8; LFH_SIZE];
        read_exact_at(self.reader.as_ref(), entry.lfh_offset, &mut lfh_buf).await?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(EntryDecodeError::InvalidLocalHeader);
        }

        let mut cursor = Cursor::new(&lfh_buf[26..]);
        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Read an entry's raw (still compressed) bytes.
    pub async fn read_raw(&self, entry: &CentralDirectoryEntry) -> Result<Vec<u8>, EntryDecodeError> {
        let data_offset = self.data_offset(entry).await?;
        if entry.compressed_size > self.size.saturating_sub(data_offset) {
            return Err(EntryDecodeError::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }
        let mut buf = vec![0u8; entry.compressed_size as usize];
        read_exact_at(self.reader.as_ref(), data_offset, &mut buf).await?;
        Ok(buf)
    }

    /// Total size of the archive in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Parse one Central Directory File Header, leaving the cursor on the next.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<CentralDirectoryEntry, ArchiveError> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(ArchiveError::InvalidRecord("Central Directory File Header"));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();

    let mut extra = vec![0u8; extra_field_length as usize];
    cursor.read_exact(&mut extra)?;
    let mut extra = Cursor::new(extra.as_slice());

    while extra.position() + 4 <= extra_field_length as u64 {
        let header_id = extra.read_u16::<LittleEndian>()?;
        let field_size = extra.read_u16::<LittleEndian>()? as u64;
        let field_end = extra.position() + field_size;

        if header_id == ZIP64_EXTRA_ID {
            // Values appear only for header fields saturated at 0xFFFFFFFF,
            // always in this order.
            if uncompressed_size == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                uncompressed_size = extra.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                compressed_size = extra.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                lfh_offset = extra.read_u64::<LittleEndian>()?;
            }
        }
        extra.set_position(field_end);
    }

    // Skip over the file comment (we don't use it)
    let mut comment = vec![0u8; file_comment_length as usize];
    cursor.read_exact(&mut comment)?;

    Ok(CentralDirectoryEntry {
        file_name,
        flags,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        external_attrs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use byteorder::WriteBytesExt;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn parser(bytes: Vec<u8>) -> ZipParser<MemoryReader> {
        ZipParser::new(Arc::new(MemoryReader::new(bytes)))
    }

    fn archive(comment: Option<&str>) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.add_directory("app/", SimpleFileOptions::default()).unwrap();
        zip.start_file("app/readme.md", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"# app").unwrap();
        if let Some(comment) = comment {
            zip.set_comment(comment);
        }
        zip.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn reads_central_directory_in_order() {
        let entries = parser(archive(None)).central_directory().await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["app/", "app/readme.md"]);
        assert!(entries[0].is_directory());
        assert!(!entries[1].is_directory());
        assert_eq!(entries[1].uncompressed_size, 5);
    }

    #[tokio::test]
    async fn finds_eocd_behind_archive_comment() {
        let entries = parser(archive(Some("built by ci")))
            .central_directory()
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn rejects_non_zip_input() {
        let err = parser(b"definitely not a zip archive".to_vec())
            .central_directory()
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::NotZip));

        let err = parser(Vec::new()).central_directory().await.unwrap_err();
        assert!(matches!(err, ArchiveError::NotZip));
    }

    #[tokio::test]
    async fn rejects_truncated_archive() {
        let bytes = archive(None);
        // Drop the leading local header so the directory offsets point past the data.
        let truncated = bytes[10..].to_vec();
        assert!(parser(truncated).central_directory().await.is_err());
    }

    #[tokio::test]
    async fn reads_entries_written_as_large_files() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .large_file(true);
        zip.start_file("big/data.txt", options).unwrap();
        zip.write_all(b"small but flagged large").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let parser = parser(bytes);
        let entries = parser.central_directory().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].uncompressed_size, 23);

        let raw = parser.read_raw(&entries[0]).await.unwrap();
        assert_eq!(raw, b"small but flagged large");
    }

    /// Rewrite a plain archive so its directory is only reachable through
    /// ZIP64 records: a ZIP64 EOCD, its locator, then a saturated EOCD.
    fn zip64_archive(locator_disks: u32, eocd64_disk: u32) -> Vec<u8> {
        let mut bytes = archive(None);
        let eocd_offset = bytes.len() - EndOfCentralDirectory::SIZE;
        let eocd = EndOfCentralDirectory::from_bytes(&bytes[eocd_offset..]).unwrap();
        bytes.truncate(eocd_offset);

        let eocd64_offset = bytes.len() as u64;
        bytes.write_all(Zip64EOCD::SIGNATURE).unwrap();
        bytes.write_u64::<LittleEndian>(44).unwrap();
        bytes.write_u16::<LittleEndian>(45).unwrap();
        bytes.write_u16::<LittleEndian>(45).unwrap();
        bytes.write_u32::<LittleEndian>(eocd64_disk).unwrap();
        bytes.write_u32::<LittleEndian>(0).unwrap();
        bytes.write_u64::<LittleEndian>(eocd.total_entries as u64).unwrap();
        bytes.write_u64::<LittleEndian>(eocd.total_entries as u64).unwrap();
        bytes.write_u64::<LittleEndian>(eocd.cd_size as u64).unwrap();
        bytes.write_u64::<LittleEndian>(eocd.cd_offset as u64).unwrap();

        bytes.write_all(Zip64EOCDLocator::SIGNATURE).unwrap();
        bytes.write_u32::<LittleEndian>(0).unwrap();
        bytes.write_u64::<LittleEndian>(eocd64_offset).unwrap();
        bytes.write_u32::<LittleEndian>(locator_disks).unwrap();

        bytes.write_all(EndOfCentralDirectory::SIGNATURE).unwrap();
        bytes.write_u16::<LittleEndian>(0).unwrap();
        bytes.write_u16::<LittleEndian>(0).unwrap();
        bytes.write_u16::<LittleEndian>(0xFFFF).unwrap();
        bytes.write_u16::<LittleEndian>(0xFFFF).unwrap();
        bytes.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
        bytes.write_u32::<LittleEndian>(0xFFFFFFFF).unwrap();
        bytes.write_u16::<LittleEndian>(0).unwrap();
        bytes
    }

    #[tokio::test]
    async fn follows_zip64_end_of_central_directory() {
        let parser = parser(zip64_archive(1, 0));
        let (eocd, eocd_offset) = parser.find_eocd().await.unwrap();
        assert!(eocd.is_zip64());

        let eocd64 = parser.read_zip64_eocd(eocd_offset).await.unwrap();
        assert_eq!(eocd64.total_entries, 2);

        let entries = parser.central_directory().await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["app/", "app/readme.md"]);
        let raw = parser.read_raw(&entries[1]).await.unwrap();
        let content = crate::zip::decompress(&entries[1], &raw, u64::MAX).unwrap();
        assert_eq!(content, b"# app");
    }

    #[tokio::test]
    async fn rejects_multi_disk_zip64_archives() {
        let err = parser(zip64_archive(2, 0))
            .central_directory()
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::MultiDisk));

        let err = parser(zip64_archive(1, 1))
            .central_directory()
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::MultiDisk));
    }
}
