//! Byte-range segment reader
//!
//! A read-only view of `[offset, offset + length)` of a source file. Each part
//! opens its own segment, so no two parts share a file handle or cursor.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, BufReader, Take};

use super::types::{PartRange, UploadError};

/// Read-only view of one part's byte range
pub struct FileSegment {
    path: PathBuf,
    range: PartRange,
    reader: Take<BufReader<File>>,
}

impl FileSegment {
    /// Open `path` positioned at the start of `range`
    pub async fn open(path: &Path, range: PartRange) -> Result<Self, UploadError> {
        let mut file = File::open(path)
            .await
            .map_err(|e| UploadError::io(path, e))?;

        file.seek(SeekFrom::Start(range.offset))
            .await
            .map_err(|e| UploadError::io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            range,
            reader: BufReader::new(file).take(range.length),
        })
    }

    pub fn range(&self) -> PartRange {
        self.range
    }

    /// Read the whole segment, consuming the view.
    ///
    /// The file is closed when this returns, on success or failure. Fewer bytes
    /// than the range length means the file shrank underneath us.
    pub async fn read_to_vec(mut self) -> Result<Vec<u8>, UploadError> {
        let mut buffer = Vec::with_capacity(self.range.length as usize);
        self.reader
            .read_to_end(&mut buffer)
            .await
            .map_err(|e| UploadError::io(&self.path, e))?;

        if (buffer.len() as u64) < self.range.length {
            return Err(UploadError::io(
                &self.path,
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "part {} expected {} bytes at offset {}, read {}",
                        self.range.part_number,
                        self.range.length,
                        self.range.offset,
                        buffer.len()
                    ),
                ),
            ));
        }

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::types::PartPlan;
    use tempfile::TempDir;

    async fn write_file(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        tokio::fs::write(&path, data).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_segments_reassemble_file() {
        let temp_dir = TempDir::new().unwrap();
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let path = write_file(&temp_dir, "sample.bin", &data).await;

        let plan = PartPlan::new(data.len() as u64, 300).unwrap();
        let mut assembled = Vec::new();
        for range in plan.parts() {
            let segment = FileSegment::open(&path, range).await.unwrap();
            let bytes = segment.read_to_vec().await.unwrap();
            assert_eq!(bytes.len() as u64, range.length);
            assembled.extend_from_slice(&bytes);
        }

        assert_eq!(assembled, data);
    }

    #[tokio::test]
    async fn test_segment_does_not_read_past_range() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(&temp_dir, "hello.txt", b"Hello, World!").await;

        let range = PartRange { part_number: 2, offset: 7, length: 5 };
        let bytes = FileSegment::open(&path, range)
            .await
            .unwrap()
            .read_to_vec()
            .await
            .unwrap();

        assert_eq!(bytes, b"World");
    }

    #[tokio::test]
    async fn test_empty_segment() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(&temp_dir, "empty.txt", b"").await;

        let range = PartRange { part_number: 1, offset: 0, length: 0 };
        let bytes = FileSegment::open(&path, range)
            .await
            .unwrap()
            .read_to_vec()
            .await
            .unwrap();

        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_short_read_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(&temp_dir, "short.txt", b"abc").await;

        let range = PartRange { part_number: 1, offset: 0, length: 10 };
        let result = FileSegment::open(&path, range).await.unwrap().read_to_vec().await;

        match result {
            Err(UploadError::Io { source, .. }) => {
                assert_eq!(source.kind(), std::io::ErrorKind::UnexpectedEof)
            }
            other => panic!("expected short read error, got {:?}", other.map(|b| b.len())),
        }
    }

    #[tokio::test]
    async fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let range = PartRange { part_number: 1, offset: 0, length: 1 };

        let result = FileSegment::open(&temp_dir.path().join("absent"), range).await;
        assert!(matches!(result, Err(UploadError::Io { .. })));
    }
}
