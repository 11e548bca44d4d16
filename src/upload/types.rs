//! Upload types for multipart pushes

use std::path::PathBuf;

use crate::error::StorageError;

// ============================================================================
// Constants
// ============================================================================

/// Highest part number the multipart protocol accepts
pub const MAX_PARTS: u64 = 10_000;

// ============================================================================
// Part Planning
// ============================================================================

/// One contiguous byte range of a file, uploaded as a single part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRange {
    /// 1-based part number
    pub part_number: i32,
    /// Byte offset of the first byte in the part
    pub offset: u64,
    /// Number of bytes in the part
    pub length: u64,
}

impl PartRange {
    /// Offset one past the last byte of the part
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// How a file of a given size splits into parts
///
/// Always at least one part: an empty file uploads a single empty part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartPlan {
    file_size: u64,
    chunk_size: u64,
    part_count: u64,
}

impl PartPlan {
    /// Plan the parts for `file_size` bytes split into `chunk_size` pieces
    pub fn new(file_size: u64, chunk_size: u64) -> Result<Self, UploadError> {
        if chunk_size == 0 {
            return Err(UploadError::InvalidChunkSize(chunk_size));
        }

        let part_count = file_size.div_ceil(chunk_size).max(1);
        if part_count > MAX_PARTS {
            return Err(UploadError::TooManyParts {
                parts: part_count,
                max: MAX_PARTS,
            });
        }

        Ok(Self {
            file_size,
            chunk_size,
            part_count,
        })
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn part_count(&self) -> usize {
        self.part_count as usize
    }

    /// Byte range of the 1-based part `part_number`
    pub fn part(&self, part_number: u64) -> Option<PartRange> {
        if part_number == 0 || part_number > self.part_count {
            return None;
        }

        let offset = self.chunk_size * (part_number - 1);
        let length = self.chunk_size.min(self.file_size - offset);

        Some(PartRange {
            part_number: part_number as i32,
            offset,
            length,
        })
    }

    /// All parts in ascending part-number order
    pub fn parts(&self) -> impl Iterator<Item = PartRange> + '_ {
        (1..=self.part_count).filter_map(move |n| self.part(n))
    }
}

// ============================================================================
// Results
// ============================================================================

/// An object that was completed in storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub key: String,
    pub size: u64,
    pub parts: usize,
}

/// Outcome of pushing a whole directory
#[derive(Debug, Clone, Default)]
pub struct UploadSummary {
    /// Completed objects, in upload order
    pub objects: Vec<UploadedObject>,
    /// Entries that were not regular files
    pub skipped: Vec<PathBuf>,
}

impl UploadSummary {
    pub fn total_bytes(&self) -> u64 {
        self.objects.iter().map(|o| o.size).sum()
    }

    pub fn total_parts(&self) -> usize {
        self.objects.iter().map(|o| o.parts).sum()
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Upload error types
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Chunk size must be positive, got {0}")]
    InvalidChunkSize(u64),

    #[error("File needs {parts} parts (max: {max})")]
    TooManyParts { parts: u64, max: u64 },

    #[error("Cannot derive an object key from {0}")]
    InvalidObjectKey(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Part {part_number} of {key} failed: {source}")]
    PartUpload {
        key: String,
        part_number: i32,
        #[source]
        source: StorageError,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl UploadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
