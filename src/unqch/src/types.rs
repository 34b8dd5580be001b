//! Shared row types for archive sources.
//!
//! These types are store-agnostic and used by all source implementations.

/// A logical folder; one output subdirectory per folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: i64,
    /// Relative directory name
    pub name: String,
}

/// One stored document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    /// Relative path within the folder, may contain `/` separators
    pub name: Option<String>,
    /// Informational only
    pub title: Option<String>,
    /// Tagged zlib payload
    pub payload: Option<Vec<u8>>,
}

impl FileRecord {
    /// Name and payload, if both are present
    pub fn extractable(&self) -> Option<(&str, &[u8])> {
        match (&self.name, &self.payload) {
            (Some(name), Some(payload)) => Some((name.as_str(), payload.as_slice())),
            _ => None,
        }
    }
}

/// Counters for one extraction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub contents_rows: usize,
    pub contents_entries: usize,
    pub folders: usize,
    pub files_written: usize,
    /// Records without a name or payload
    pub records_skipped: usize,
    pub bytes_written: u64,
}

impl ExtractStats {
    /// Fold another run's counters into this one
    pub fn merge(&mut self, other: &ExtractStats) {
        self.contents_rows += other.contents_rows;
        self.contents_entries += other.contents_entries;
        self.folders += other.folders;
        self.files_written += other.files_written;
        self.records_skipped += other.records_skipped;
        self.bytes_written += other.bytes_written;
    }
}

impl std::fmt::Display for ExtractStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} contents entries, {} files in {} folders ({} bytes), {} records skipped",
            self.contents_entries,
            self.files_written,
            self.folders,
            self.bytes_written,
            self.records_skipped
        )
    }
}
