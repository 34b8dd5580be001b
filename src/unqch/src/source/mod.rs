//! Read-only access to archive tables.
//!
//! The [`ArchiveSource`] trait exposes the four logical QCH tables as row
//! contracts, so decoding and extraction never depend on a storage engine:
//!
//! - `ContentsTable(Data)` via [`ArchiveSource::contents_blobs`]
//! - `FolderTable(Id, Name)` via [`ArchiveSource::folders`]
//! - `FileNameTable` joined with `FileDataTable` via [`ArchiveSource::for_each_file`]

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryArchive;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteArchive;

use crate::types::{FileRecord, Folder};
use crate::Result;

/// Trait for archive table access (synchronous, read-only)
pub trait ArchiveSource {
    /// All `ContentsTable.Data` blobs, in row order
    fn contents_blobs(&self) -> Result<Vec<Vec<u8>>>;

    /// All folders, in store order
    fn folders(&self) -> Result<Vec<Folder>>;

    /// Visit the file records of one folder, in store order
    ///
    /// Records are streamed so that payloads need not all be held in
    /// memory. Returning an error from the handler stops iteration and is
    /// passed through.
    fn for_each_file(
        &self,
        folder_id: i64,
        handler: &mut dyn FnMut(FileRecord) -> Result<()>,
    ) -> Result<()>;
}
