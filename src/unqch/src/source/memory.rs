//! In-memory [`ArchiveSource`] for tests and archives built in process.

use super::ArchiveSource;
use crate::types::{FileRecord, Folder};
use crate::Result;

/// In-memory archive tables
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    contents: Vec<Vec<u8>>,
    folders: Vec<Folder>,
    /// (folder id, record)
    files: Vec<(i64, FileRecord)>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `ContentsTable` row
    pub fn add_contents(&mut self, blob: Vec<u8>) -> &mut Self {
        self.contents.push(blob);
        self
    }

    /// Append a `FolderTable` row
    pub fn add_folder(&mut self, id: i64, name: impl Into<String>) -> &mut Self {
        self.folders.push(Folder {
            id,
            name: name.into(),
        });
        self
    }

    /// Append a file record belonging to `folder_id`
    pub fn add_file(&mut self, folder_id: i64, record: FileRecord) -> &mut Self {
        self.files.push((folder_id, record));
        self
    }
}

impl ArchiveSource for MemoryArchive {
    fn contents_blobs(&self) -> Result<Vec<Vec<u8>>> {
        Ok(self.contents.clone())
    }

    fn folders(&self) -> Result<Vec<Folder>> {
        Ok(self.folders.clone())
    }

    fn for_each_file(
        &self,
        folder_id: i64,
        handler: &mut dyn FnMut(FileRecord) -> Result<()>,
    ) -> Result<()> {
        self.files
            .iter()
            .filter(|(id, _)| *id == folder_id)
            .try_for_each(|(_, record)| handler(record.clone()))
    }
}
