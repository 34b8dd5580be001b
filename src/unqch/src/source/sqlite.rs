//! SQLite implementation using rusqlite (synchronous).
//!
//! A QCH file is an SQLite database; it is always opened read-only.

use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;

use super::ArchiveSource;
use crate::types::{FileRecord, Folder};
use crate::Result;

const CONTENTS_QUERY: &str = "SELECT Data FROM ContentsTable";

const FOLDERS_QUERY: &str = "SELECT Id, Name FROM FolderTable";

const FILES_QUERY: &str = r#"
    SELECT fn.FileId, fn.Name, fn.Title, dt.Data
    FROM FileDataTable dt
    JOIN FileNameTable fn ON dt.Id = fn.FileId
    WHERE fn.FolderId = ?1
"#;

/// SQLite-backed QCH archive
pub struct SqliteArchive {
    conn: Connection,
}

impl SqliteArchive {
    /// Open an archive read-only
    ///
    /// Fails with a store error if the file is missing or is not an SQLite
    /// database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path.as_ref(), flags)?;
        Self::from_connection(conn)
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: Connection) -> Result<Self> {
        // SQLite reads the file header lazily; force it so a non-database
        // file is reported at open time
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })?;

        Ok(Self { conn })
    }
}

impl ArchiveSource for SqliteArchive {
    fn contents_blobs(&self) -> Result<Vec<Vec<u8>>> {
        let mut stmt = self.conn.prepare(CONTENTS_QUERY)?;
        let rows = stmt.query_map([], |row| row.get::<_, Option<Vec<u8>>>(0))?;

        let mut blobs = Vec::new();
        for row in rows {
            match row? {
                Some(blob) => blobs.push(blob),
                None => tracing::debug!("skipping NULL contents row"),
            }
        }

        Ok(blobs)
    }

    fn folders(&self) -> Result<Vec<Folder>> {
        let mut stmt = self.conn.prepare(FOLDERS_QUERY)?;
        let folders = stmt
            .query_map([], |row| {
                Ok(Folder {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(folders)
    }

    fn for_each_file(
        &self,
        folder_id: i64,
        handler: &mut dyn FnMut(FileRecord) -> Result<()>,
    ) -> Result<()> {
        let mut stmt = self.conn.prepare(FILES_QUERY)?;
        let mut rows = stmt.query(params![folder_id])?;

        while let Some(row) = rows.next()? {
            let record = FileRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                title: row.get(2)?,
                payload: row.get(3)?,
            };
            handler(record)?;
        }

        Ok(())
    }
}
