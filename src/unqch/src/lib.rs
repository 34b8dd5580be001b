//! # unqch
//!
//! Qt compressed help (`.qch`) archive decoding and extraction.
//!
//! A QCH file is an SQLite database. This library reads it through the
//! [`ArchiveSource`] trait and provides:
//! - Decoding of the binary table-of-contents blobs into depth-annotated entries
//! - Rendering those entries as an indented Markdown list
//! - Extraction of the zlib-compressed document payloads into a directory tree
//!
//! ## Example
//!
//! ```no_run
//! use unqch::{ExtractOptions, SqliteArchive};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archive = SqliteArchive::open("qtcore.qch")?;
//! let options = ExtractOptions::new("qtcore");
//!
//! let stats = unqch::run(&archive, &options)?;
//! println!("{} files written", stats.files_written);
//! # Ok(())
//! # }
//! ```
//!
//! ## Contents blob format
//!
//! Each `ContentsTable.Data` blob is a sequence of records with no outer
//! framing. Every record is:
//! - Bytes 0-3: nesting level (big-endian u32)
//! - Bytes 4-7: target length in bytes (big-endian u32)
//! - Target, UTF-16BE
//! - Title length in bytes (big-endian u32)
//! - Title, UTF-16BE
//!
//! ## Payload format
//!
//! Each `FileDataTable.Data` value is a 4-byte tag followed by a zlib stream.

pub mod contents;
pub mod extract;
pub mod payload;
pub mod source;
pub mod types;

use std::path::PathBuf;

// Re-export main types
#[doc(inline)]
pub use contents::{
    build_tree, decode, decode_all, encode, render, render_blobs, ContentsEntry, ContentsNode,
    Decoder,
};
#[doc(inline)]
pub use extract::{
    default_output, extract_folder, list_folders, run, write_contents, ExtractOptions,
    DEFAULT_TOC_NAME,
};
#[doc(inline)]
pub use payload::{decompress as decompress_payload, PayloadError, PAYLOAD_HEADER_SIZE};
#[doc(inline)]
pub use source::{ArchiveSource, MemoryArchive};
#[doc(inline)]
pub use types::{ExtractStats, FileRecord, Folder};

#[cfg(feature = "sqlite")]
#[doc(inline)]
pub use source::SqliteArchive;

/// Errors from archive decoding and extraction
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Malformed contents blob at offset {offset}: {reason}")]
    Format { offset: usize, reason: String },

    #[error("Corrupt payload: {0}")]
    Payload(#[from] PayloadError),

    #[error("Destination already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Archive store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to extract unsafe path: {0:?}")]
    UnsafePath(String),
}

impl Error {
    pub(crate) fn format(offset: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.to_string())
    }
}

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, Error>;
