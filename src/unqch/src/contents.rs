//! Table-of-contents blob decoding and rendering
//!
//! The navigation tree is stored as a flat sequence of records, each carrying
//! its own nesting level. There are no parent pointers: an entry is nested
//! under the closest preceding entry with a smaller level.

use byteorder::{BigEndian, ByteOrder};
use std::io::Write;

use crate::{Error, Result};

/// Size of the level and length fields
const FIELD_SIZE: usize = 4;

/// One navigation entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentsEntry {
    /// Nesting depth (0 = top level)
    pub level: u32,
    /// Relative path or fragment the entry links to
    pub target: String,
    /// Display text
    pub title: String,
}

impl ContentsEntry {
    pub fn new(level: u32, target: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            level,
            target: target.into(),
            title: title.into(),
        }
    }
}

/// Lazy, single-pass decoder over one contents blob
///
/// Yields entries until the buffer is exhausted. After the first error
/// the decoder is fused and yields nothing further.
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            failed: false,
        }
    }

    /// Current byte offset into the blob
    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_u32(&mut self, field: &str) -> Result<u32> {
        let remaining = self.data.len() - self.pos;
        if remaining < FIELD_SIZE {
            return Err(Error::format(
                self.pos,
                format!("expected 4-byte {field}, {remaining} bytes left"),
            ));
        }

        let value = BigEndian::read_u32(&self.data[self.pos..self.pos + FIELD_SIZE]);
        self.pos += FIELD_SIZE;
        Ok(value)
    }

    fn read_utf16(&mut self, field: &str) -> Result<String> {
        let len = self.read_u32(field)? as usize;
        let start = self.pos;
        let remaining = self.data.len() - start;

        if len > remaining {
            return Err(Error::format(
                start,
                format!("{field} length {len} overruns blob ({remaining} bytes left)"),
            ));
        }
        if len % 2 != 0 {
            return Err(Error::format(
                start,
                format!("{field} length {len} is not a whole number of UTF-16 units"),
            ));
        }

        let bytes = &self.data[start..start + len];
        self.pos += len;

        let units = bytes.chunks_exact(2).map(BigEndian::read_u16);
        char::decode_utf16(units)
            .collect::<std::result::Result<String, _>>()
            .map_err(|e| Error::format(start, format!("invalid UTF-16 in {field}: {e}")))
    }

    fn read_entry(&mut self) -> Result<ContentsEntry> {
        let level = self.read_u32("level")?;
        let target = self.read_utf16("target")?;
        let title = self.read_utf16("title")?;

        Ok(ContentsEntry {
            level,
            target,
            title,
        })
    }
}

impl Iterator for Decoder<'_> {
    type Item = Result<ContentsEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos == self.data.len() {
            return None;
        }

        let entry = self.read_entry();
        if entry.is_err() {
            self.failed = true;
        }
        Some(entry)
    }
}

impl std::iter::FusedIterator for Decoder<'_> {}

/// Decode a contents blob lazily
pub fn decode(data: &[u8]) -> Decoder<'_> {
    Decoder::new(data)
}

/// Decode a whole contents blob, failing on the first malformed record
pub fn decode_all(data: &[u8]) -> Result<Vec<ContentsEntry>> {
    decode(data).collect()
}

/// Encode entries into the contents blob format
pub fn encode<'a, I>(entries: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a ContentsEntry>,
{
    let mut out = Vec::new();

    for entry in entries {
        out.extend_from_slice(&entry.level.to_be_bytes());
        push_utf16(&mut out, &entry.target);
        push_utf16(&mut out, &entry.title);
    }

    out
}

fn push_utf16(out: &mut Vec<u8>, text: &str) {
    let bytes: Vec<u8> = text.encode_utf16().flat_map(u16::to_be_bytes).collect();
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(&bytes);
}

/// Render entries as an indented Markdown list, one line per entry
///
/// Each line is two spaces per level followed by `- [title](target)`.
/// Levels are written as given, even when they jump by more than one.
pub fn render<'a, I, W>(entries: I, out: &mut W) -> std::io::Result<usize>
where
    I: IntoIterator<Item = &'a ContentsEntry>,
    W: Write,
{
    let mut count = 0;
    let mut prev_level: Option<u32> = None;

    for entry in entries {
        let expected_max = prev_level.map_or(0, |l| l + 1);
        if entry.level > expected_max {
            tracing::warn!(
                level = entry.level,
                previous = ?prev_level,
                href = %entry.target,
                "contents entry skips nesting levels"
            );
        }
        prev_level = Some(entry.level);

        render_line(entry, out)?;
        count += 1;
    }

    Ok(count)
}

fn render_line<W: Write>(entry: &ContentsEntry, out: &mut W) -> std::io::Result<()> {
    let indent = (entry.level as usize).saturating_mul(2);
    writeln!(
        out,
        "{:indent$}- [{}]({})",
        "",
        entry.title,
        entry.target,
        indent = indent
    )
}

/// Decode and render a sequence of blobs in order
///
/// Entries from every blob go to the same output; nothing is sorted or
/// merged. Returns the total number of entries rendered.
pub fn render_blobs<B, W>(blobs: &[B], out: &mut W) -> Result<usize>
where
    B: AsRef<[u8]>,
    W: Write,
{
    let mut total = 0;

    for (row, blob) in blobs.iter().enumerate() {
        let entries = decode_all(blob.as_ref())?;
        tracing::debug!(row, entries = entries.len(), "decoded contents blob");
        total += render(&entries, out)?;
    }

    Ok(total)
}

/// A contents entry with its nested children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentsNode {
    pub entry: ContentsEntry,
    pub children: Vec<ContentsNode>,
}

/// Build an explicit forest from depth-annotated entries
///
/// Each entry becomes a child of the closest preceding entry with a smaller
/// level. Entries without such an ancestor are roots.
pub fn build_tree<I>(entries: I) -> Vec<ContentsNode>
where
    I: IntoIterator<Item = ContentsEntry>,
{
    let mut roots = Vec::new();
    let mut open: Vec<ContentsNode> = Vec::new();

    for entry in entries {
        while open.last().is_some_and(|n| n.entry.level >= entry.level) {
            close_node(&mut open, &mut roots);
        }
        open.push(ContentsNode {
            entry,
            children: Vec::new(),
        });
    }

    while !open.is_empty() {
        close_node(&mut open, &mut roots);
    }

    roots
}

fn close_node(open: &mut Vec<ContentsNode>, roots: &mut Vec<ContentsNode>) {
    if let Some(node) = open.pop() {
        match open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}
