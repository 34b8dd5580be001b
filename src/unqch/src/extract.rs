//! Archive extraction
//!
//! Writes the table of contents as Markdown and every stored document to a
//! directory tree. Extraction never overwrites: any existing destination
//! path aborts the run, and output written so far is left in place.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use crate::contents::render_blobs;
use crate::payload;
use crate::source::ArchiveSource;
use crate::types::{ExtractStats, FileRecord, Folder};
use crate::{Error, Result};

/// Default file name of the rendered table of contents
pub const DEFAULT_TOC_NAME: &str = "toc.md";

/// Settings for a whole-archive run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Output directory; must not exist yet
    pub output: PathBuf,
    /// File name of the table of contents inside `output`
    pub toc_name: String,
}

impl ExtractOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            toc_name: DEFAULT_TOC_NAME.to_string(),
        }
    }

    pub fn with_toc_name(mut self, toc_name: impl Into<String>) -> Self {
        self.toc_name = toc_name.into();
        self
    }
}

/// Default output directory for an archive: its file stem under `base`
pub fn default_output(input: &Path, base: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    base.join(stem)
}

/// Join a stored relative name onto `base` without leaving it
///
/// `/` separators create subdirectories and `.` is ignored. Absolute names
/// and any `..` component are rejected.
fn safe_join(base: &Path, name: &str) -> Result<PathBuf> {
    let mut parts = Vec::new();

    for component in Path::new(name).components() {
        match component {
            Component::Normal(s) if !s.as_encoded_bytes().contains(&0) => parts.push(s),
            Component::CurDir => {}
            _ => return Err(Error::UnsafePath(name.to_string())),
        }
    }

    let mut path = base.to_path_buf();
    path.extend(parts);
    Ok(path)
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// All folders of the archive, in store order
pub fn list_folders(source: &dyn ArchiveSource) -> Result<Vec<Folder>> {
    source.folders()
}

/// Render every `ContentsTable` row into a new Markdown file at `path`
pub fn write_contents(source: &dyn ArchiveSource, path: &Path) -> Result<ExtractStats> {
    let blobs = source.contents_blobs()?;

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| create_error(path, e))?;
    let mut out = BufWriter::new(file);

    let entries = render_blobs(&blobs, &mut out)?;
    out.flush().map_err(|e| Error::write(path, e))?;

    tracing::info!(rows = blobs.len(), entries, path = %path.display(), "wrote contents");

    Ok(ExtractStats {
        contents_rows: blobs.len(),
        contents_entries: entries,
        ..Default::default()
    })
}

/// Extract every file record of one folder into `destination`
///
/// Records without a name or payload are skipped. The first record whose
/// destination already exists aborts extraction with
/// [`Error::AlreadyExists`].
pub fn extract_folder(
    source: &dyn ArchiveSource,
    folder_id: i64,
    destination: &Path,
) -> Result<ExtractStats> {
    let mut stats = ExtractStats::default();

    source.for_each_file(folder_id, &mut |record| {
        match extract_record(&record, destination)? {
            Some(bytes) => {
                stats.files_written += 1;
                stats.bytes_written += bytes;
            }
            None => stats.records_skipped += 1,
        }
        Ok(())
    })?;

    Ok(stats)
}

/// Write one record; returns the number of bytes written, or `None` if skipped
fn extract_record(record: &FileRecord, destination: &Path) -> Result<Option<u64>> {
    let Some((name, data)) = record.extractable() else {
        tracing::debug!(
            file_id = record.id,
            name = ?record.name,
            has_payload = record.payload.is_some(),
            "skipping record without content"
        );
        return Ok(None);
    };

    tracing::debug!(
        file_id = record.id,
        size = data.len(),
        name,
        title = ?record.title,
        "extracting"
    );

    let path = safe_join(destination, name)?;
    if path == destination {
        return Err(Error::UnsafePath(name.to_string()));
    }
    if exists(&path) {
        return Err(Error::AlreadyExists(path));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;
    }

    let text = payload::decompress(data)?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| create_error(&path, e))?;
    file.write_all(&text).map_err(|e| Error::write(&path, e))?;

    Ok(Some(text.len() as u64))
}

fn create_error(path: &Path, e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::AlreadyExists {
        Error::AlreadyExists(path.to_path_buf())
    } else {
        Error::write(path, e)
    }
}

/// Extract a whole archive
///
/// Fails with [`Error::AlreadyExists`] if the output directory exists.
/// Otherwise creates it, writes the table of contents, then extracts each
/// folder into a subdirectory named after it, in store order.
pub fn run(source: &dyn ArchiveSource, options: &ExtractOptions) -> Result<ExtractStats> {
    let output = options.output.as_path();
    if exists(output) {
        return Err(Error::AlreadyExists(output.to_path_buf()));
    }

    // The table of contents sits directly in the output directory
    let mut components = Path::new(&options.toc_name).components();
    let toc_path = match (components.next(), components.next()) {
        (Some(Component::Normal(file)), None) => output.join(file),
        _ => return Err(Error::UnsafePath(options.toc_name.clone())),
    };

    tracing::debug!(output = %output.display(), "creating output directory");
    fs::create_dir_all(output).map_err(|e| Error::write(output, e))?;

    let mut stats = write_contents(source, &toc_path)?;

    for folder in list_folders(source)? {
        let destination = safe_join(output, &folder.name)?;
        fs::create_dir_all(&destination).map_err(|e| Error::write(&destination, e))?;

        let folder_stats = extract_folder(source, folder.id, &destination)?;
        tracing::info!(
            folder_id = folder.id,
            name = %folder.name,
            files = folder_stats.files_written,
            skipped = folder_stats.records_skipped,
            "extracted folder"
        );

        stats.folders += 1;
        stats.merge(&folder_stats);
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contents::{encode, ContentsEntry};
    use crate::payload::tests::make_payload;
    use crate::source::MemoryArchive;

    fn record(id: i64, name: Option<&str>, payload: Option<Vec<u8>>) -> FileRecord {
        FileRecord {
            id,
            name: name.map(str::to_string),
            title: Some(format!("Title {id}")),
            payload,
        }
    }

    fn sample_archive() -> MemoryArchive {
        let mut archive = MemoryArchive::new();
        archive
            .add_contents(encode(&[
                ContentsEntry::new(0, "index.html", "Home"),
                ContentsEntry::new(1, "intro.html", "Introduction"),
            ]))
            .add_folder(1, "docs")
            .add_file(1, record(1, Some("a.html"), Some(make_payload(b"<html></html>"))));
        archive
    }

    #[test]
    fn test_safe_join() {
        let base = Path::new("out");
        assert_eq!(safe_join(base, "a/b/c.html").unwrap(), base.join("a/b/c.html"));
        assert_eq!(safe_join(base, "./a//b.html").unwrap(), base.join("a/b.html"));
        assert!(safe_join(base, "../escape.html").is_err());
        assert!(safe_join(base, "a/../../escape.html").is_err());
        assert!(safe_join(base, "a\0b").is_err());
    }

    #[test]
    fn test_safe_join_rejects_absolute_and_parent_components() {
        let base = Path::new("out");
        for name in ["/abs.html", "/", "a/../b.html", "a/b/.."] {
            assert!(
                matches!(safe_join(base, name), Err(Error::UnsafePath(ref n)) if n == name),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_absolute_name_not_extracted() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = MemoryArchive::new();
        archive
            .add_file(1, record(1, Some("a/../b.html"), Some(make_payload(b"x"))))
            .add_file(1, record(2, Some("/abs.html"), Some(make_payload(b"x"))));

        let result = extract_folder(&archive, 1, dir.path());
        assert!(matches!(result, Err(Error::UnsafePath(_))));
        assert!(!dir.path().join("b.html").exists());
        assert!(!dir.path().join("abs.html").exists());
    }

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("/data/qtcore.qch"), Path::new("/work")),
            PathBuf::from("/work/qtcore")
        );
        assert_eq!(
            default_output(Path::new("archive"), Path::new(".")),
            PathBuf::from("./archive")
        );
    }

    #[test]
    fn test_extract_folder_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        let archive = sample_archive();

        let stats = extract_folder(&archive, 1, &docs).unwrap();
        assert_eq!(stats.files_written, 1);
        assert_eq!(stats.bytes_written, 13);
        assert_eq!(fs::read(docs.join("a.html")).unwrap(), b"<html></html>");
    }

    #[test]
    fn test_nested_names_create_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = MemoryArchive::new();
        archive.add_file(
            7,
            record(1, Some("images/icons/logo.svg"), Some(make_payload(b"<svg/>"))),
        );

        extract_folder(&archive, 7, dir.path()).unwrap();
        assert_eq!(
            fs::read(dir.path().join("images/icons/logo.svg")).unwrap(),
            b"<svg/>"
        );
    }

    #[test]
    fn test_null_name_or_payload_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = MemoryArchive::new();
        archive
            .add_file(1, record(1, None, Some(make_payload(b"orphan"))))
            .add_file(1, record(2, Some("nodata.html"), None))
            .add_file(1, record(3, Some("ok.html"), Some(make_payload(b"ok"))));

        let stats = extract_folder(&archive, 1, dir.path()).unwrap();
        assert_eq!(stats.files_written, 1);
        assert_eq!(stats.records_skipped, 2);
        assert!(!dir.path().join("nodata.html").exists());

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, ["ok.html"]);
    }

    #[test]
    fn test_existing_file_aborts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.html"), b"original").unwrap();
        let archive = sample_archive();

        let result = extract_folder(&archive, 1, dir.path());
        assert!(matches!(result, Err(Error::AlreadyExists(_))));
        assert_eq!(fs::read(dir.path().join("a.html")).unwrap(), b"original");
    }

    #[test]
    fn test_duplicate_names_abort_on_second() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = MemoryArchive::new();
        archive
            .add_file(1, record(1, Some("a.html"), Some(make_payload(b"first"))))
            .add_file(1, record(2, Some("a.html"), Some(make_payload(b"second"))))
            .add_file(1, record(3, Some("b.html"), Some(make_payload(b"third"))));

        let result = extract_folder(&archive, 1, dir.path());
        assert!(matches!(result, Err(Error::AlreadyExists(_))));
        assert_eq!(fs::read(dir.path().join("a.html")).unwrap(), b"first");
        assert!(!dir.path().join("b.html").exists());
    }

    #[test]
    fn test_corrupt_payload_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = MemoryArchive::new();
        archive
            .add_file(1, record(1, Some("short.html"), Some(vec![1, 2])))
            .add_file(1, record(2, Some("bad.html"), Some(b"xxxxgarbage".to_vec())));

        let result = extract_folder(&archive, 1, dir.path());
        assert!(matches!(result, Err(Error::Payload(_))));
        assert!(!dir.path().join("short.html").exists());
    }

    #[test]
    fn test_unsafe_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("docs");
        let mut archive = MemoryArchive::new();
        archive.add_file(1, record(1, Some("../evil.html"), Some(make_payload(b"x"))));

        let result = extract_folder(&archive, 1, &dest);
        assert!(matches!(result, Err(Error::UnsafePath(_))));
        assert!(!dir.path().join("evil.html").exists());
    }

    #[test]
    fn test_empty_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = MemoryArchive::new();
        archive.add_file(1, record(1, Some(""), Some(make_payload(b"x"))));

        let result = extract_folder(&archive, 1, dir.path());
        assert!(matches!(result, Err(Error::UnsafePath(_))));
    }

    #[test]
    fn test_write_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toc.md");
        let mut archive = sample_archive();
        archive.add_contents(encode(&[ContentsEntry::new(0, "faq.html", "FAQ")]));

        let stats = write_contents(&archive, &path).unwrap();
        assert_eq!(stats.contents_rows, 2);
        assert_eq!(stats.contents_entries, 3);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "- [Home](index.html)\n  - [Introduction](intro.html)\n- [FAQ](faq.html)\n"
        );
    }

    #[test]
    fn test_write_contents_malformed_blob() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = MemoryArchive::new();
        archive.add_contents(vec![0, 0, 0, 0, 0, 0, 0, 9]);

        let result = write_contents(&archive, &dir.path().join("toc.md"));
        assert!(matches!(result, Err(Error::Format { .. })));
    }

    #[test]
    fn test_run_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let archive = sample_archive();

        let stats = run(&archive, &ExtractOptions::new(&output)).unwrap();
        assert_eq!(stats.folders, 1);
        assert_eq!(stats.files_written, 1);
        assert_eq!(stats.contents_entries, 2);

        assert_eq!(
            fs::read_to_string(output.join("toc.md")).unwrap(),
            "- [Home](index.html)\n  - [Introduction](intro.html)\n"
        );
        assert_eq!(
            fs::read(output.join("docs/a.html")).unwrap(),
            b"<html></html>"
        );
    }

    #[test]
    fn test_run_twice_fails_without_modifying() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let archive = sample_archive();
        let options = ExtractOptions::new(&output);

        run(&archive, &options).unwrap();
        let before = fs::read(output.join("docs/a.html")).unwrap();

        let result = run(&archive, &options);
        assert!(matches!(result, Err(Error::AlreadyExists(ref p)) if p == &output));
        assert_eq!(fs::read(output.join("docs/a.html")).unwrap(), before);
    }

    #[test]
    fn test_run_custom_toc_name() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let options = ExtractOptions::new(&output).with_toc_name("index.md");

        run(&sample_archive(), &options).unwrap();
        assert!(output.join("index.md").exists());
        assert!(!output.join("toc.md").exists());
    }

    #[test]
    fn test_run_rejects_toc_name_outside_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");

        for toc_name in ["", "sub/toc.md", "../toc.md", "/toc.md", "."] {
            let options = ExtractOptions::new(&output).with_toc_name(toc_name);
            let result = run(&sample_archive(), &options);
            assert!(
                matches!(result, Err(Error::UnsafePath(ref n)) if n == toc_name),
                "{toc_name:?} should be rejected"
            );
            assert!(!output.exists());
        }
    }

    #[test]
    fn test_run_creates_empty_folders() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let mut archive = sample_archive();
        archive.add_folder(2, "empty");

        let stats = run(&archive, &ExtractOptions::new(&output)).unwrap();
        assert_eq!(stats.folders, 2);
        assert!(output.join("empty").is_dir());
    }
}
