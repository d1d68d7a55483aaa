use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// What was found on disk for a document key.
#[derive(Debug)]
pub enum DocumentState<T, E> {
    /// No file yet: create it
    Absent,
    /// File parsed: merge into it
    Present(T),
    /// File exists but cannot be merged: leave it untouched and report
    Malformed(E),
}

impl<T, E> DocumentState<T, E> {
    /// Read `path` and classify it with `parse`.
    ///
    /// `parse` receives the file contents; I/O errors other than "not found"
    /// are returned as errors rather than classified.
    pub fn load<F>(path: &Path, parse: F) -> io::Result<Self>
    where
        F: FnOnce(String) -> Result<T, E>,
    {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DocumentState::Absent),
            Err(e) => return Err(e),
        };

        Ok(match parse(contents) {
            Ok(parsed) => DocumentState::Present(parsed),
            Err(reason) => DocumentState::Malformed(reason),
        })
    }
}

/// Replace `path` with `contents` in one step.
///
/// The data goes to a temporary file in the same directory which is then
/// renamed over the target, so a failed write leaves the old file intact.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_absent() {
        let temp_dir = tempdir().unwrap();
        let state: DocumentState<String, ()> =
            DocumentState::load(&temp_dir.path().join("missing.md"), Ok).unwrap();
        assert!(matches!(state, DocumentState::Absent));
    }

    #[test]
    fn test_load_present_and_malformed() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("doc.md");
        fs::write(&path, "hello").unwrap();

        let state: DocumentState<usize, String> =
            DocumentState::load(&path, |s| Ok(s.len())).unwrap();
        assert!(matches!(state, DocumentState::Present(5)));

        let state: DocumentState<usize, String> =
            DocumentState::load(&path, |_| Err("bad".to_string())).unwrap();
        assert!(matches!(state, DocumentState::Malformed(ref r) if r == "bad"));
    }

    #[test]
    fn test_write_atomic_creates_dirs_and_replaces() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("2025").join("2025-01").join("2025-01-15.md");

        write_atomic(&path, "first").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");

        write_atomic(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");

        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
