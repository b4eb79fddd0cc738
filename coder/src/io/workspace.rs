//! Workspace accessor: file primitives resolved against a working directory.
//!
//! Every operation reports failures as plain messages; nothing here panics or
//! returns `anyhow` errors, so the dispatcher can fold them into tool results.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, instrument};

use crate::core::lines;
use crate::core::types::GrepMatch;
use crate::io::dir_tree;
use crate::io::search::{self, SearchQuery};

/// Error for writes and deletes against a missing file.
pub const FILE_DOES_NOT_EXIST: &str = "File does not exist";

/// File primitives the tool handlers and the edit applier run against.
pub trait Workspace {
    /// Directory that relative paths resolve against.
    fn root(&self) -> &Path;

    fn read(&self, path: &str) -> Result<String, String>;

    /// Replace the inclusive 1-indexed range `start..=end` with `text`.
    fn replace_range(&self, path: &str, start: i64, end: i64, text: &str) -> Result<(), String>;

    fn delete(&self, path: &str) -> Result<(), String>;

    /// Render a directory tree. The error carries the text to show instead.
    fn list_tree(&self, path: &str) -> Result<String, String>;

    fn search(&self, query: &SearchQuery) -> Result<Vec<GrepMatch>, String>;

    fn remove_range(&self, path: &str, start: Option<i64>, end: Option<i64>)
    -> Result<(), String>;

    fn insert(&self, path: &str, text: &str, line: Option<i64>) -> Result<(), String>;
}

/// [`Workspace`] backed by the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    root: PathBuf,
}

impl LocalWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute paths pass through; relative ones join the root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            normalize(candidate)
        } else {
            normalize(&self.root.join(candidate))
        }
    }
}

impl Workspace for LocalWorkspace {
    fn root(&self) -> &Path {
        &self.root
    }

    #[instrument(skip_all, fields(path))]
    fn read(&self, path: &str) -> Result<String, String> {
        let resolved = self.resolve(path);
        let bytes = fs::read(&resolved).map_err(|err| match err.kind() {
            ErrorKind::NotFound => format!("File not found: {}: {err}", resolved.display()),
            _ => format!("Unexpected error: {err}"),
        })?;
        let content = String::from_utf8(bytes)
            .map_err(|err| format!("Unicode decode error: {}", err.utf8_error()))?;
        debug!(bytes = content.len(), "read file");
        Ok(content)
    }

    #[instrument(skip_all, fields(path, start, end))]
    fn replace_range(&self, path: &str, start: i64, end: i64, text: &str) -> Result<(), String> {
        if start <= 0 || end <= 0 || end < start {
            return Err(lines::INVALID_RANGE.to_string());
        }
        let resolved = self.resolve(path);
        let current = read_existing(&resolved)?;
        let updated = lines::replace_range(&current, start, end, text)?;
        fs::write(&resolved, updated).map_err(|err| err.to_string())
    }

    #[instrument(skip_all, fields(path))]
    fn delete(&self, path: &str) -> Result<(), String> {
        let resolved = self.resolve(path);
        if !resolved.exists() {
            return Err(FILE_DOES_NOT_EXIST.to_string());
        }
        fs::remove_file(&resolved).map_err(|err| err.to_string())
    }

    #[instrument(skip_all, fields(path))]
    fn list_tree(&self, path: &str) -> Result<String, String> {
        dir_tree::render(&self.resolve(path))
    }

    #[instrument(skip_all, fields(query = %query.query))]
    fn search(&self, query: &SearchQuery) -> Result<Vec<GrepMatch>, String> {
        search::grep(&self.root, query)
    }

    #[instrument(skip_all, fields(path))]
    fn remove_range(
        &self,
        path: &str,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<(), String> {
        let resolved = self.resolve(path);
        let current = read_existing(&resolved)?;
        fs::write(&resolved, lines::remove_range(&current, start, end))
            .map_err(|err| err.to_string())
    }

    #[instrument(skip_all, fields(path))]
    fn insert(&self, path: &str, text: &str, line: Option<i64>) -> Result<(), String> {
        let resolved = self.resolve(path);
        let current = if resolved.exists() {
            read_existing(&resolved)?
        } else {
            if let Some(parent) = resolved.parent() {
                fs::create_dir_all(parent).map_err(|err| err.to_string())?;
            }
            String::new()
        };
        fs::write(&resolved, lines::insert_at(&current, text, line)).map_err(|err| err.to_string())
    }
}

fn read_existing(path: &Path) -> Result<String, String> {
    if !path.exists() {
        return Err(FILE_DOES_NOT_EXIST.to_string());
    }
    fs::read_to_string(path).map_err(|err| err.to_string())
}

/// Lexically resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> (tempfile::TempDir, LocalWorkspace) {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = LocalWorkspace::new(temp.path());
        (temp, ws)
    }

    #[test]
    fn resolves_relative_and_absolute_paths() {
        let ws = LocalWorkspace::new("/work/project");
        assert_eq!(ws.resolve("src/lib.rs"), PathBuf::from("/work/project/src/lib.rs"));
        assert_eq!(ws.resolve("./a/../b.txt"), PathBuf::from("/work/project/b.txt"));
        assert_eq!(ws.resolve("../other"), PathBuf::from("/work/other"));
        assert_eq!(ws.resolve("/etc/hosts"), PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn read_reports_missing_and_non_utf8_files() {
        let (temp, ws) = scratch();
        let err = ws.read("missing.txt").expect_err("missing");
        assert!(err.starts_with("File not found: "), "{err}");

        fs::write(temp.path().join("blob.bin"), [0xff, 0xfe, 0x00]).expect("write");
        let err = ws.read("blob.bin").expect_err("binary");
        assert!(err.starts_with("Unicode decode error: "), "{err}");

        fs::create_dir(temp.path().join("dir")).expect("mkdir");
        let err = ws.read("dir").expect_err("directory");
        assert!(err.starts_with("Unexpected error: "), "{err}");
    }

    #[test]
    fn replace_range_validates_before_touching_the_file() {
        let (_temp, ws) = scratch();
        assert_eq!(
            ws.replace_range("nope.txt", 3, 2, "x").expect_err("range"),
            lines::INVALID_RANGE
        );
        assert_eq!(
            ws.replace_range("nope.txt", 1, 1, "x").expect_err("missing"),
            FILE_DOES_NOT_EXIST
        );
    }

    #[test]
    fn replace_range_persists_splice() {
        let (temp, ws) = scratch();
        let path = temp.path().join("notes.txt");
        fs::write(&path, "one\ntwo\nthree\n").expect("write");
        ws.replace_range("notes.txt", 2, 2, "TWO\n").expect("replace");
        assert_eq!(fs::read_to_string(&path).expect("read"), "one\nTWO\nthree\n");
    }

    #[test]
    fn delete_removes_file_once() {
        let (temp, ws) = scratch();
        fs::write(temp.path().join("README.md"), "# hi\n").expect("write");
        ws.delete("README.md").expect("delete");
        assert!(!temp.path().join("README.md").exists());
        assert_eq!(ws.delete("README.md").expect_err("gone"), FILE_DOES_NOT_EXIST);
    }

    #[test]
    fn remove_range_and_insert_edit_in_place() {
        let (temp, ws) = scratch();
        let path = temp.path().join("list.txt");
        fs::write(&path, "a\nb\nc\nd\n").expect("write");

        ws.remove_range("list.txt", Some(2), Some(3)).expect("remove");
        assert_eq!(fs::read_to_string(&path).expect("read"), "a\nd\n");

        ws.insert("list.txt", "z\n", Some(2)).expect("insert");
        assert_eq!(fs::read_to_string(&path).expect("read"), "a\nz\nd\n");

        ws.remove_range("list.txt", None, None).expect("truncate");
        assert_eq!(fs::read_to_string(&path).expect("read"), "");

        assert_eq!(
            ws.remove_range("absent.txt", None, None).expect_err("missing"),
            FILE_DOES_NOT_EXIST
        );
    }

    #[test]
    fn insert_creates_missing_file_and_parents() {
        let (temp, ws) = scratch();
        ws.insert("new/dir/file.txt", "hello\n", None).expect("insert");
        assert_eq!(
            fs::read_to_string(temp.path().join("new/dir/file.txt")).expect("read"),
            "hello\n"
        );
    }
}
