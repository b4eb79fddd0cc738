//! Regex search over the text files of a working directory.

use std::fs;
use std::path::Path;

use glob::Pattern;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::core::types::GrepMatch;

const SKIPPED_DIRS: [&str; 4] = [".git", "node_modules", "venv", "__pycache__"];

const TEXT_EXTENSIONS: [&str; 17] = [
    "py", "md", "txt", "json", "yaml", "yml", "toml", "ini", "cfg", "js", "ts", "tsx", "jsx",
    "css", "scss", "html", "sh",
];

/// Parameters of a `grep_search` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Regular expression, matched per line.
    pub query: String,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    /// Glob the relative path must match.
    #[serde(default)]
    pub include_pattern: Option<String>,
    /// Glob that excludes a relative path.
    #[serde(default)]
    pub exclude_pattern: Option<String>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// Search every text file under `root`, in walk order then line order.
pub fn grep(root: &Path, query: &SearchQuery) -> Result<Vec<GrepMatch>, String> {
    let regex = RegexBuilder::new(&query.query)
        .case_insensitive(!query.case_sensitive.unwrap_or(false))
        .build()
        .map_err(|err| format!("Invalid regex: {err}"))?;
    let include = compile_glob(query.include_pattern.as_deref())?;
    let exclude = compile_glob(query.exclude_pattern.as_deref())?;

    let mut matches = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(err = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative.to_string_lossy();
        if let Some(include) = &include
            && !include.matches(&relative)
        {
            continue;
        }
        if let Some(exclude) = &exclude
            && exclude.matches(&relative)
        {
            continue;
        }
        if !is_text_file(entry.path()) {
            continue;
        }
        let Ok(bytes) = fs::read(entry.path()) else {
            warn!(path = %entry.path().display(), "skipping unreadable file");
            continue;
        };
        let text = String::from_utf8_lossy(&bytes);
        for (idx, line) in text.lines().enumerate() {
            if regex.is_match(line) {
                matches.push(GrepMatch {
                    file: relative.to_string(),
                    line: idx + 1,
                    content: line.to_string(),
                });
            }
        }
    }

    debug!(matches = matches.len(), "search finished");
    Ok(matches)
}

fn compile_glob(pattern: Option<&str>) -> Result<Option<Pattern>, String> {
    match pattern.map(str::trim).filter(|p| !p.is_empty()) {
        Some(pattern) => Pattern::new(pattern)
            .map(Some)
            .map_err(|err| format!("Invalid pattern {pattern:?}: {err}")),
        None => Ok(None),
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn is_text_file(path: &Path) -> bool {
    match path.extension() {
        None => true,
        Some(ext) => {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            TEXT_EXTENSIONS.contains(&ext.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> tempfile::TempDir {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("docs")).expect("mkdir");
        fs::create_dir_all(root.join("node_modules/pkg")).expect("mkdir");
        fs::create_dir_all(root.join(".git")).expect("mkdir");
        fs::write(root.join("README.md"), "# Design Doc\nsee docs\n").expect("write");
        fs::write(root.join("docs/guide.md"), "intro\nDESIGN DOC here\n").expect("write");
        fs::write(root.join("docs/notes.txt"), "design doc draft\n").expect("write");
        fs::write(root.join("Makefile"), "design doc:\n\techo\n").expect("write");
        fs::write(root.join("main.rs"), "// design doc\n").expect("write");
        fs::write(root.join("node_modules/pkg/index.js"), "design doc\n").expect("write");
        fs::write(root.join(".git/config"), "design doc\n").expect("write");
        temp
    }

    fn files(matches: &[GrepMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.file.as_str()).collect()
    }

    #[test]
    fn case_insensitive_by_default_and_skips_vendor_dirs() {
        let temp = fixture();
        let matches = grep(temp.path(), &SearchQuery::new("design doc")).expect("grep");
        // `.rs` is not a scanned extension; files without one are.
        assert_eq!(
            files(&matches),
            vec!["Makefile", "README.md", "docs/guide.md", "docs/notes.txt"]
        );
        assert_eq!(matches[1].line, 1);
        assert_eq!(matches[1].content, "# Design Doc");
        assert_eq!(matches[2].line, 2);
    }

    #[test]
    fn case_sensitive_and_globs_filter_results() {
        let temp = fixture();
        let query = SearchQuery {
            query: "Design Doc".to_string(),
            case_sensitive: Some(true),
            include_pattern: Some("*.md".to_string()),
            exclude_pattern: None,
        };
        let matches = grep(temp.path(), &query).expect("grep");
        assert_eq!(files(&matches), vec!["README.md"]);

        let query = SearchQuery {
            include_pattern: Some("*.md".to_string()),
            exclude_pattern: Some("docs/*".to_string()),
            ..SearchQuery::new("doc")
        };
        let matches = grep(temp.path(), &query).expect("grep");
        // Both README lines mention "doc"; nothing under docs/ survives.
        assert_eq!(files(&matches), vec!["README.md", "README.md"]);
        assert_eq!(matches[1].content, "see docs");
    }

    #[test]
    fn crlf_line_endings_are_not_part_of_the_content() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("notes.txt"), "first\r\nsecond match\r\n").expect("write");
        let matches = grep(temp.path(), &SearchQuery::new("match")).expect("grep");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line, 2);
        assert_eq!(matches[0].content, "second match");
    }

    #[test]
    fn invalid_regex_is_reported() {
        let temp = fixture();
        let err = grep(temp.path(), &SearchQuery::new("(unclosed")).expect_err("regex");
        assert!(err.starts_with("Invalid regex: "), "{err}");
    }

    #[test]
    fn params_deserialize_with_optional_fields() {
        let query: SearchQuery =
            serde_json::from_value(serde_json::json!({"query": "fn main"})).expect("params");
        assert_eq!(query, SearchQuery::new("fn main"));
    }
}
