//! Box-drawing directory trees for `list_dir`.

use std::fs;
use std::path::Path;

/// Render `dir` as a tree headed by its basename.
///
/// Errors carry the text to display in place of the tree.
pub fn render(dir: &Path) -> Result<String, String> {
    if !dir.exists() {
        return Err("[path does not exist]\n".to_string());
    }
    if !dir.is_dir() {
        return Err("[not a directory]\n".to_string());
    }
    let header = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());
    let mut out = format!("{header}\n");
    render_children(dir, "", &mut out);
    Ok(out)
}

fn render_children(dir: &Path, prefix: &str, out: &mut String) {
    let mut names: Vec<String> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => {
            out.push_str(prefix);
            out.push_str("[unreadable]\n");
            return;
        }
    };
    names.sort();

    let count = names.len();
    for (idx, name) in names.iter().enumerate() {
        let last = idx + 1 == count;
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(name);
        out.push('\n');

        let child = dir.join(name);
        // Symlinked directories are shown but not followed.
        let is_real_dir = fs::symlink_metadata(&child).is_ok_and(|meta| meta.is_dir());
        if is_real_dir {
            let extension = if last { "    " } else { "│   " };
            render_children(&child, &format!("{prefix}{extension}"), out);
        }
    }
}
