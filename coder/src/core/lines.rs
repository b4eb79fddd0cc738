//! Pure line-range text transforms.
//!
//! Lines are 1-indexed and inclusive. A "line" keeps its trailing newline, so
//! splitting and re-joining any text reproduces it byte-for-byte.

/// Error message for a range that fails `1 <= start <= end`.
pub const INVALID_RANGE: &str = "Invalid line range";

/// Split `text` into lines that keep their terminators.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Replace lines `start..=end` of `content` with `replacement`, verbatim.
///
/// `end` is clamped to the number of lines. A `start` past the end of the
/// file appends the replacement.
pub fn replace_range(
    content: &str,
    start: i64,
    end: i64,
    replacement: &str,
) -> Result<String, String> {
    if start <= 0 || end <= 0 || end < start {
        return Err(INVALID_RANGE.to_string());
    }
    let lines = split_lines(content);
    let prefix_end = to_index(start - 1).min(lines.len());
    let suffix_start = to_index(end).min(lines.len()).max(prefix_end);

    let mut out = String::with_capacity(content.len() + replacement.len());
    out.extend(lines[..prefix_end].iter().copied());
    out.push_str(replacement);
    out.extend(lines[suffix_start..].iter().copied());
    Ok(out)
}

/// Remove lines `start..=end` of `content`.
///
/// With no bounds at all the result is empty. A missing `start` means line 1
/// and a missing `end` means the last line.
pub fn remove_range(content: &str, start: Option<i64>, end: Option<i64>) -> String {
    if start.is_none() && end.is_none() {
        return String::new();
    }
    let lines = split_lines(content);
    let s = start.unwrap_or(1).max(1);
    let e = end.unwrap_or(lines.len() as i64).max(s);
    lines
        .iter()
        .enumerate()
        .filter(|(idx, _)| {
            let n = *idx as i64 + 1;
            n < s || n > e
        })
        .map(|(_, line)| *line)
        .collect()
}

/// Insert `text` before line `line` of `content`, or append when `line` is `None`.
///
/// Line numbers past either end are clamped.
pub fn insert_at(content: &str, text: &str, line: Option<i64>) -> String {
    let lines = split_lines(content);
    let idx = match line {
        None => lines.len(),
        Some(n) => to_index(n - 1).min(lines.len()),
    };
    let mut out = String::with_capacity(content.len() + text.len());
    out.extend(lines[..idx].iter().copied());
    out.push_str(text);
    out.extend(lines[idx..].iter().copied());
    out
}

fn to_index(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}
