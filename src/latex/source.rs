//! Reading LaTeX source text.

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Read a file as text, falling back to Latin-1 when it is not UTF-8.
///
/// Latin-1 maps every byte to a char, so the fallback never fails.
pub fn read_text_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("{} is not UTF-8, decoding as Latin-1", path.display());
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    })
}

/// Remove `%` comments from every line.
///
/// A `%` directly preceded by a backslash is literal. Lines are split on
/// `\n` and rejoined with `\n`, trailing empty lines included, so
/// stripping twice gives the same result as stripping once. A `\r` before
/// the newline is dropped.
pub fn strip_comments(text: &str) -> String {
    text.split('\n')
        .map(|line| strip_line_comment(line.strip_suffix('\r').unwrap_or(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_line_comment(line: &str) -> &str {
    let mut prev = None;
    for (i, c) in line.char_indices() {
        if c == '%' && prev != Some('\\') {
            return &line[..i];
        }
        prev = Some(c);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments() {
        let text = "a % comment\n% whole line\nb\\% kept % dropped\nc";
        assert_eq!(strip_comments(text), "a \n\nb\\% kept \nc");
    }

    #[test]
    fn test_strip_comments_idempotent() {
        let samples = [
            "x % y\r\nz",
            "\\%\\%% gone",
            "no comments at all\n",
            "%%%\n\n%",
            "double backslash \\\\% kept",
            "a\n\n",
            "body\n% c",
            "trailing\r\n",
        ];
        for text in samples {
            let once = strip_comments(text);
            assert_eq!(strip_comments(&once), once, "input: {:?}", text);
        }
    }

    #[test]
    fn test_trailing_newlines_preserved() {
        assert_eq!(strip_comments("a\n\n"), "a\n\n");
        assert_eq!(strip_comments("body\n% c"), "body\n");
        assert_eq!(strip_comments("x % y\r\nz\r\n"), "x \nz\n");
    }

    #[test]
    fn test_double_backslash_percent_is_escaped_form() {
        // Only the immediately preceding char is inspected
        assert_eq!(strip_comments("a\\\\%b"), "a\\\\%b");
    }

    #[test]
    fn test_read_text_lossy_latin1() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin.tex");
        std::fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();
        assert_eq!(read_text_lossy(&path).unwrap(), "café");
    }

    #[test]
    fn test_read_text_lossy_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("u.tex");
        std::fs::write(&path, "Ünïcode").unwrap();
        assert_eq!(read_text_lossy(&path).unwrap(), "Ünïcode");
    }
}
