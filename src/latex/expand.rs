//! Entry-file discovery and recursive `\input`/`\include` expansion.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::resolve::{resolve_ref, RefKind};
use super::source::{read_text_lossy, strip_comments};
use crate::error::{Error, Result};
use crate::model::GraphicsReference;

fn document_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\begin\s*\{document\}").expect("valid regex"))
}

// The suffix group catches \includegraphics, \includeonly and friends,
// which must be left alone.
fn include_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\(input|include)([A-Za-z]*)\s*(?:\{([^}]+)\}|([^\s%{}]+))")
            .expect("valid regex")
    })
}

fn graphics_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\includegraphics(?:\s*\[[^\]]*\])?\s*\{([^}]+)\}").expect("valid regex")
    })
}

/// Recursively collect every `.tex` file under `root`, sorted.
pub fn discover_tex_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    collect_tex_files(root, &mut found)?;
    found.sort();
    Ok(found)
}

fn collect_tex_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_tex_files(&path, out)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("tex"))
            .unwrap_or(false)
        {
            out.push(path);
        }
    }
    Ok(())
}

/// Pick the entry file among `tex_files`.
///
/// Candidates are the files containing `\begin{document}`; the one with
/// the shortest path string (counted in chars) wins, ties broken
/// lexicographically.
pub fn find_main_tex(tex_files: &[PathBuf]) -> Option<PathBuf> {
    tex_files
        .iter()
        .filter(|path| match read_text_lossy(path) {
            Ok(text) => document_marker().is_match(&text),
            Err(e) => {
                log::warn!("Cannot read {}: {}", path.display(), e);
                false
            }
        })
        .min_by(|a, b| {
            let (a, b) = (a.to_string_lossy(), b.to_string_lossy());
            a.chars()
                .count()
                .cmp(&b.chars().count())
                .then_with(|| a.cmp(&b))
        })
        .cloned()
}

/// Result of expanding an entry file.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    /// The flattened, comment-free text
    pub text: String,

    /// Graphics references in the order their files were visited
    pub graphics: Vec<GraphicsReference>,
}

/// Flattens a LaTeX project rooted at one directory.
///
/// Each file is expanded at most once per expander; a repeated
/// reference, including a cyclic one, expands to nothing.
pub struct Expander {
    project_root: PathBuf,
    visited: HashSet<PathBuf>,
    graphics: Vec<GraphicsReference>,
}

impl Expander {
    /// Create an expander for a project root.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            visited: HashSet::new(),
            graphics: Vec::new(),
        }
    }

    /// Expand `entry` and everything it includes.
    pub fn run(mut self, entry: &Path) -> Result<Expansion> {
        let text = self.expand_file(entry)?;
        Ok(Expansion {
            text,
            graphics: self.graphics,
        })
    }

    /// Expand one file, or return an empty string if already visited.
    fn expand_file(&mut self, path: &Path) -> Result<String> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if !self.visited.insert(key) {
            log::debug!("Skipping already expanded {}", path.display());
            return Ok(String::new());
        }

        let base_dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
        let text = strip_comments(&read_text_lossy(path)?);

        self.collect_graphics(&text, &base_dir);

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in include_directive().captures_iter(&text) {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            if caps.get(2).map_or(false, |m| !m.as_str().is_empty()) {
                continue;
            }

            out.push_str(&text[last..whole.start()]);
            out.push_str(&self.expand_directive(&caps, &base_dir)?);
            last = whole.end();
        }
        out.push_str(&text[last..]);

        Ok(out)
    }

    fn expand_directive(&mut self, caps: &Captures<'_>, base_dir: &Path) -> Result<String> {
        let reference = caps
            .get(3)
            .or_else(|| caps.get(4))
            .map(|m| m.as_str())
            .unwrap_or("");

        let resolution = resolve_ref(base_dir, &self.project_root, reference, RefKind::Tex);
        match resolution.resolved {
            Some(target) if target.is_file() => {
                let nested = self.expand_file(&target)?;
                Ok(format!("\n{}\n", nested))
            }
            _ => {
                log::warn!("Missing input: {}", reference);
                Ok(format!("\n% [Missing input: {}]\n", reference))
            }
        }
    }

    fn collect_graphics(&mut self, text: &str, base_dir: &Path) {
        for caps in graphics_directive().captures_iter(text) {
            let raw = match caps.get(1) {
                Some(m) => m.as_str().trim(),
                None => continue,
            };
            let resolution = resolve_ref(base_dir, &self.project_root, raw, RefKind::Graphics);
            let resolved_path = resolution
                .resolved
                .map(|p| p.canonicalize().unwrap_or(p));
            if resolved_path.is_none() {
                log::debug!("Unresolved graphics reference: {}", raw);
            }
            self.graphics.push(GraphicsReference {
                path: raw.to_string(),
                resolved_path,
            });
        }
    }
}

/// Locate the entry file under `root` and flatten it.
pub fn expand_project(root: &Path, tex_files: &[PathBuf]) -> Result<(PathBuf, Expansion)> {
    let main_tex = find_main_tex(tex_files).ok_or_else(|| Error::NoEntryDocument(root.to_path_buf()))?;
    log::info!("Entry document: {}", main_tex.display());
    let expansion = Expander::new(root).run(&main_tex)?;
    Ok((main_tex, expansion))
}
