//! Multi-candidate resolution of `\input` and `\includegraphics` arguments.
//!
//! Resolution is split into a pure candidate generator and a lookup that
//! takes the existence test as a parameter, so the search order can be
//! tested without a filesystem.

use std::path::{Path, PathBuf};

use super::archive::normalize_path;

/// Extensions tried for `\includegraphics` arguments without one.
pub const GRAPHICS_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pdf", "eps"];

/// What kind of file a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// `\input` / `\include`: `.tex` first, then the bare path
    Tex,
    /// `\includegraphics`: each graphics extension, then the bare path
    Graphics,
}

impl RefKind {
    fn expand(self, candidate: PathBuf, out: &mut Vec<PathBuf>) {
        if candidate.extension().is_some() {
            out.push(candidate);
            return;
        }
        match self {
            RefKind::Tex => out.push(with_suffix(&candidate, "tex")),
            RefKind::Graphics => {
                for ext in GRAPHICS_EXTENSIONS {
                    out.push(with_suffix(&candidate, ext));
                }
            }
        }
        out.push(candidate);
    }
}

/// Append `.ext` without replacing anything after an existing dot.
fn with_suffix(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// Outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// First candidate that exists
    pub resolved: Option<PathBuf>,

    /// Every candidate in search order
    pub candidates: Vec<PathBuf>,
}

impl Resolution {
    /// The resolved path, or the first candidate when nothing exists.
    pub fn path_or_default(&self) -> Option<&Path> {
        self.resolved
            .as_deref()
            .or_else(|| self.candidates.first().map(PathBuf::as_path))
    }
}

/// Trim surrounding whitespace and one layer of quotes.
pub fn clean_ref(reference: &str) -> &str {
    reference
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
}

/// Replace spaces with underscores in every directory part of a reference.
///
/// Both `/` and `\` count as separators; the final component is kept as
/// written. A reference without separators is returned unchanged.
pub fn normalize_ref_dirs(reference: &str) -> String {
    let parts: Vec<&str> = reference
        .split(['/', '\\'])
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() <= 1 {
        return reference.to_string();
    }

    let (file, dirs) = match parts.split_last() {
        Some(split) => split,
        None => return reference.to_string(),
    };
    let mut out: Vec<String> = dirs.iter().map(|d| d.replace(' ', "_")).collect();
    out.push(file.to_string());

    let joined = out.join("/");
    if reference.starts_with('/') {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Ordered candidate paths for a reference.
///
/// Relative references are tried against `base_dir`, as written and then
/// space-normalized, then against `project_root` the same way when it
/// differs from `base_dir`. Each candidate is then expanded by extension.
pub fn candidate_paths(
    base_dir: &Path,
    project_root: &Path,
    reference: &str,
    kind: RefKind,
) -> Vec<PathBuf> {
    let reference = clean_ref(reference);
    if reference.is_empty() {
        return Vec::new();
    }

    let mut roots: Vec<PathBuf> = Vec::new();
    if Path::new(reference).is_absolute() {
        roots.push(PathBuf::from(reference));
    } else {
        let normalized = normalize_ref_dirs(reference);
        let mut variants = vec![reference.to_string()];
        if normalized != reference {
            variants.push(normalized);
        }

        let mut bases = vec![base_dir];
        if normalize_path(project_root) != normalize_path(base_dir) {
            bases.push(project_root);
        }

        for base in bases {
            for variant in &variants {
                roots.push(base.join(variant));
            }
        }
    }

    let mut candidates = Vec::new();
    for root in roots {
        kind.expand(normalize_path(&root), &mut candidates);
    }
    candidates
}

/// Return the first candidate accepted by `exists`.
pub fn resolve<F>(candidates: Vec<PathBuf>, exists: F) -> Resolution
where
    F: Fn(&Path) -> bool,
{
    let resolved = candidates.iter().find(|c| exists(c)).cloned();
    Resolution {
        resolved,
        candidates,
    }
}

/// Resolve a reference against the filesystem.
///
/// Only regular files count; a directory matching a candidate is skipped.
pub fn resolve_ref(base_dir: &Path, project_root: &Path, reference: &str, kind: RefKind) -> Resolution {
    let candidates = candidate_paths(base_dir, project_root, reference, kind);
    let resolution = resolve(candidates, |p| p.is_file());
    log::debug!(
        "Resolved {:?} to {:?} after {} candidates",
        reference,
        resolution.resolved,
        resolution.candidates.len()
    );
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_normalize_ref_dirs() {
        assert_eq!(normalize_ref_dirs("intro"), "intro");
        assert_eq!(normalize_ref_dirs("my sections/intro"), "my_sections/intro");
        assert_eq!(
            normalize_ref_dirs("a b\\c d\\file name"),
            "a_b/c_d/file name"
        );
        assert_eq!(normalize_ref_dirs("file name"), "file name");
    }

    #[test]
    fn test_clean_ref() {
        assert_eq!(clean_ref("  \"sections/intro\" "), "sections/intro");
        assert_eq!(clean_ref("'fig'"), "fig");
    }

    #[test]
    fn test_tex_candidate_order() {
        let got = candidate_paths(
            Path::new("/p/sub"),
            Path::new("/p"),
            "my dir/intro",
            RefKind::Tex,
        );
        assert_eq!(
            got,
            paths(&[
                "/p/sub/my dir/intro.tex",
                "/p/sub/my dir/intro",
                "/p/sub/my_dir/intro.tex",
                "/p/sub/my_dir/intro",
                "/p/my dir/intro.tex",
                "/p/my dir/intro",
                "/p/my_dir/intro.tex",
                "/p/my_dir/intro",
            ])
        );
    }

    #[test]
    fn test_same_base_and_root_not_duplicated() {
        let got = candidate_paths(Path::new("/p"), Path::new("/p/"), "intro.tex", RefKind::Tex);
        assert_eq!(got, paths(&["/p/intro.tex"]));
    }

    #[test]
    fn test_graphics_candidates() {
        let got = candidate_paths(Path::new("/p"), Path::new("/p"), "figs/plot", RefKind::Graphics);
        assert_eq!(
            got,
            paths(&[
                "/p/figs/plot.png",
                "/p/figs/plot.jpg",
                "/p/figs/plot.jpeg",
                "/p/figs/plot.pdf",
                "/p/figs/plot.eps",
                "/p/figs/plot",
            ])
        );
    }

    #[test]
    fn test_absolute_and_parent_refs() {
        let got = candidate_paths(Path::new("/p/a"), Path::new("/p"), "/abs/x.tex", RefKind::Tex);
        assert_eq!(got, paths(&["/abs/x.tex"]));

        let got = candidate_paths(Path::new("/p/a"), Path::new("/p/a"), "../b.tex", RefKind::Tex);
        assert_eq!(got, paths(&["/p/b.tex"]));
    }

    #[test]
    fn test_resolve_first_existing_wins() {
        let candidates = candidate_paths(Path::new("/p/sub"), Path::new("/p"), "intro", RefKind::Tex);
        let on_disk: HashSet<PathBuf> = paths(&["/p/intro.tex", "/p/sub/intro"]).into_iter().collect();

        let resolution = resolve(candidates, |p| on_disk.contains(p));
        assert_eq!(resolution.resolved, Some(PathBuf::from("/p/sub/intro")));
    }

    #[test]
    fn test_resolve_falls_back_to_first_candidate() {
        let candidates = candidate_paths(Path::new("/p"), Path::new("/p"), "missing", RefKind::Tex);
        let resolution = resolve(candidates, |_| false);
        assert_eq!(resolution.resolved, None);
        assert_eq!(
            resolution.path_or_default(),
            Some(Path::new("/p/missing.tex"))
        );
    }

    #[test]
    fn test_resolve_ref_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("sec/intro")).unwrap();
        std::fs::write(root.join("intro.tex"), "root intro").unwrap();

        let resolution = resolve_ref(&root.join("sec"), root, "intro", RefKind::Tex);
        assert_eq!(resolution.resolved, Some(root.join("intro.tex")));
    }

    #[test]
    fn test_empty_reference() {
        assert!(candidate_paths(Path::new("/p"), Path::new("/p"), "  ", RefKind::Tex).is_empty());
        assert_eq!(resolve(Vec::new(), |_| true).path_or_default(), None);
    }
}
