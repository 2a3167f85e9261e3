//! Location and creation of per-document process directories.

use std::fs;
use std::path::{Path, PathBuf};

use crate::detect::DocumentKind;
use crate::error::Result;

/// Subdirectory of the output root holding all process directories.
pub const PROCESS_ROOT: &str = "process";

/// Compute the process directory for a document without touching disk.
///
/// The directory name is the filename minus its extension, with spaces
/// replaced by underscores, followed by `__pdf` or `__latex`.
pub fn process_dir_for(root: &Path, filename: &str, kind: DocumentKind) -> PathBuf {
    let name = Path::new(filename)
        .file_name()
        .map(Path::new)
        .and_then(Path::file_stem)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());

    root.join(PROCESS_ROOT)
        .join(format!("{}__{}", name.replace(' ', "_"), kind.dir_suffix()))
}

/// Create (or reuse) the process directory for an input file.
///
/// The root is `output_root` when given, else the input's parent
/// directory. Returns the absolute path.
pub fn create_process_dir(
    input: &Path,
    filename: &str,
    kind: DocumentKind,
    output_root: Option<&Path>,
) -> Result<PathBuf> {
    let root = match output_root {
        Some(root) => root.to_path_buf(),
        None => input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let dir = process_dir_for(&root, filename, kind);
    fs::create_dir_all(&dir)?;
    let dir = dir.canonicalize()?;
    log::debug!("Using process directory {}", dir.display());
    Ok(dir)
}
