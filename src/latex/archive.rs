//! Source archive extraction and directory-name normalization.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use zip::ZipArchive;

use crate::error::Result;

/// Extract every archive member under `dest`.
///
/// Members whose normalized destination is not strictly inside `dest`
/// are skipped with a warning. Extraction is member-by-member: an error
/// part-way through leaves the earlier members on disk.
///
/// Returns the paths of the extracted files in archive order.
pub fn safe_extract(archive_path: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dest)?;
    let dest = dest.canonicalize()?;

    let mut archive = ZipArchive::new(File::open(archive_path)?)?;
    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut member = archive.by_index(i)?;
        let name = member.name().replace('\\', "/");
        if name.is_empty() {
            continue;
        }

        let target = match contained_target(&dest, &name) {
            Some(target) => target,
            None => {
                log::warn!("Rejected archive member escaping the extraction root: {}", name);
                continue;
            }
        };

        if name.ends_with('/') {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut member, &mut out)?;
        extracted.push(target);
    }

    log::debug!(
        "Extracted {} files from {} into {}",
        extracted.len(),
        archive_path.display(),
        dest.display()
    );
    Ok(extracted)
}

/// Destination of a member, or `None` if it would land outside `dest`.
fn contained_target(dest: &Path, name: &str) -> Option<PathBuf> {
    let target = normalize_path(&dest.join(name));
    if target.starts_with(dest) && target != dest {
        Some(target)
    } else {
        None
    }
}

/// Lexically normalize a path, resolving `.` and `..` without touching disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Rename every directory under `root` whose name contains a space.
///
/// Works bottom-up so renaming a parent never invalidates a pending
/// child path. A rename whose target already exists is skipped.
pub fn normalize_dir_names(root: &Path) -> Result<()> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();

    for dir in dirs {
        normalize_dir_names(&dir)?;

        let name = match dir.file_name().and_then(|n| n.to_str()) {
            Some(name) if name.contains(' ') => name,
            _ => continue,
        };
        let renamed = dir.with_file_name(name.replace(' ', "_"));
        if renamed.exists() {
            log::warn!(
                "Not renaming {}: {} already exists",
                dir.display(),
                renamed.display()
            );
            continue;
        }
        fs::rename(&dir, &renamed)?;
        log::debug!("Renamed {} -> {}", dir.display(), renamed.display());
    }

    Ok(())
}
