//! Discovering specification files in a local directory tree.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::DiscoveryConfig;
use crate::document::Format;
use crate::result::{FileInfo, RepositoryInfo};

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "vendor", "target"];

/// A candidate specification file and its contents.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub info: FileInfo,
    pub bytes: Vec<u8>,
    pub format: Option<Format>,
}

fn build_set(patterns: &[String], case_insensitive: bool) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .literal_separator(false)
            .build()
            .map_err(|e| anyhow::anyhow!("invalid discovery pattern {:?}: {}", pattern, e))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Walk `root` for files whose names match the configured patterns.
///
/// Results are sorted by relative path. Files over the size limit and paths
/// matching an exclusion glob are skipped.
pub fn discover_files(root: &Path, config: &DiscoveryConfig) -> anyhow::Result<Vec<DiscoveredFile>> {
    let names = build_set(&config.patterns, true)?;
    let excluded = build_set(&config.excluded_paths, false)?;

    let mut candidates: Vec<(PathBuf, String)> = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && !SKIPPED_DIRS.contains(&name.as_ref())
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = relative_path(root, path);
        if !names.is_match(entry.file_name()) || excluded.is_match(&relative) {
            continue;
        }
        let size = entry.metadata()?.len();
        if size > config.max_file_size {
            debug!(path = %relative, size, "skipping oversized file");
            continue;
        }
        candidates.push((path.to_path_buf(), relative));
    }
    candidates.sort_by(|a, b| a.1.cmp(&b.1));

    let mut files = Vec::with_capacity(candidates.len());
    for (path, relative) in candidates {
        let bytes = std::fs::read(&path)?;
        let absolute = path.canonicalize().unwrap_or_else(|_| path.clone());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Format::from_extension);
        files.push(DiscoveredFile {
            info: FileInfo {
                name,
                path: relative,
                url: format!("file://{}", absolute.display()),
                size: bytes.len() as u64,
            },
            bytes,
            format,
        });
    }

    info!(root = %root.display(), count = files.len(), "discovered specification files");
    Ok(files)
}

/// Path relative to `root` with `/` separators.
fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Repository metadata for a local directory. Stars and forks are unknown.
pub fn repository_info(root: &Path) -> RepositoryInfo {
    let absolute = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| absolute.display().to_string());
    RepositoryInfo {
        full_name: name.clone(),
        name,
        url: format!("file://{}", absolute.display()),
        stars: None,
        forks: None,
    }
}
