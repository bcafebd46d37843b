//! Analysis export discovery
//!
//! When no input path is given, the conventional export locations are probed
//! in a fixed order and the first existing file wins. A directory scan can
//! additionally search a project tree for exports while respecting
//! `.gitignore` patterns.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Return the first candidate (relative to `root`) that is an existing file
///
/// # Example
/// ```no_run
/// use depgraph_viz_core::{config::DiscoveryConfig, discovery};
///
/// let config = DiscoveryConfig::default();
/// if let Some(path) = discovery::find_conventional(std::path::Path::new("."), &config.candidates) {
///     println!("Using {}", path.display());
/// }
/// ```
pub fn find_conventional(root: &Path, candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|candidate| root.join(candidate))
        .find(|path| path.is_file())
}

/// Discover files matching glob patterns in a project directory
///
/// # Arguments
/// * `root` - Root directory to search
/// * `patterns` - Glob patterns (e.g., &["**/*_visualization.json"])
///
/// # Returns
/// Sorted absolute paths of matching files, excluding those matched by .gitignore
pub fn discover_files(root: &Path, patterns: &[String]) -> Vec<PathBuf> {
    // Canonicalize root upfront to ensure all returned paths are absolute
    let canonical_root = match root.canonicalize() {
        Ok(path) => path,
        Err(_) => return Vec::new(),
    };

    let glob_matcher = match build_glob_matcher(patterns) {
        Ok(matcher) => matcher,
        Err(err) => {
            tracing::warn!(error = %err, "invalid scan pattern");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    for result in build_walker(&canonical_root) {
        match result {
            Ok(entry) => {
                if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                    continue;
                }
                let matched = entry
                    .path()
                    .strip_prefix(&canonical_root)
                    .is_ok_and(|rel| glob_matcher.is_match(rel));
                if matched {
                    files.push(entry.into_path());
                }
            }
            Err(err) => {
                // Keep walking; one unreadable entry should not hide the rest
                tracing::warn!(error = %err, "error walking directory");
            }
        }
    }

    files.sort();
    files
}

/// Resolve the input document path
///
/// Probes `candidates` under `root` first, then (if `scan` is set) the first
/// scan match in sorted order.
pub fn locate_input(
    root: &Path,
    candidates: &[PathBuf],
    scan: Option<(&Path, &[String])>,
) -> Option<PathBuf> {
    if let Some(path) = find_conventional(root, candidates) {
        return Some(path);
    }
    let (dir, patterns) = scan?;
    discover_files(dir, patterns).into_iter().next()
}

/// Build a glob matcher from the provided patterns
fn build_glob_matcher(patterns: &[String]) -> Result<globset::GlobSet, globset::Error> {
    use globset::GlobSetBuilder;

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(globset::Glob::new(pattern)?);
    }
    builder.build()
}

/// Build a WalkBuilder with proper ignore configuration
fn build_walker(root: &Path) -> ignore::Walk {
    let mut builder = WalkBuilder::new(root);
    builder
        .git_ignore(true)
        .git_exclude(true)
        .hidden(false)
        .parents(true);

    // WalkBuilder only honors .gitignore inside a git repository unless it is
    // added explicitly
    let gitignore_path = root.join(".gitignore");
    if gitignore_path.exists() {
        if let Some(err) = builder.add_ignore(gitignore_path) {
            tracing::debug!(error = %err, "could not read .gitignore");
        }
    }

    builder.build()
}
