use globset::{Glob, GlobMatcher};
use ignore::{DirEntry, WalkBuilder};
use itertools::Itertools;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result files at or below this size are leftovers of an aborted run
pub const MIN_CONTENT_BYTES: u64 = 300;

/// Return the latest `{prefix}_*.csv` file in `directory`.
///
/// "Latest" is decided by file name, not by filesystem timestamps: producers
/// are expected to suffix their files so that lexicographic order matches
/// chronological order (e.g. `summary_20250101_120000.csv`).
pub fn find_latest(directory: &Path, prefix: &str) -> Option<PathBuf> {
    find_latest_with(directory, prefix, "csv", MIN_CONTENT_BYTES)
}

/// Same as [`find_latest`] with an explicit extension and size threshold.
///
/// Candidates are scanned from the greatest file name backwards and the first
/// one larger than `threshold` bytes wins. If every candidate is undersized the
/// greatest one is returned anyway; `None` only means there was no candidate.
pub fn find_latest_with(
    directory: &Path,
    prefix: &str,
    extension: &str,
    threshold: u64,
) -> Option<PathBuf> {
    let matcher = match compile_matcher(prefix, extension) {
        Ok(matcher) => matcher,
        Err(error) => {
            warn!(prefix, extension, error = %error, "Invalid result file pattern");
            return None;
        }
    };

    let candidates = candidates(directory, &matcher);

    for path in candidates.iter().rev() {
        match path.metadata() {
            Ok(metadata) if metadata.len() > threshold => {
                debug!(path = ?path, size = metadata.len(), "Resolved latest result file");

                return Some(path.clone());
            }
            Ok(metadata) => {
                debug!(path = ?path, size = metadata.len(), "Skipped undersized result file")
            }
            Err(error) => warn!(path = ?path, error = %error, "Failed to read file metadata"),
        }
    }

    let fallback = candidates.last().cloned();

    if let Some(ref path) = fallback {
        warn!(
            path = ?path,
            "No {prefix} file exceeds {threshold} bytes, falling back to the last candidate"
        );
    }

    fallback
}

fn compile_matcher(prefix: &str, extension: &str) -> Result<GlobMatcher, globset::Error> {
    Glob::new(&format!("{prefix}_*.{extension}")).map(|glob| glob.compile_matcher())
}

/// regular files directly inside `directory` matching `matcher`, sorted by name
///
/// Links are followed, so a symlinked result counts as the file it points to.
fn candidates(directory: &Path, matcher: &GlobMatcher) -> Vec<PathBuf> {
    WalkBuilder::new(directory)
        .standard_filters(false)
        .follow_links(true)
        .max_depth(Some(1))
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                debug!(directory = ?directory, error = %error, "Skipped unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().map_or(false, |kind| kind.is_file()))
        .filter(|entry| matcher.is_match(entry.file_name()))
        .map(DirEntry::into_path)
        .sorted_by(|a, b| a.file_name().cmp(&b.file_name()))
        .collect_vec()
}
