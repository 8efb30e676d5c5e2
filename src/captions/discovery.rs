use std::path::{Path, PathBuf};

/// File extension of the caption container the tool writes
pub const CONTAINER_EXTENSION: &str = "vtt";

/// First-line signature of a WebVTT container
const MAGIC: &str = "WEBVTT";

/// Locate the caption container written into `dir`.
///
/// Candidates are tried in order: `<id>.<lang>.vtt` for each language of a
/// comma-separated tag, then `<id>.vtt`, then any `.vtt` file (sorted by
/// name) whose content carries the WebVTT signature or a cue timing arrow.
pub fn find_caption_file(dir: &Path, video_id: &str, language: &str) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = language
        .split(',')
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(|lang| dir.join(format!("{}.{}.{}", video_id, lang, CONTAINER_EXTENSION)))
        .collect();
    candidates.push(dir.join(format!("{}.{}", video_id, CONTAINER_EXTENSION)));

    if let Some(found) = candidates.into_iter().find(|path| path.is_file()) {
        tracing::debug!("Found caption file by name: {}", found.display());
        return Some(found);
    }

    let found = scan_directory(dir);
    if let Some(path) = &found {
        tracing::debug!("Found caption file by content: {}", path.display());
    }
    found
}

fn scan_directory(dir: &Path) -> Option<PathBuf> {
    let entries = match fs_err::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot list {}: {}", dir.display(), e);
            return None;
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(CONTAINER_EXTENSION))
        })
        .collect();
    files.sort();

    files.into_iter().find(|path| looks_like_container(path))
}

fn looks_like_container(path: &Path) -> bool {
    match fs_err::read_to_string(path) {
        Ok(content) => content.contains(MAGIC) || content.contains("-->"),
        Err(e) => {
            tracing::debug!("Skipping unreadable candidate: {}", e);
            false
        }
    }
}
