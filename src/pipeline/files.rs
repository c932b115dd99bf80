//! File naming inside the output folder.
//!
//! `<draft_prefix><plan>-<letter>-draft.pdf` is what the renderer writes,
//! `<draft_prefix><plan>-<letter>.pdf` carries the letterhead, and the secure
//! pass swaps the prefix for the intermediate and secured copies.

use std::io;
use std::path::Path;

const DRAFT_MARKER: &str = "-draft.pdf";

/// Keep a database value safe to use inside a file name.
///
/// `-` is the field separator, so it is replaced along with path characters.
pub fn file_component(value: &str, fallback: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

pub fn draft_name(prefix: &str, plan_no: &str, letter_id: &str) -> String {
    format!(
        "{}{}-{}{}",
        prefix,
        file_component(plan_no, "0"),
        file_component(letter_id, "letter"),
        DRAFT_MARKER
    )
}

/// The draft name with its `-draft` marker removed.
pub fn produced_name(draft: &str) -> String {
    match draft.strip_suffix(DRAFT_MARKER) {
        Some(stem) => format!("{stem}.pdf"),
        None => draft.to_string(),
    }
}

/// Replace the first occurrence of `from` in `filename` with `to`.
pub fn swap_prefix(filename: &str, from: &str, to: &str) -> String {
    filename.replacen(from, to, 1)
}

/// Remove `path`; a file that is already gone is not an error.
pub async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// Best-effort removal of an intermediate file.
pub async fn discard(path: &Path) {
    if let Err(err) = remove_if_exists(path).await {
        log::warn!("Could not remove {}: {}", path.display(), err);
    }
}
