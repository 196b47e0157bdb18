//! Content Extraction
//!
//! Turns a course resource into something the generation pipeline can send
//! to a provider. Text-bearing formats are read locally and inlined into
//! the prompt, truncated to a fixed character cap; everything else is
//! staged as a temporary copy for remote upload. Temporary copies are
//! backed by [`tempfile::NamedTempFile`], so they are removed when the
//! unit is dropped, on success and failure alike.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::constants::extract::{INLINE_EXTENSIONS, MAX_INLINE_CHARS};
use crate::types::Result;

/// A course resource pointing at a file on local storage.
#[derive(Debug, Clone)]
pub struct ResourceRef {
    pub id: u64,
    pub path: PathBuf,
    pub display_name: String,
}

impl ResourceRef {
    pub fn new(id: u64, path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            display_name: display_name.into(),
        }
    }
}

/// How the extracted content reaches the provider.
#[derive(Debug)]
pub enum ContentKind {
    /// Decoded text, already truncated, inlined into the prompt
    InlineText(String),
    /// Temporary copy destined for the provider file store. Deleted from
    /// disk when dropped.
    RemoteUpload(tempfile::NamedTempFile),
}

/// One extracted unit of content, ready for prompt building or upload.
#[derive(Debug)]
pub struct ContentUnit {
    pub resource_id: u64,
    pub display_name: String,
    pub extension: String,
    pub kind: ContentKind,
}

impl ContentUnit {
    /// Path of the staged temporary copy, if this unit uploads.
    pub fn upload_path(&self) -> Option<&Path> {
        match &self.kind {
            ContentKind::RemoteUpload(file) => Some(file.path()),
            ContentKind::InlineText(_) => None,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.kind, ContentKind::InlineText(_))
    }
}

/// Whether files with this extension are inlined rather than uploaded.
/// Case-insensitive.
pub fn is_inline_extension(extension: &str) -> bool {
    let lower = extension.to_ascii_lowercase();
    INLINE_EXTENSIONS.contains(&lower.as_str())
}

/// Truncate to at most `max_chars` characters, respecting UTF-8
/// boundaries. Byte-based `String::truncate` would panic mid-character.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

/// Extract one resource. Returns `Ok(None)` when the source file is
/// missing so the caller can skip the resource without aborting the batch.
pub fn extract(resource: &ResourceRef) -> Result<Option<ContentUnit>> {
    if !resource.path.exists() {
        warn!(
            resource_id = resource.id,
            path = %resource.path.display(),
            "Resource file missing, skipping"
        );
        return Ok(None);
    }

    let extension = resource
        .path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    // Work on a private temporary copy so the original is never held open
    // or mutated while the pipeline runs.
    let mut staged = tempfile::NamedTempFile::new()?;
    let bytes = std::fs::read(&resource.path)?;
    staged.write_all(&bytes)?;
    staged.flush()?;

    let kind = if is_inline_extension(&extension) {
        let text = String::from_utf8_lossy(&bytes);
        let truncated = truncate_chars(&text, MAX_INLINE_CHARS);
        debug!(
            resource_id = resource.id,
            chars = truncated.chars().count(),
            "Inlining resource text"
        );
        // The staged copy drops here and is cleaned up immediately
        ContentKind::InlineText(truncated.to_string())
    } else {
        debug!(
            resource_id = resource.id,
            staged = %staged.path().display(),
            "Staged resource copy for upload"
        );
        ContentKind::RemoteUpload(staged)
    };

    Ok(Some(ContentUnit {
        resource_id: resource.id,
        display_name: resource.display_name.clone(),
        extension,
        kind,
    }))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_resource(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> ResourceRef {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        ResourceRef::new(1, path, name)
    }

    #[test]
    fn test_inline_extension_matching() {
        assert!(is_inline_extension("txt"));
        assert!(is_inline_extension("PDF"));
        assert!(is_inline_extension("htm"));
        assert!(!is_inline_extension("png"));
        assert!(!is_inline_extension("mp4"));
        assert!(!is_inline_extension(""));
    }

    #[test]
    fn test_missing_file_is_skipped_not_fatal() {
        let resource = ResourceRef::new(9, "/nonexistent/lecture.txt", "lecture.txt");
        assert!(extract(&resource).unwrap().is_none());
    }

    #[test]
    fn test_text_is_inlined() {
        let dir = tempfile::tempdir().unwrap();
        let resource = write_resource(&dir, "notes.txt", b"photosynthesis happens in leaves");

        let unit = extract(&resource).unwrap().unwrap();
        assert!(unit.is_inline());
        assert_eq!(unit.extension, "txt");
        match unit.kind {
            ContentKind::InlineText(text) => {
                assert_eq!(text, "photosynthesis happens in leaves")
            }
            ContentKind::RemoteUpload(_) => panic!("expected inline text"),
        }
    }

    #[test]
    fn test_inline_text_truncated_to_cap() {
        let dir = tempfile::tempdir().unwrap();
        let long = "x".repeat(MAX_INLINE_CHARS + 500);
        let resource = write_resource(&dir, "big.txt", long.as_bytes());

        let unit = extract(&resource).unwrap().unwrap();
        match unit.kind {
            ContentKind::InlineText(text) => {
                assert_eq!(text.chars().count(), MAX_INLINE_CHARS)
            }
            ContentKind::RemoteUpload(_) => panic!("expected inline text"),
        }
    }

    #[test]
    fn test_truncate_respects_multibyte_boundaries() {
        let text = "ü".repeat(10);
        assert_eq!(truncate_chars(&text, 3), "üüü");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn test_binary_file_staged_for_upload() {
        let dir = tempfile::tempdir().unwrap();
        let resource = write_resource(&dir, "diagram.png", &[0x89, 0x50, 0x4e, 0x47]);

        let unit = extract(&resource).unwrap().unwrap();
        assert!(!unit.is_inline());
        let staged_path = unit.upload_path().unwrap().to_path_buf();
        assert!(staged_path.exists());
        assert_eq!(std::fs::read(&staged_path).unwrap(), [0x89, 0x50, 0x4e, 0x47]);

        // Dropping the unit removes the staged copy
        drop(unit);
        assert!(!staged_path.exists());
    }

    #[test]
    fn test_staged_copy_is_independent_of_original() {
        let dir = tempfile::tempdir().unwrap();
        let resource = write_resource(&dir, "slides.odp", b"original bytes");

        let unit = extract(&resource).unwrap().unwrap();
        std::fs::remove_file(&resource.path).unwrap();
        assert!(unit.upload_path().unwrap().exists());
    }
}
