//! Filename generation and manipulation.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const MAX_UNIQUE_ATTEMPTS: u32 = 1000;

fn reject_unsafe(name: &str) -> Result<()> {
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }
    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }
    Ok(())
}

fn replace_reserved(name: &str, separators: bool) -> Result<String> {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' if separators => '_',
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Name cannot be empty or whitespace-only".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Validate a downloaded file name and replace reserved characters.
///
/// Path separators are rejected outright.
pub fn sanitize_filename(name: &str) -> Result<String> {
    reject_unsafe(name)?;
    if name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidFilename(format!(
            "Path separators not allowed in filename: '{}'",
            name
        )));
    }
    replace_reserved(name, false)
}

/// Like [`sanitize_filename`] but separators become underscores. Used for
/// per-user download folders.
pub fn sanitize_path_component(name: &str) -> Result<String> {
    reject_unsafe(name)?;
    replace_reserved(name, true)
}

/// `name.jpg`, then `name_1.jpg`, `name_2.jpg`... until one does not exist.
pub fn make_unique_filename(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str());
    let parent = path.parent().unwrap_or(Path::new("."));

    let mut candidate = path.to_path_buf();
    for n in 1..=MAX_UNIQUE_ATTEMPTS {
        candidate = parent.join(match ext {
            Some(ext) => format!("{}_{}.{}", stem, n, ext),
            None => format!("{}_{}", stem, n),
        });
        if !candidate.exists() {
            break;
        }
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("1234_n.jpg").unwrap(), "1234_n.jpg");
        assert_eq!(sanitize_filename("a:b?.mp4").unwrap(), "a_b_.mp4");
        assert!(sanitize_filename("../etc/passwd").is_err());
        assert!(sanitize_filename("dir/file.jpg").is_err());
        assert!(sanitize_filename("dir\\file.jpg").is_err());
        assert!(sanitize_filename("nul\0.jpg").is_err());
        assert!(sanitize_filename("  ").is_err());
    }

    #[test]
    fn test_sanitize_path_component() {
        assert_eq!(sanitize_path_component("alice").unwrap(), "alice");
        assert_eq!(sanitize_path_component("a/b").unwrap(), "a_b");
        assert!(sanitize_path_component("a/../b").is_err());
    }

    #[test]
    fn test_make_unique_filename() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        assert_eq!(make_unique_filename(&path), path);

        std::fs::write(&path, b"x").unwrap();
        let second = make_unique_filename(&path);
        assert_eq!(second, dir.path().join("photo_1.jpg"));

        std::fs::write(&second, b"x").unwrap();
        assert_eq!(make_unique_filename(&path), dir.path().join("photo_2.jpg"));
    }
}
