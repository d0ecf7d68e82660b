//! File utility functions

use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

/// Expand a leading `~` component to the home directory.
///
/// Everything else about the path is kept as given: no trimming, no UTF-8
/// conversion, relative paths stay relative.
pub fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

/// Read at most `limit + 1` bytes, so oversized input is detectable
/// without buffering all of it
fn read_limited<R: Read>(reader: R, limit: usize) -> io::Result<Vec<u8>> {
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let mut buf = Vec::new();
    reader.take(cap).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Read raw filter bytes from a file, stopping one byte past `limit`
pub fn read_file_bytes(path: &Path, limit: usize) -> Result<Vec<u8>> {
    let expanded = expand_home(path);
    File::open(&expanded)
        .and_then(|file| read_limited(file, limit))
        .with_context(|| format!("Failed to read filter file: {}", expanded.display()))
}

/// Read raw filter bytes from stdin, stopping one byte past `limit`
pub fn read_stdin_bytes(limit: usize) -> Result<Vec<u8>> {
    read_limited(io::stdin().lock(), limit).context("Failed to read filter from stdin")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_expand_home_absolute_unchanged() {
        let path = if cfg!(windows) { "C:\\filters" } else { "/etc/filters" };
        assert_eq!(expand_home(Path::new(path)), PathBuf::from(path));
    }

    #[test]
    fn test_expand_home_relative_unchanged() {
        let path = Path::new("filters/active.json");
        assert_eq!(expand_home(path), PathBuf::from("filters/active.json"));
    }

    #[test]
    fn test_expand_home_keeps_surrounding_spaces() {
        let path = Path::new(" filter .json ");
        assert_eq!(expand_home(path), PathBuf::from(" filter .json "));
    }

    #[test]
    fn test_expand_home_only_whole_component() {
        let path = Path::new("~user/filter.json");
        assert_eq!(expand_home(path), PathBuf::from("~user/filter.json"));
    }

    #[test]
    fn test_expand_home_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~")), home);
            assert_eq!(expand_home(Path::new("~/.jsf")), home.join(".jsf"));
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_read_file_bytes_non_utf8_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OsStr::from_bytes(b"filter-\xff.json"));
        std::fs::write(&path, b"[]").unwrap();

        assert_eq!(read_file_bytes(&path, 1024).unwrap(), b"[]");
    }

    #[test]
    fn test_read_file_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"[{"Rating":{"$eq":"PG"}}]"#).unwrap();

        let bytes = read_file_bytes(file.path(), 1024).unwrap();
        assert_eq!(bytes, br#"[{"Rating":{"$eq":"PG"}}]"#);
    }

    #[test]
    fn test_read_file_bytes_stops_past_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b' '; 4096]).unwrap();

        let bytes = read_file_bytes(file.path(), 16).unwrap();
        assert_eq!(bytes.len(), 17);
    }

    #[test]
    fn test_read_limited_within_limit() {
        let bytes = read_limited(&b"[]"[..], 2).unwrap();
        assert_eq!(bytes, b"[]");
    }

    #[test]
    fn test_read_file_bytes_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_file_bytes(&dir.path().join("missing.json"), 1024).unwrap_err();
        assert!(err.to_string().contains("Failed to read filter file"));
    }
}
