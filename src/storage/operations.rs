//! Storage operations
//!
//! Builds the directory listing and file payloads served to clients.

use log::{debug, info};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

use crate::error::ContentError;
use crate::storage::results::FileLookup;
use crate::storage::validation::resolve_served_file;

/// Lists the entries of `root`, one name per line, followed by a blank line.
///
/// Names appear in the order the directory yields them, without type markers.
/// `.` and `..` are never listed.
pub async fn list_directory(root: &Path, max_payload: usize) -> Result<Vec<u8>, ContentError> {
    let what = || format!("directory {}", root.display());

    let mut entries = fs::read_dir(root)
        .await
        .map_err(|e| ContentError::Unreadable(what(), e))?;

    let mut listing = Vec::new();
    let mut count = 0usize;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ContentError::Unreadable(what(), e))?
    {
        let name = entry.file_name();
        let name = name_bytes(&name);
        if &*name == b"." || &*name == b".." {
            continue;
        }

        listing.extend_from_slice(&name);
        listing.push(b'\n');
        count += 1;

        if listing.len() + 1 > max_payload {
            return Err(ContentError::TooLarge {
                what: what(),
                size: (listing.len() + 1) as u64,
                limit: max_payload,
            });
        }
    }
    listing.push(b'\n');

    info!("Listed {} ({} entries)", root.display(), count);
    Ok(listing)
}

/// Entry names go out as the bytes the filesystem holds.
#[cfg(unix)]
fn name_bytes(name: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(name.as_bytes())
}

#[cfg(not(unix))]
fn name_bytes(name: &OsStr) -> Cow<'_, [u8]> {
    match name.to_string_lossy() {
        Cow::Borrowed(text) => Cow::Borrowed(text.as_bytes()),
        Cow::Owned(text) => Cow::Owned(text.into_bytes()),
    }
}

/// Reads the full contents of the file called `name` directly inside `root`.
///
/// Names that are missing, are not regular files, or try to leave `root`
/// report `NotFound`.
pub async fn read_file(
    root: &Path,
    name: &str,
    max_payload: usize,
) -> Result<FileLookup, ContentError> {
    let Some(path) = resolve_served_file(root, name) else {
        debug!("Rejected file name {:?}", name);
        return Ok(FileLookup::NotFound);
    };

    let metadata = match fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FileLookup::NotFound),
        Err(e) => return Err(ContentError::Unreadable(path.display().to_string(), e)),
    };

    if !metadata.is_file() {
        return Ok(FileLookup::NotFound);
    }

    if metadata.len() > max_payload as u64 {
        return Err(ContentError::TooLarge {
            what: path.display().to_string(),
            size: metadata.len(),
            limit: max_payload,
        });
    }

    let contents = match fs::read(&path).await {
        Ok(contents) => contents,
        // Removed between the metadata check and the read
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FileLookup::NotFound),
        Err(e) => return Err(ContentError::Unreadable(path.display().to_string(), e)),
    };

    // The file may have grown since the metadata check.
    if contents.len() > max_payload {
        return Err(ContentError::TooLarge {
            what: path.display().to_string(),
            size: contents.len() as u64,
            limit: max_payload,
        });
    }

    info!("Read {} ({} bytes)", path.display(), contents.len());
    Ok(FileLookup::Found(contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LIMIT: usize = 1024 * 1024;

    fn scratch_dir(tag: &str) -> PathBuf {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir().join(format!(
            "ftserver-storage-{}-{}-{}",
            tag,
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_list_directory_lines_and_blank_terminator() {
        let dir = scratch_dir("list");
        std::fs::write(dir.join("a.txt"), b"a").unwrap();
        std::fs::write(dir.join("b.txt"), b"b").unwrap();
        std::fs::create_dir(dir.join("sub")).unwrap();

        let listing = list_directory(&dir, LIMIT).await.unwrap();
        let text = String::from_utf8(listing).unwrap();

        assert!(text.ends_with("\n\n"));
        let mut names: Vec<&str> = text.trim_end_matches('\n').split('\n').collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_list_empty_directory_is_single_blank_line() {
        let dir = scratch_dir("empty");
        assert_eq!(list_directory(&dir, LIMIT).await.unwrap(), b"\n".to_vec());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_passes_non_utf8_names_through() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = scratch_dir("rawname");
        let raw: &[u8] = b"caf\xe9.txt";
        std::fs::write(dir.join(OsStr::from_bytes(raw)), b"").unwrap();

        let listing = list_directory(&dir, LIMIT).await.unwrap();
        let mut expected = raw.to_vec();
        expected.extend_from_slice(b"\n\n");
        assert_eq!(listing, expected);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_content_error() {
        let dir = scratch_dir("gone");
        std::fs::remove_dir_all(&dir).unwrap();

        let err = list_directory(&dir, LIMIT).await.unwrap_err();
        assert!(matches!(err, ContentError::Unreadable(_, _)));
    }

    #[tokio::test]
    async fn test_list_over_limit() {
        let dir = scratch_dir("biglist");
        std::fs::write(dir.join("a_rather_long_file_name.txt"), b"").unwrap();

        let err = list_directory(&dir, 8).await.unwrap_err();
        assert!(matches!(err, ContentError::TooLarge { limit: 8, .. }));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_read_existing_file_is_byte_identical() {
        let dir = scratch_dir("read");
        let contents: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        std::fs::write(dir.join("data.bin"), &contents).unwrap();

        let lookup = read_file(&dir, "data.bin", LIMIT).await.unwrap();
        assert_eq!(lookup, FileLookup::Found(contents));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_read_missing_or_unservable_is_not_found() {
        let dir = scratch_dir("missing");
        std::fs::create_dir(dir.join("sub")).unwrap();
        std::fs::write(dir.join("sub").join("inner.txt"), b"x").unwrap();

        for name in ["nope.txt", "sub", "sub/inner.txt", "../etc"] {
            assert_eq!(
                read_file(&dir, name, LIMIT).await.unwrap(),
                FileLookup::NotFound,
                "{name:?}"
            );
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_read_over_limit() {
        let dir = scratch_dir("bigfile");
        std::fs::write(dir.join("big.txt"), vec![b'x'; 100]).unwrap();

        let err = read_file(&dir, "big.txt", 99).await.unwrap_err();
        assert!(matches!(err, ContentError::TooLarge { size: 100, .. }));

        // Exactly at the limit is fine
        assert!(matches!(
            read_file(&dir, "big.txt", 100).await.unwrap(),
            FileLookup::Found(_)
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
