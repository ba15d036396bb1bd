// src/services/hash_service.rs
//
// Content hashing for change detection.
//
// Two fingerprints:
// - hash_file: SHA-256 of one file's bytes, streamed in fixed chunks
// - hash_directory: a single order-independent digest over a whole tree,
//   used to decide whether a full library rescan is worth doing at all

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

use crate::error::{AppError, AppResult};

const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Default)]
pub struct HashService;

impl HashService {
    pub fn new() -> Self {
        Self
    }

    /// Stream a file through SHA-256 and return the hex digest.
    ///
    /// Memory use is bounded by the chunk size regardless of file size.
    /// Not-found and permission failures map to their own error kinds so
    /// callers can tell "skip it" from "alert someone".
    pub fn hash_file(&self, path: &Path) -> AppResult<String> {
        let mut file = File::open(path).map_err(|e| classify_io_error(path, e))?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; CHUNK_SIZE];

        loop {
            let bytes_read = file
                .read(&mut buffer)
                .map_err(|e| classify_io_error(path, e))?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        let result = hasher.finalize();
        Ok(format!("{:x}", result))
    }

    /// Fingerprint an entire directory tree.
    ///
    /// One token is collected per file: relative path, size, mtime millis
    /// and content digest. A file that errors mid-walk contributes a
    /// stable ERROR token instead of aborting the scan, so a transient
    /// race cannot sink the whole fingerprint. Tokens are sorted before
    /// hashing, making the digest independent of enumeration order.
    pub fn hash_directory(&self, root: &Path) -> AppResult<String> {
        let mut tokens: Vec<String> = Vec::new();

        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| root.display().to_string());
                    tokens.push(format!("ERROR:{}:{}", path, e));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            match self.file_token(root, entry.path()) {
                Ok(token) => tokens.push(token),
                Err(e) => tokens.push(format!("ERROR:{}:{}", entry.path().display(), e)),
            }
        }

        tokens.sort();

        let mut hasher = Sha256::new();
        for token in &tokens {
            hasher.update(token.as_bytes());
        }

        Ok(format!("{:x}", hasher.finalize()))
    }

    fn file_token(&self, root: &Path, path: &Path) -> AppResult<String> {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let metadata = std::fs::metadata(path).map_err(|e| classify_io_error(path, e))?;

        let modified_millis = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis())
            .unwrap_or(0);

        let digest = self.hash_file(path)?;

        Ok(format!(
            "{}:{}:{}:{}",
            relative.display(),
            metadata.len(),
            modified_millis,
            digest
        ))
    }
}

fn classify_io_error(path: &Path, error: std::io::Error) -> AppError {
    match error.kind() {
        std::io::ErrorKind::NotFound => AppError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => AppError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => AppError::Io(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_hash_file_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.cbz", b"identical bytes");

        let service = HashService::new();
        let first = service.hash_file(&path).unwrap();
        let second = service.hash_file(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_one_bit_changes_the_digest() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.cbz", b"content A");
        let b = write_file(dir.path(), "b.cbz", b"content B");

        let service = HashService::new();
        assert_ne!(
            service.hash_file(&a).unwrap(),
            service.hash_file(&b).unwrap()
        );
    }

    #[test]
    fn test_hash_file_larger_than_chunk_size() {
        let dir = tempfile::tempdir().unwrap();
        let big = vec![0xABu8; CHUNK_SIZE * 3 + 17];
        let path = write_file(dir.path(), "big.cbz", &big);

        let service = HashService::new();

        // Whole-buffer digest must equal the streamed digest
        let expected = format!("{:x}", Sha256::digest(&big));
        assert_eq!(service.hash_file(&path).unwrap(), expected);
    }

    #[test]
    fn test_missing_file_reports_distinct_kind() {
        let dir = tempfile::tempdir().unwrap();
        let service = HashService::new();

        let result = service.hash_file(&dir.path().join("absent.cbz"));
        assert!(matches!(result, Err(AppError::FileNotFound { .. })));
    }

    #[test]
    fn test_directory_digest_stable_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "one.cbz", b"one");
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        write_file(&dir.path().join("nested"), "two.cbz", b"two");

        let service = HashService::new();
        let first = service.hash_directory(dir.path()).unwrap();
        let second = service.hash_directory(dir.path()).unwrap();

        // Tokens are sorted before hashing, so enumeration order is
        // irrelevant and repeated runs agree
        assert_eq!(first, second);
    }

    #[test]
    fn test_directory_digest_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "one.cbz", b"one");

        let service = HashService::new();
        let before = service.hash_directory(dir.path()).unwrap();

        std::fs::write(&file, b"two").unwrap();
        let after = service.hash_directory(dir.path()).unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn test_empty_directory_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let service = HashService::new();

        // No files → digest of the empty token list, still deterministic
        let digest = service.hash_directory(dir.path()).unwrap();
        assert_eq!(digest, format!("{:x}", Sha256::digest(b"")));
    }
}
