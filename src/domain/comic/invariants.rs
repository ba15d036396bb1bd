use super::entity::Comic;
use crate::domain::{DomainError, DomainResult};

/// Validates all Comic invariants
pub fn validate_comic(comic: &Comic) -> DomainResult<()> {
    validate_path(comic)?;
    validate_hash(comic)?;
    Ok(())
}

/// Path must be absolute and non-empty
fn validate_path(comic: &Comic) -> DomainResult<()> {
    if comic.file_path.as_os_str().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Comic file path cannot be empty".to_string(),
        ));
    }

    if !comic.file_path.is_absolute() {
        return Err(DomainError::InvariantViolation(format!(
            "Comic file path must be absolute: {:?}",
            comic.file_path
        )));
    }

    Ok(())
}

/// The content hash is set at ingestion and must be a hex SHA-256 digest
fn validate_hash(comic: &Comic) -> DomainResult<()> {
    if comic.hash.len() != 64 || !comic.hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DomainError::InvariantViolation(format!(
            "Comic hash must be a 64-character hex digest, got {:?}",
            comic.hash
        )));
    }

    Ok(())
}
