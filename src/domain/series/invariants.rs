use super::entity::Series;
use crate::domain::{DomainError, DomainResult};

/// Validates all Series invariants
pub fn validate_series(series: &Series) -> DomainResult<()> {
    if series.folder_path.as_os_str().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Series folder path cannot be empty".to_string(),
        ));
    }

    if !series.folder_path.is_absolute() {
        return Err(DomainError::InvariantViolation(format!(
            "Series folder path must be absolute: {:?}",
            series.folder_path
        )));
    }

    if series.title.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Series title cannot be empty".to_string(),
        ));
    }

    Ok(())
}
