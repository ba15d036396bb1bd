// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod comic;
pub mod library;
pub mod metadata;
pub mod naming;
pub mod series;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Comic Domain
pub use comic::{validate_comic, Comic};

// Series Domain
pub use series::{validate_series, Series};

// Library Domain
pub use library::LibraryRoot;

// Parsed-name value objects
pub use naming::{ParsedFileProps, ParsedFolderProps};

// Metadata
pub use metadata::{
    ComicBookInfo, ComicInfo, CreditEntry, MangaMode, PageInfo, RawMetadata, StandardizedMetadata,
};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
