// src/infrastructure/mod.rs
//
// Infrastructure Layer
//
// Contains implementation details that support the domain
// but are not part of the domain itself.
//
// RULES:
// - Infrastructure serves the domain
// - Infrastructure never dictates domain behavior
// - Infrastructure is replaceable

pub mod archive_metadata;

pub use archive_metadata::{MetadataReader, ZipMetadataReader};

#[cfg(test)]
pub use archive_metadata::MockMetadataReader;
