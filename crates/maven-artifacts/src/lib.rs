//! Maven-Artifacts: registry access for sdkforge
//!
//! This crate resolves published versions of a library from a Maven
//! repository and downloads release artifacts into scoped temporary
//! directories.
//!
//! ## Modules
//!
//! - `metadata`: `maven-metadata.xml` parsing
//! - `version`: coordinates, stability and latest-stable selection
//! - `client`: HTTP client for metadata and artifact fetches
//! - `scoped`: temporary directories that are removed when their owner is done

pub mod client;
pub mod error;
pub mod metadata;
pub mod scoped;
pub mod version;

pub use client::{RegistryClient, RegistryConfig, DEFAULT_REPOSITORY};
pub use error::RegistryError;
pub use metadata::MavenMetadata;
pub use scoped::{DownloadedArtifact, ScopedTempDir};
pub use version::{is_stable, select_latest_stable, ArtifactVersion, Coordinates};

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
