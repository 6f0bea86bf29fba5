//! Error types for maven-artifacts

use thiserror::Error;

/// Errors that can occur while talking to a Maven registry
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The HTTP client could not be built
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    /// Transport-level failure (DNS, TLS, connection reset, timeout)
    #[error("HTTP request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The registry answered with a non-success status
    #[error("registry returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// maven-metadata.xml could not be parsed
    #[error("invalid maven-metadata.xml: {0}")]
    Metadata(String),

    /// The metadata document lists no versions at all
    #[error("no published versions for {0}")]
    NoVersions(String),

    /// IO error while writing a downloaded artifact
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    pub(crate) fn request(url: &str, err: reqwest::Error) -> Self {
        RegistryError::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<quick_xml::DeError> for RegistryError {
    fn from(err: quick_xml::DeError) -> Self {
        RegistryError::Metadata(err.to_string())
    }
}
