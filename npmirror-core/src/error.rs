use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Failed to construct HTTP client: {source}")]
    Client { source: reqwest::Error },

    #[error("Request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to read file {path:?}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },

    #[error("Failed to write file {path:?}: {source}")]
    WriteFile { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse JSON from {context}: {source}")]
    ParseJson {
        context: String,
        source: serde_json::Error,
    },

    #[error("Failed to serialize JSON for {context}: {reason}")]
    SerializeJson { context: String, reason: String },

    #[error("Manifest package.json not found at {path:?}")]
    ManifestMissing { path: PathBuf },

    #[error("Invalid version range {value}: {reason}")]
    Semver { value: String, reason: String },

    #[error("No version of {name} satisfies range {range}")]
    NoMatchingVersion { name: String, range: String },

    #[error("Registry metadata for {name} has no entry for version {version}")]
    MissingVersion { name: String, version: String },

    #[error("Checksum mismatch for {name}@{version}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        version: String,
        expected: String,
        actual: String,
    },

    #[error("Resolution task failed: {source}")]
    Join { source: tokio::task::JoinError },
}
