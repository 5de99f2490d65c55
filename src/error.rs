//! Centralized error types for kndp
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use thiserror::Error;

/// Top-level error type for registry operations
#[derive(Error, Debug)]
pub enum KndpError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Secret store error: {0}")]
    Store(#[from] StoreError),

    #[error("Release error: {0}")]
    Release(#[from] ReleaseError),

    #[error("Local registry error: {0}")]
    LocalRegistry(#[from] LocalRegistryError),
}

/// Registry rejected before any mutation happened
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Registry has no server credentials")]
    NoAuths,

    #[error("Field '{field}' is required for registry server {server}")]
    MissingField { server: String, field: &'static str },

    #[error("Invalid email address for registry server {server}: {email}")]
    InvalidEmail { server: String, email: String },

    #[error("Invalid registry server URL: {server}. Expected: http(s)://host[/path]")]
    InvalidServer { server: String },

    #[error("Secret for registry server {server} already exists")]
    AlreadyExists { server: String },
}

/// Cluster secret store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Secret {name} not found")]
    NotFound { name: String },

    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    #[error("Failed to connect to context {context}: {message}")]
    Client { context: String, message: String },

    #[error("Secret store rejected {operation}: {message}")]
    Rejected { operation: &'static str, message: String },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Installer release errors
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Release {release} not found in namespace {namespace}")]
    NotFound { release: String, namespace: String },

    #[error("Helm command failed: {command}: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Release values are not a valid mapping: {message}")]
    InvalidValues { message: String },

    #[error("Upgrade of release {release} failed: {message}")]
    UpgradeFailed { release: String, message: String },
}

/// In-cluster registry service errors
#[derive(Error, Debug)]
pub enum LocalRegistryError {
    #[error("Failed to create local registry {resource}: {source}")]
    Create {
        resource: String,
        #[source]
        source: kube::Error,
    },

    #[error("Failed to delete local registry {resource}: {source}")]
    Delete {
        resource: String,
        #[source]
        source: kube::Error,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read config {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Failed to parse config {path}: {message}")]
    ParseError { path: String, message: String },
}
