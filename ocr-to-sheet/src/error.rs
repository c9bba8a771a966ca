use thiserror::Error;

/// Main pipeline error type. Every variant is fatal for the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Vision(#[from] VisionError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Publish(#[from] PublishError),

    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Object storage access errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: gs://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Access denied to gs://{bucket}/{key} (status {status})")]
    AccessDenied {
        bucket: String,
        key: String,
        status: u16,
    },

    #[error("Storage credentials could not be resolved")]
    Credentials(#[source] AuthError),

    #[error("Storage request failed (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Connection failed to storage at {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Transport-level errors from the text recognition service.
///
/// Per-image recognition errors are not represented here; they are reported
/// through [`crate::extractor::Extraction::Rejected`].
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Connection failed to Vision at {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Vision credentials could not be resolved")]
    Credentials(#[source] AuthError),

    #[error("Annotation request failed (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from Vision")]
    InvalidResponse {
        #[source]
        source: reqwest::Error,
    },
}

/// Credential resolution errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No credentials found: {message}")]
    NotFound { message: String },

    #[error("Failed to read credentials file {path}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed credentials file {path}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported credential type '{kind}' in {path}")]
    UnsupportedType { kind: String, path: String },

    #[error("Token request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Token endpoint rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Cannot sign token grant with the private key of {client_email}")]
    InvalidKey {
        client_email: String,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}

/// Spreadsheet creation and write errors
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to create spreadsheet '{title}' (status {status}): {message}")]
    Create {
        title: String,
        status: u16,
        message: String,
    },

    #[error("Failed to write range {range} of spreadsheet {spreadsheet_id} (status {status}): {message}")]
    Write {
        spreadsheet_id: String,
        range: String,
        status: u16,
        message: String,
    },

    #[error("Connection failed to Sheets at {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid response from Sheets")]
    InvalidResponse {
        #[source]
        source: reqwest::Error,
    },
}

/// Configuration and input errors, raised before any remote call
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {message}")]
    Load { message: String },

    #[error("Invalid object URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
