//! Configuration for a single OCR-to-spreadsheet run.
//!
//! Every service endpoint and constant used by the pipeline lives here so the
//! orchestrator receives one explicit value instead of reaching for globals.

mod loader;

use serde::Deserialize;
use std::time::Duration;

pub use loader::load_config;

/// Complete configuration for one run
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_source")]
    pub source: SourceConfig,

    #[serde(default = "default_storage")]
    pub storage: StorageConfig,

    #[serde(default = "default_vision")]
    pub vision: VisionConfig,

    #[serde(default = "default_sheets")]
    pub sheets: SheetsConfig,

    #[serde(default = "default_auth")]
    pub auth: AuthConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            storage: default_storage(),
            vision: default_vision(),
            sheets: default_sheets(),
            auth: default_auth(),
        }
    }
}

/// Image to process when no object URI is given on the command line
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Bucket name. A leading `gs://` is accepted and stripped.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    #[serde(default = "default_key")]
    pub key: String,
}

/// Cloud Storage JSON API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_url")]
    pub base_url: String,

    #[serde(default = "default_storage_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Cloud Vision API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    #[serde(default = "default_vision_url")]
    pub base_url: String,

    #[serde(default = "default_vision_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Google Sheets API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
    /// Sent as the user agent on every Sheets request
    #[serde(default = "default_application_name")]
    pub application_name: String,

    #[serde(default = "default_sheets_url")]
    pub base_url: String,

    /// Prefix of the public document URL; the spreadsheet id is appended
    #[serde(default = "default_document_base_url")]
    pub document_base_url: String,

    /// A1 range receiving the extracted text
    #[serde(default = "default_target_range")]
    pub target_range: String,

    /// `RAW` stores the text literally; `USER_ENTERED` would parse formulas
    #[serde(default = "default_value_input_option")]
    pub value_input_option: String,

    #[serde(default = "default_sheets_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Credential resolution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Pre-issued OAuth access token. Skips the rest of the credential chain.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Project billed for API quota. Overrides the credential file's value.
    #[serde(default)]
    pub quota_project_id: Option<String>,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,

    #[serde(default = "default_storage_scope")]
    pub storage_scope: String,

    #[serde(default = "default_vision_scope")]
    pub vision_scope: String,

    #[serde(default = "default_sheets_scope")]
    pub sheets_scope: String,

    #[serde(default = "default_auth_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl StorageConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl VisionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SheetsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Public URL of a spreadsheet
    pub fn document_url(&self, spreadsheet_id: &str) -> String {
        format!("{}{}", self.document_base_url, spreadsheet_id)
    }
}

impl AuthConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ==================== Default Value Functions ====================

pub(crate) fn default_source() -> SourceConfig {
    SourceConfig {
        bucket: default_bucket(),
        key: default_key(),
    }
}

pub(crate) fn default_bucket() -> String {
    "wot-uploads2".to_string()
}

pub(crate) fn default_key() -> String {
    "FaZe Clan GC-Scoreboard (Fracture -052023).png".to_string()
}

pub(crate) fn default_storage() -> StorageConfig {
    StorageConfig {
        base_url: default_storage_url(),
        request_timeout_secs: default_storage_timeout_secs(),
    }
}

pub(crate) fn default_storage_url() -> String {
    "https://storage.googleapis.com".to_string()
}

pub(crate) fn default_storage_timeout_secs() -> u64 {
    60
}

pub(crate) fn default_vision() -> VisionConfig {
    VisionConfig {
        base_url: default_vision_url(),
        request_timeout_secs: default_vision_timeout_secs(),
    }
}

pub(crate) fn default_vision_url() -> String {
    "https://vision.googleapis.com".to_string()
}

pub(crate) fn default_vision_timeout_secs() -> u64 {
    60
}

pub(crate) fn default_sheets() -> SheetsConfig {
    SheetsConfig {
        application_name: default_application_name(),
        base_url: default_sheets_url(),
        document_base_url: default_document_base_url(),
        target_range: default_target_range(),
        value_input_option: default_value_input_option(),
        request_timeout_secs: default_sheets_timeout_secs(),
    }
}

pub(crate) fn default_application_name() -> String {
    "OCRToGoogleSheet".to_string()
}

pub(crate) fn default_sheets_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

pub(crate) fn default_document_base_url() -> String {
    "https://docs.google.com/spreadsheets/d/".to_string()
}

pub(crate) fn default_target_range() -> String {
    "Sheet1!A1".to_string()
}

pub(crate) fn default_value_input_option() -> String {
    "RAW".to_string()
}

pub(crate) fn default_sheets_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_auth() -> AuthConfig {
    AuthConfig {
        access_token: None,
        quota_project_id: None,
        token_url: default_token_url(),
        metadata_url: default_metadata_url(),
        storage_scope: default_storage_scope(),
        vision_scope: default_vision_scope(),
        sheets_scope: default_sheets_scope(),
        request_timeout_secs: default_auth_timeout_secs(),
    }
}

pub(crate) fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

pub(crate) fn default_metadata_url() -> String {
    "http://metadata.google.internal".to_string()
}

pub(crate) fn default_storage_scope() -> String {
    "https://www.googleapis.com/auth/devstorage.read_only".to_string()
}

pub(crate) fn default_vision_scope() -> String {
    "https://www.googleapis.com/auth/cloud-vision".to_string()
}

pub(crate) fn default_sheets_scope() -> String {
    "https://www.googleapis.com/auth/spreadsheets".to_string()
}

pub(crate) fn default_auth_timeout_secs() -> u64 {
    10
}
