//! Application Default Credentials resolution.
//!
//! Produces OAuth bearer tokens for the storage, vision and sheets clients.
//! Credentials are looked up in this order:
//!
//! 1. an explicit access token (config or `GOOGLE_OAUTH_ACCESS_TOKEN`)
//! 2. the JSON file named by `GOOGLE_APPLICATION_CREDENTIALS`
//! 3. the gcloud well-known `application_default_credentials.json`
//! 4. the GCE / Cloud Run metadata server
//!
//! Credential files may hold `authorized_user` (gcloud login) or
//! `service_account` keys.

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::error::AuthError;

const ACCESS_TOKEN_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
const CREDENTIALS_FILE_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";
const QUOTA_PROJECT_VAR: &str = "GOOGLE_CLOUD_QUOTA_PROJECT";
const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

/// Header naming the project billed for API quota
pub const QUOTA_PROJECT_HEADER: &str = "x-goog-user-project";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const JWT_LIFETIME_SECS: i64 = 3600;

/// Where bearer tokens come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Pre-issued token used as-is
    AccessToken(String),
    /// gcloud user credentials exchanged via refresh token
    AuthorizedUser(AuthorizedUser),
    /// Service account key exchanged via signed JWT grant
    ServiceAccount(ServiceAccount),
    /// Attached service account on Google compute
    MetadataServer,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub quota_project_id: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// Token endpoint from the key file; falls back to `auth.token_url`
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub quota_project_id: Option<String>,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .field("quota_project_id", &self.quota_project_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct CredentialFileHeader {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Resolve the credential source from the ambient environment.
///
/// `env` looks up environment variables and `well_known` is the gcloud
/// default credentials file, if the platform has one.
pub fn resolve_credentials(
    config: &AuthConfig,
    env: impl Fn(&str) -> Option<String>,
    well_known: Option<PathBuf>,
) -> Result<CredentialSource, AuthError> {
    let non_blank = |t: &String| !t.trim().is_empty();
    if let Some(token) = config
        .access_token
        .clone()
        .filter(non_blank)
        .or_else(|| env(ACCESS_TOKEN_VAR).filter(non_blank))
    {
        debug!("Using explicit access token");
        return Ok(CredentialSource::AccessToken(token));
    }

    if let Some(path) = env(CREDENTIALS_FILE_VAR).filter(|p| !p.is_empty()) {
        debug!(path = %path, "Using credentials file from {}", CREDENTIALS_FILE_VAR);
        return read_credentials_file(Path::new(&path));
    }

    if let Some(path) = well_known.filter(|p| p.is_file()) {
        debug!(path = %path.display(), "Using gcloud default credentials");
        return read_credentials_file(&path);
    }

    debug!("No credential file found, falling back to metadata server");
    Ok(CredentialSource::MetadataServer)
}

/// Platform location of the gcloud default credentials file
pub fn well_known_credentials_path() -> Option<PathBuf> {
    #[cfg(windows)]
    let base = dirs::config_dir();
    #[cfg(not(windows))]
    let base = dirs::home_dir().map(|home| home.join(".config"));

    base.map(|dir| dir.join("gcloud").join(WELL_KNOWN_FILE))
}

fn read_credentials_file(path: &Path) -> Result<CredentialSource, AuthError> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|e| AuthError::ReadFile {
        path: display.clone(),
        source: e,
    })?;
    let malformed = |e| AuthError::Malformed {
        path: display.clone(),
        source: e,
    };

    let header: CredentialFileHeader = serde_json::from_str(&contents).map_err(malformed)?;

    match header.kind.as_str() {
        "authorized_user" => Ok(CredentialSource::AuthorizedUser(
            serde_json::from_str(&contents).map_err(malformed)?,
        )),
        "service_account" => Ok(CredentialSource::ServiceAccount(
            serde_json::from_str(&contents).map_err(malformed)?,
        )),
        other => Err(AuthError::UnsupportedType {
            kind: other.to_string(),
            path: display.clone(),
        }),
    }
}

/// Issues bearer tokens for a resolved credential source
pub struct TokenProvider {
    client: Client,
    config: AuthConfig,
    source: CredentialSource,
    quota_project: Option<String>,
}

impl TokenProvider {
    /// The configured quota project takes precedence over the credential file's
    pub fn new(config: AuthConfig, source: CredentialSource) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AuthError::Request {
                url: config.token_url.clone(),
                source: e,
            })?;

        let quota_project = config
            .quota_project_id
            .clone()
            .or_else(|| source.quota_project_id().map(str::to_string))
            .filter(|p| !p.trim().is_empty());

        Ok(Self {
            client,
            config,
            source,
            quota_project,
        })
    }

    /// Resolve credentials from the process environment
    pub fn from_environment(mut config: AuthConfig) -> Result<Self, AuthError> {
        let source = resolve_credentials(
            &config,
            |name| std::env::var(name).ok(),
            well_known_credentials_path(),
        )?;
        if config.quota_project_id.is_none() {
            config.quota_project_id = std::env::var(QUOTA_PROJECT_VAR).ok();
        }

        let provider = Self::new(config, source)?;
        info!(
            source = provider.source.kind(),
            quota_project = provider.quota_project().unwrap_or("none"),
            "Credentials resolved"
        );
        Ok(provider)
    }

    /// Project billed for API quota, if known
    pub fn quota_project(&self) -> Option<&str> {
        self.quota_project.as_deref()
    }

    /// Attach a bearer token for `scope` and the quota project header
    pub async fn authorize(
        &self,
        request: RequestBuilder,
        scope: &str,
    ) -> Result<RequestBuilder, AuthError> {
        let token = self.access_token(scope).await?;
        let request = request.bearer_auth(token);
        Ok(match self.quota_project() {
            Some(project) => request.header(QUOTA_PROJECT_HEADER, project),
            None => request,
        })
    }

    /// Fetch a bearer token valid for `scope`
    pub async fn access_token(&self, scope: &str) -> Result<String, AuthError> {
        match &self.source {
            CredentialSource::AccessToken(token) => Ok(token.clone()),
            CredentialSource::AuthorizedUser(user) => self.refresh_user_token(user).await,
            CredentialSource::ServiceAccount(account) => {
                self.service_account_token(account, scope).await
            }
            CredentialSource::MetadataServer => self.metadata_token(scope).await,
        }
    }

    async fn refresh_user_token(&self, user: &AuthorizedUser) -> Result<String, AuthError> {
        let url = &self.config.token_url;
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", user.client_id.as_str()),
            ("client_secret", user.client_secret.as_str()),
            ("refresh_token", user.refresh_token.as_str()),
        ];

        let response = self
            .client
            .post(url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Request {
                url: url.clone(),
                source: e,
            })?;

        Self::parse_token_response(url, response).await
    }

    async fn service_account_token(
        &self,
        account: &ServiceAccount,
        scope: &str,
    ) -> Result<String, AuthError> {
        let url = account
            .token_uri
            .as_deref()
            .unwrap_or(&self.config.token_url);
        let assertion = sign_jwt_grant(account, scope, url, chrono::Utc::now().timestamp())?;
        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        let response = self
            .client
            .post(url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Request {
                url: url.to_string(),
                source: e,
            })?;

        Self::parse_token_response(url, response).await
    }

    async fn metadata_token(&self, scope: &str) -> Result<String, AuthError> {
        let url = format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token?scopes={}",
            self.config.metadata_url.trim_end_matches('/'),
            urlencoding::encode(scope)
        );

        let response = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| AuthError::NotFound {
                message: format!(
                    "no credentials file configured and metadata server unreachable ({})",
                    e
                ),
            })?;

        Self::parse_token_response(&url, response).await
    }

    async fn parse_token_response(
        url: &str,
        response: reqwest::Response,
    ) -> Result<String, AuthError> {
        if !response.status().is_success() {
            return Err(AuthError::Rejected {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| AuthError::Request {
            url: url.to_string(),
            source: e,
        })?;
        Ok(token.access_token)
    }
}

/// RS256-signed JWT bearer assertion for a service account
fn sign_jwt_grant(
    account: &ServiceAccount,
    scope: &str,
    audience: &str,
    issued_at: i64,
) -> Result<String, AuthError> {
    let invalid_key = |e| AuthError::InvalidKey {
        client_email: account.client_email.clone(),
        source: e,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = account.private_key_id.clone();
    let claims = JwtClaims {
        iss: &account.client_email,
        scope,
        aud: audience,
        iat: issued_at,
        exp: issued_at + JWT_LIFETIME_SECS,
    };
    let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes()).map_err(invalid_key)?;

    jsonwebtoken::encode(&header, &claims, &key).map_err(invalid_key)
}

impl CredentialSource {
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialSource::AccessToken(_) => "access_token",
            CredentialSource::AuthorizedUser(_) => "authorized_user",
            CredentialSource::ServiceAccount(_) => "service_account",
            CredentialSource::MetadataServer => "metadata_server",
        }
    }

    pub fn quota_project_id(&self) -> Option<&str> {
        match self {
            CredentialSource::AuthorizedUser(user) => user.quota_project_id.as_deref(),
            CredentialSource::ServiceAccount(account) => account.quota_project_id.as_deref(),
            CredentialSource::AccessToken(_) | CredentialSource::MetadataServer => None,
        }
    }
}
