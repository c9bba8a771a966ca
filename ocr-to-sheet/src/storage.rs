//! Cloud Storage download of the source image.

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::info;

use crate::auth::TokenProvider;
use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::source::ImageReference;

/// Read-only access to objects by bucket and key
pub trait ObjectStore {
    async fn get_object(&self, image: &ImageReference) -> Result<Bytes, StorageError>;
}

/// Cloud Storage JSON API client
pub struct GcsClient {
    client: Client,
    base_url: String,
    scope: String,
    tokens: Arc<TokenProvider>,
}

impl GcsClient {
    pub fn new(
        config: &StorageConfig,
        scope: impl Into<String>,
        tokens: Arc<TokenProvider>,
    ) -> Result<Self, StorageError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| StorageError::Connection {
                url: base_url.clone(),
                source: e,
            })?;

        Ok(Self {
            client,
            base_url,
            scope: scope.into(),
            tokens,
        })
    }

    /// Media download URL for an object
    pub fn object_url(&self, image: &ImageReference) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.base_url,
            urlencoding::encode(image.bucket()),
            urlencoding::encode(image.key())
        )
    }
}

impl ObjectStore for GcsClient {
    async fn get_object(&self, image: &ImageReference) -> Result<Bytes, StorageError> {
        let url = self.object_url(image);
        let request = self
            .tokens
            .authorize(self.client.get(&url), &self.scope)
            .await
            .map_err(StorageError::Credentials)?;

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::Connection {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if status.is_success() {
            return response.bytes().await.map_err(|e| StorageError::Connection {
                url: url.clone(),
                source: e,
            });
        }

        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound {
                bucket: image.bucket().to_string(),
                key: image.key().to_string(),
            });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StorageError::AccessDenied {
                bucket: image.bucket().to_string(),
                key: image.key().to_string(),
                status: status.as_u16(),
            });
        }

        Err(StorageError::Api {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        })
    }
}

/// Download the image bytes named by `image`
pub async fn fetch_image<S: ObjectStore>(
    store: &S,
    image: &ImageReference,
) -> Result<Bytes, StorageError> {
    let bytes = store.get_object(image).await?;
    info!(
        bucket = image.bucket(),
        key = image.key(),
        bytes = bytes.len(),
        "Image downloaded"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialSource, QUOTA_PROJECT_HEADER};
    use crate::config::{default_auth, default_storage};
    use crate::test_support::CannedServer;

    fn client_for(base_url: &str) -> GcsClient {
        let mut auth = default_auth();
        auth.quota_project_id = Some("billing-proj".to_string());
        let tokens = Arc::new(
            TokenProvider::new(auth, CredentialSource::AccessToken("token".to_string())).unwrap(),
        );
        let mut config = default_storage();
        config.base_url = base_url.to_string();
        GcsClient::new(&config, "scope", tokens).unwrap()
    }

    fn client() -> GcsClient {
        client_for(&default_storage().base_url)
    }

    fn scoreboard() -> ImageReference {
        ImageReference::new("wot-uploads2", "scoreboard.png").unwrap()
    }

    #[tokio::test]
    async fn test_get_object_downloads_bytes() {
        let server = CannedServer::start(vec![(200, "png-bytes")]).await;
        let bytes = client_for(&server.base_url)
            .get_object(&scoreboard())
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"png-bytes");

        let requests = server.requests();
        assert_eq!(requests[0].method, "GET");
        assert_eq!(
            requests[0].target,
            "/storage/v1/b/wot-uploads2/o/scoreboard.png?alt=media"
        );
        assert_eq!(requests[0].header("authorization"), Some("Bearer token"));
        assert_eq!(requests[0].header(QUOTA_PROJECT_HEADER), Some("billing-proj"));
    }

    #[tokio::test]
    async fn test_get_object_not_found() {
        let server = CannedServer::start(vec![(404, r#"{"error":{"code":404}}"#)]).await;
        let result = client_for(&server.base_url).get_object(&scoreboard()).await;
        assert!(matches!(
            result,
            Err(StorageError::NotFound { bucket, key }) if bucket == "wot-uploads2" && key == "scoreboard.png"
        ));
    }

    #[tokio::test]
    async fn test_get_object_access_denied() {
        let server = CannedServer::start(vec![
            (401, r#"{"error":{"code":401}}"#),
            (403, r#"{"error":{"code":403}}"#),
        ])
        .await;
        let client = client_for(&server.base_url);

        for expected in [401, 403] {
            let result = client.get_object(&scoreboard()).await;
            assert!(matches!(
                result,
                Err(StorageError::AccessDenied { status, .. }) if status == expected
            ));
        }
    }

    #[tokio::test]
    async fn test_get_object_server_error() {
        let server = CannedServer::start(vec![(500, "backend error")]).await;
        let result = client_for(&server.base_url).get_object(&scoreboard()).await;
        assert!(matches!(
            result,
            Err(StorageError::Api { status: 500, message }) if message == "backend error"
        ));
    }

    #[test]
    fn test_object_url_encodes_key() {
        let image = ImageReference::new("wot-uploads2", "scores/FaZe Clan (1).png").unwrap();
        let url = client().object_url(&image);
        assert_eq!(
            url,
            "https://storage.googleapis.com/storage/v1/b/wot-uploads2/o/scores%2FFaZe%20Clan%20%281%29.png?alt=media"
        );
    }

    struct MissingStore;

    impl ObjectStore for MissingStore {
        async fn get_object(&self, image: &ImageReference) -> Result<Bytes, StorageError> {
            Err(StorageError::NotFound {
                bucket: image.bucket().to_string(),
                key: image.key().to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_missing_object() {
        let image = ImageReference::new("bucket", "missing.png").unwrap();
        let result = fetch_image(&MissingStore, &image).await;
        match result {
            Err(e @ StorageError::NotFound { .. }) => {
                assert_eq!(e.to_string(), "Object not found: gs://bucket/missing.png");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
