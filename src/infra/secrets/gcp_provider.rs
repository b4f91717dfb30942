//! Google Secret Manager provider.
//!
//! The configured environment value is a secret reference of the form
//! `SECRET_NAME/versions/SECRET_VERSION`. Resolution is two requests: an
//! access token from the instance metadata server, then the secret version
//! payload from `{base_url}/{reference}:access`.

use super::types::{SecretError, SecretProvider, SecretResolution, SecretSourceMode};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Instance metadata endpoint that hands out the default service account token.
pub const DEFAULT_METADATA_TOKEN_URL: &str =
    "http://169.254.169.254/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: Option<SecretPayload>,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: Option<String>,
}

/// Fetches secrets from Google Secret Manager with a metadata-server token.
pub struct GcpSecretProvider {
    /// `https://secretmanager.googleapis.com/v1/projects/PROJECT_ID/secrets`
    base_url: Option<String>,
    token_url: String,
    client: Client,
}

impl GcpSecretProvider {
    pub fn new(base_url: Option<String>, token_url: String, client: Client) -> Self {
        Self {
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
            token_url,
            client,
        }
    }

    async fn access_token(&self) -> Result<String, SecretError> {
        let response = self
            .client
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(SecretError::Transport(format!(
                "metadata token request returned {status}: {text}"
            )));
        }

        let token: MetadataToken = response.json().await?;
        Ok(token.access_token)
    }

    async fn access_secret(
        &self,
        base_url: &str,
        reference: &str,
        token: &str,
    ) -> Result<String, SecretError> {
        let url = format!("{base_url}/{reference}:access");
        let response = self
            .client
            .get(&url)
            .header("authorization", format!("Bearer {token}"))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(SecretError::Transport(format!(
                "secret manager request returned {status}: {text}"
            )));
        }

        let parsed: AccessSecretVersionResponse = response.json().await?;
        let data = parsed
            .payload
            .and_then(|payload| payload.data)
            .ok_or_else(|| SecretError::Decode("secret payload missing data".into()))?;
        decode_payload(&data)
    }

    async fn fetch_secret(&self, name: &str, reference: &str) -> Result<String, SecretError> {
        let base_url = self.base_url.as_deref().ok_or_else(|| {
            SecretError::Configuration(format!(
                "no secret manager base URL configured to resolve {name}"
            ))
        })?;

        let token = self.access_token().await?;
        debug!("Fetching {name} from secret manager");
        self.access_secret(base_url, reference, &token).await
    }
}

/// Decode a base64 secret payload into UTF-8 text.
fn decode_payload(data: &str) -> Result<String, SecretError> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| SecretError::Decode(format!("base64 decode failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| SecretError::Decode(format!("invalid UTF-8: {e}")))
}

#[async_trait]
impl SecretProvider for GcpSecretProvider {
    fn mode(&self) -> SecretSourceMode {
        SecretSourceMode::ManagedFetch
    }

    fn name(&self) -> &str {
        "gcp_secrets_manager"
    }

    async fn fetch(&self, name: &str, raw: &str) -> SecretResolution {
        self.fetch_secret(name, raw).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider_for(server: &MockServer) -> GcpSecretProvider {
        GcpSecretProvider::new(
            Some(format!("{}/v1/projects/demo/secrets/", server.uri())),
            format!("{}/token", server.uri()),
            Client::new(),
        )
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/token"))
            .and(header("Metadata-Flavor", "Google"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-1"})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn resolves_base64_payload() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/demo/secrets/account/versions/1:access"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"payload": {"data": "c2VjcmV0"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let result = provider.fetch("GATEWAY_ACCOUNT", "account/versions/1").await;
        assert_eq!(result.value(), Some("secret"));
    }

    #[tokio::test]
    async fn token_forbidden_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let result = provider.fetch("GATEWAY_ACCOUNT", "account/versions/1").await;
        assert!(!result.is_resolved());
        assert!(result.error_message().unwrap().contains("403"));
    }

    #[tokio::test]
    async fn secret_not_found_fails() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/demo/secrets/account/versions/9:access"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let result = provider.fetch("GATEWAY_ACCOUNT", "account/versions/9").await;
        assert!(result.error_message().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn missing_payload_data_is_decode_error() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/demo/secrets/key/versions/1:access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"payload": {}})))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let result = provider.fetch("GATEWAY_KEY", "key/versions/1").await;
        assert!(result.error_message().unwrap().contains("missing data"));
    }

    #[tokio::test]
    async fn missing_base_url_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider =
            GcpSecretProvider::new(None, format!("{}/token", server.uri()), Client::new());
        let result = provider.fetch("GATEWAY_KEY", "key/versions/1").await;
        assert!(result.error_message().unwrap().contains("base URL"));
    }

    #[test]
    fn decode_payload_rejects_garbage() {
        assert_eq!(decode_payload("c2VjcmV0").unwrap(), "secret");
        assert!(matches!(
            decode_payload("not base64!"),
            Err(SecretError::Decode(_))
        ));
        // "/w==" decodes to the lone byte 0xff
        assert!(matches!(decode_payload("/w=="), Err(SecretError::Decode(_))));
    }
}
