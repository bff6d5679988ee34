//! Store gateway client
//!
//! Talks to the store's JSON gateway over HTTP(S). Domain objects travel as
//! their serde representation. Every query is made in the all-groups context
//! (`group=-1`), and no request is retried.

use super::traits::RoiStore;
use crate::config::{secret_string, Credentials, SecretString, ServerConfig};
use crate::domain::{
    Annotation, AnnotationOwner, Image, ImageId, LsidAuthority, Result, Roi, RoiToolError,
    StoreError,
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

/// Group id that widens queries to every group of the session's user
const ALL_GROUPS: &str = "-1";

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session_key: String,
}

#[derive(Debug, Deserialize)]
struct AuthorityResponse {
    authority: String,
    database_uuid: String,
}

/// Store reached through the JSON gateway
///
/// # Example
///
/// ```no_run
/// use roitool::adapters::store::{HttpStore, RoiStore};
/// use roitool::config::ServerConfig;
///
/// # async fn example() -> roitool::domain::Result<()> {
/// let config = ServerConfig {
///     username: Some("analyst".to_string()),
///     password: Some(roitool::config::secret_string("secret".to_string())),
///     ..Default::default()
/// };
/// let credentials = config.credentials().map_err(roitool::domain::RoiToolError::Configuration)?;
/// let store = HttpStore::connect(&config, credentials).await?;
/// let authority = store.authority().await?;
/// store.logout().await?;
/// # Ok(())
/// # }
/// ```
pub struct HttpStore {
    base_url: Url,
    client: Client,
    session_key: SecretString,
    /// False when an existing session was joined; it is then left open
    owns_session: bool,
    authority: OnceCell<LsidAuthority>,
}

impl HttpStore {
    /// Opens or joins a session
    ///
    /// # Errors
    ///
    /// - Configuration error for an unusable base URL or HTTP client settings
    /// - [`StoreError::AuthenticationFailed`] when the credentials are refused
    /// - [`StoreError::ConnectionFailed`] when the gateway is unreachable
    pub async fn connect(config: &ServerConfig, credentials: Credentials) -> Result<Self> {
        let base_url = Url::parse(&config.base_url()).map_err(|e| {
            RoiToolError::Configuration(format!("Invalid server address {}: {e}", config.base_url()))
        })?;

        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));
        if !config.tls_verify {
            tracing::warn!("TLS certificate verification is disabled");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }
        let client = client_builder
            .build()
            .map_err(|e| RoiToolError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        let endpoint = join(&base_url, "api/v1/session")?;
        let (session_key, owns_session) = match credentials {
            Credentials::Password { username, password } => {
                let encoded = general_purpose::STANDARD
                    .encode(format!("{username}:{}", password.expose_secret().as_ref()));
                let response = send(
                    client
                        .post(endpoint)
                        .header("Authorization", format!("Basic {encoded}")),
                )
                .await?;
                let session: SessionResponse = read_json(check(response).await?).await?;
                tracing::info!(server = %base_url, username = %username, "Created session");
                (secret_string(session.session_key), true)
            }
            Credentials::SessionKey(key) => {
                let response = send(client.get(endpoint).header(
                    "Authorization",
                    format!("Bearer {}", key.expose_secret().as_ref()),
                ))
                .await?;
                check(response).await?;
                tracing::info!(server = %base_url, "Joined existing session");
                (key, false)
            }
        };

        Ok(Self {
            base_url,
            client,
            session_key,
            owns_session,
            authority: OnceCell::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            "Authorization",
            format!("Bearer {}", self.session_key.expose_secret().as_ref()),
        )
    }

    /// GET in the all-groups context; `None` on 404
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = join(&self.base_url, path)?;
        tracing::debug!(url = %url, "Store query");
        let response = send(
            self.authorized(self.client.get(url))
                .query(&[("group", ALL_GROUPS)]),
        )
        .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(check(response).await?).await.map(Some)
    }
}

#[async_trait]
impl RoiStore for HttpStore {
    async fn authority(&self) -> Result<LsidAuthority> {
        let authority = self
            .authority
            .get_or_try_init(|| async {
                let response: AuthorityResponse = self
                    .get_json("api/v1/config/authority")
                    .await?
                    .ok_or_else(|| {
                        StoreError::InvalidResponse("store did not report its authority".to_string())
                    })?;
                LsidAuthority::new(response.authority, response.database_uuid)
                    .map_err(|e| RoiToolError::Store(StoreError::InvalidResponse(e)))
            })
            .await?;
        Ok(authority.clone())
    }

    async fn find_images(&self, image_id: ImageId) -> Result<Vec<Image>> {
        let image: Option<Image> = self.get_json(&format!("api/v1/images/{image_id}")).await?;
        Ok(image.into_iter().collect())
    }

    async fn find_rois(&self, image_id: ImageId) -> Result<Vec<Roi>> {
        let rois: Option<Vec<Roi>> = self
            .get_json(&format!("api/v1/images/{image_id}/rois"))
            .await?;
        Ok(rois.unwrap_or_default())
    }

    async fn find_annotations(&self, owner: AnnotationOwner) -> Result<Vec<Arc<Annotation>>> {
        let annotations: Option<Vec<Annotation>> = self
            .get_json(&format!(
                "api/v1/{}/{}/annotations",
                owner.collection(),
                owner.id()
            ))
            .await?;
        Ok(annotations
            .unwrap_or_default()
            .into_iter()
            .map(Arc::new)
            .collect())
    }

    async fn save_rois(&self, rois: Vec<Roi>) -> Result<Vec<Roi>> {
        let url = join(&self.base_url, "api/v1/rois")?;
        let response = send(self.authorized(self.client.post(url)).json(&rois)).await?;
        let response = check(response).await.map_err(|e| match e {
            RoiToolError::Store(StoreError::ClientError { status, message })
            | RoiToolError::Store(StoreError::ServerError { status, message }) => {
                RoiToolError::Store(StoreError::SaveFailed(format!("status {status}: {message}")))
            }
            other => other,
        })?;
        read_json(response).await
    }

    async fn logout(&self) -> Result<()> {
        if !self.owns_session {
            tracing::debug!("Leaving joined session open");
            return Ok(());
        }
        let url = join(&self.base_url, "api/v1/session")?;
        check(send(self.authorized(self.client.delete(url))).await?).await?;
        tracing::info!("Session closed");
        Ok(())
    }
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| RoiToolError::Configuration(format!("Invalid request path {path}: {e}")))
}

async fn send(request: RequestBuilder) -> Result<Response> {
    request.send().await.map_err(|e| {
        let err = if e.is_timeout() {
            StoreError::Timeout(e.to_string())
        } else {
            StoreError::ConnectionFailed(e.to_string())
        };
        RoiToolError::Store(err)
    })
}

/// Maps a non-2xx response to a [`StoreError`]
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    let err = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::AuthenticationFailed(format!("status {}: {message}", status.as_u16()))
        }
        status if status.is_server_error() => StoreError::ServerError {
            status: status.as_u16(),
            message,
        },
        status => StoreError::ClientError {
            status: status.as_u16(),
            message,
        },
    };
    Err(err.into())
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| RoiToolError::Store(StoreError::InvalidResponse(e.to_string())))
}
