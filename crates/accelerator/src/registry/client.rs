//! Minimal OCI distribution client for pushing source images.

use std::collections::BTreeMap;
use std::path::Path;

use reqwest::header::{CONTENT_TYPE, LOCATION, WWW_AUTHENTICATE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::reference::ImageReference;
use crate::error::{CommandError, Result};
use crate::packaging::archive::{gzip, write_tar};

/// Username for registries requiring authentication.
pub const USERNAME_ENV: &str = "ACC_REGISTRY_USERNAME";

/// Password for registries requiring authentication.
pub const PASSWORD_ENV: &str = "ACC_REGISTRY_PASSWORD";

const MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";
const CONFIG_MEDIA_TYPE: &str = "application/vnd.oci.image.config.v1+json";
const LAYER_MEDIA_TYPE: &str = "application/vnd.oci.image.layer.v1.tar+gzip";
const DIGEST_HEADER: &str = "Docker-Content-Digest";

fn sha256_digest(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}

#[derive(Debug, Clone)]
enum Auth {
    Anonymous,
    Basic { username: String, password: String },
    Bearer(String),
}

impl Auth {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Anonymous => request,
            Self::Basic { username, password } => request.basic_auth(username, Some(password)),
            Self::Bearer(token) => request.bearer_auth(token),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Parse a `WWW-Authenticate` header into its scheme and parameters.
fn parse_challenge(header: &str) -> Option<(String, BTreeMap<String, String>)> {
    let (scheme, rest) = header.trim().split_once(' ').unwrap_or((header.trim(), ""));
    let mut params = BTreeMap::new();
    let mut in_quotes = false;
    let mut current = String::new();
    let mut pieces = Vec::new();
    for c in rest.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => pieces.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    pieces.push(current);
    for piece in pieces {
        if let Some((key, value)) = piece.split_once('=') {
            params.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }
    (!scheme.is_empty()).then(|| (scheme.to_lowercase(), params))
}

/// A blob ready for upload.
struct Blob {
    digest: String,
    data: Vec<u8>,
}

impl Blob {
    fn new(data: Vec<u8>) -> Self {
        Self {
            digest: sha256_digest(&data),
            data,
        }
    }
}

/// Pushes directories as single-layer OCI images.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    credentials: Option<(String, String)>,
}

impl RegistryClient {
    /// Create a client, reading optional credentials from the environment.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn from_env() -> Result<Self> {
        let credentials = match (std::env::var(USERNAME_ENV), std::env::var(PASSWORD_ENV)) {
            (Ok(username), Ok(password)) if !username.is_empty() => Some((username, password)),
            _ => None,
        };
        let client = Client::builder()
            .user_agent(concat!("accelerator-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CommandError::transport("could not create HTTP client"))?;
        Ok(Self {
            client,
            credentials,
        })
    }

    /// Push the packaged contents of `path` to `image`, returning the digested
    /// reference.
    ///
    /// # Errors
    /// Returns archive errors for unreadable sources and [`CommandError::Remote`]
    /// when the registry rejects a request.
    pub async fn push_directory(&self, image: &ImageReference, path: &Path) -> Result<String> {
        let tar = write_tar(path, Vec::new())?;
        let diff_id = sha256_digest(&tar);
        let layer = Blob::new(gzip(&tar)?);
        let config = Blob::new(
            serde_json::to_vec(&json!({
                "architecture": "",
                "os": "",
                "config": {},
                "rootfs": {"type": "layers", "diff_ids": [diff_id]},
            }))
            .map_err(|e| CommandError::Validation(format!("could not encode image config: {e}")))?,
        );

        let auth = self.authenticate(image).await?;
        for blob in [&config, &layer] {
            self.upload_blob(image, &auth, blob).await?;
        }

        let manifest = serde_json::to_vec(&json!({
            "schemaVersion": 2,
            "mediaType": MANIFEST_MEDIA_TYPE,
            "config": {"mediaType": CONFIG_MEDIA_TYPE, "digest": config.digest, "size": config.data.len()},
            "layers": [{"mediaType": LAYER_MEDIA_TYPE, "digest": layer.digest, "size": layer.data.len()}],
        }))
        .map_err(|e| CommandError::Validation(format!("could not encode image manifest: {e}")))?;
        let computed = sha256_digest(&manifest);

        let url = format!("{}/manifests/{}", image.base_url(), image.tag);
        debug!(url = %url, "PUT manifest");
        let response = auth
            .apply(self.client.put(&url))
            .header(CONTENT_TYPE, MANIFEST_MEDIA_TYPE)
            .body(manifest)
            .send()
            .await
            .map_err(CommandError::transport(format!("could not push {}", image.name)))?;
        let response = expect_success(response, &format!("could not push manifest for {}", image.name))?;

        let digest = response
            .headers()
            .get(DIGEST_HEADER)
            .and_then(|value| value.to_str().ok())
            .map_or(computed, str::to_string);
        info!(image = %image.name, digest = %digest, "pushed image");
        Ok(image.with_digest(&digest))
    }

    async fn authenticate(&self, image: &ImageReference) -> Result<Auth> {
        let scheme = if image.is_local() { "http" } else { "https" };
        let url = format!("{scheme}://{}/v2/", image.registry);
        debug!(url = %url, "checking registry authentication");

        let basic = self.credentials.as_ref().map(|(username, password)| Auth::Basic {
            username: username.clone(),
            password: password.clone(),
        });

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(CommandError::transport(format!(
                "could not reach registry {}",
                image.registry
            )))?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(basic.unwrap_or(Auth::Anonymous));
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_challenge);

        match challenge {
            Some((scheme, params)) if scheme == "bearer" => {
                let realm = params.get("realm").ok_or_else(|| {
                    CommandError::Remote(format!(
                        "registry {} sent a bearer challenge without a realm",
                        image.registry
                    ))
                })?;
                let scope = format!("repository:{}:push,pull", image.repository);
                let mut query = vec![("scope", scope.as_str())];
                if let Some(service) = params.get("service") {
                    query.push(("service", service.as_str()));
                }

                let request = self.client.get(realm).query(&query);
                let request = match &basic {
                    Some(auth) => auth.apply(request),
                    None => request,
                };
                let response = request.send().await.map_err(CommandError::transport(format!(
                    "could not authenticate with registry {}",
                    image.registry
                )))?;
                let response = expect_success(
                    response,
                    &format!("could not authenticate with registry {}", image.registry),
                )?;
                let token: TokenResponse = response.json().await.map_err(CommandError::transport(
                    format!("could not read token from registry {}", image.registry),
                ))?;
                token
                    .token
                    .or(token.access_token)
                    .map(Auth::Bearer)
                    .ok_or_else(|| {
                        CommandError::Remote(format!(
                            "registry {} did not return a token",
                            image.registry
                        ))
                    })
            }
            _ => basic.ok_or_else(|| {
                CommandError::Configuration(format!(
                    "registry {} requires credentials, set {USERNAME_ENV} and {PASSWORD_ENV}",
                    image.registry
                ))
            }),
        }
    }

    async fn upload_blob(&self, image: &ImageReference, auth: &Auth, blob: &Blob) -> Result<()> {
        let context = format!("could not upload blob {} to {}", blob.digest, image.registry);
        let base = image.base_url();

        let head = auth
            .apply(self.client.head(format!("{base}/blobs/{}", blob.digest)))
            .send()
            .await
            .map_err(CommandError::transport(context.as_str()))?;
        if head.status().is_success() {
            debug!(digest = %blob.digest, "blob already present");
            return Ok(());
        }

        let start = auth
            .apply(self.client.post(format!("{base}/blobs/uploads/")))
            .send()
            .await
            .map_err(CommandError::transport(context.as_str()))?;
        let start = expect_success(start, &context)?;
        let location = start
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| CommandError::Remote(format!("{context}: missing upload location")))?;

        let mut upload_url = if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else {
            let scheme = if image.is_local() { "http" } else { "https" };
            format!("{scheme}://{}{location}", image.registry)
        };
        upload_url.push(if upload_url.contains('?') { '&' } else { '?' });
        upload_url.push_str("digest=");
        upload_url.push_str(&blob.digest);

        debug!(url = %upload_url, size = blob.data.len(), "PUT blob");
        let response = auth
            .apply(self.client.put(&upload_url))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(blob.data.clone())
            .send()
            .await
            .map_err(CommandError::transport(context.as_str()))?;
        expect_success(response, &context)?;
        Ok(())
    }
}

fn expect_success(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status == StatusCode::NOT_FOUND {
        Err(CommandError::NotFound(format!("{context}: {}", status.as_u16())))
    } else {
        Err(CommandError::Remote(format!(
            "{context}, the registry response code was: \"{}\"",
            status.as_u16()
        )))
    }
}
