//! HTTP client for the accelerator server.

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use super::models::{
    AcceleratorList, AcceleratorOption, ErrorResponse, GenerateBody, OptionsResponse,
    ServerAccelerator,
};
use crate::config::ServerUrl;
use crate::error::{CommandError, Result};
use crate::packaging::GenerationRequest;

/// Prefix used when talking to the accelerator server directly.
const DIRECT_PREFIX: &str = "api";

/// Prefix used when the URL points at a UI gateway proxying the server.
const PROXY_PREFIX: &str = "api/proxy";

/// Value of the `source` query parameter identifying this client.
const TRACKING_SOURCE: &str = "TanzuCLI";

/// Provenance attached to generation and tracking calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracking {
    pub username: String,
    pub id: String,
}

impl Tracking {
    /// Current user with a fresh invocation id.
    #[must_use]
    pub fn current() -> Self {
        let username = ["USER", "USERNAME"]
            .iter()
            .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| "unknown".to_string());
        Self {
            username,
            id: Uuid::new_v4().to_string(),
        }
    }

    fn query<'a>(&'a self, name: &'a str) -> [(&'static str, &'a str); 4] {
        [
            ("name", name),
            ("source", TRACKING_SOURCE),
            ("username", self.username.as_str()),
            ("id", self.id.as_str()),
        ]
    }
}

/// Client bound to one server URL and its detected API prefix.
#[derive(Debug, Clone)]
pub struct AcceleratorServer {
    client: Client,
    url: ServerUrl,
    prefix: &'static str,
}

impl AcceleratorServer {
    /// Create a client and detect whether `url` is the server itself or a proxy.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub async fn connect(url: ServerUrl) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("accelerator-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CommandError::transport("could not create HTTP client"))?;
        let prefix = detect_prefix(&client, &url).await;
        info!(url = %url, prefix, "connected to accelerator server");
        Ok(Self {
            client,
            url,
            prefix,
        })
    }

    #[must_use]
    pub fn url(&self) -> &ServerUrl {
        &self.url
    }

    #[must_use]
    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    fn endpoint(&self, path: &str) -> String {
        self.url.join(&format!("{}/{path}", self.prefix))
    }

    /// Make a GET request and decode the JSON body.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        context: &str,
    ) -> Result<T> {
        let url = self.endpoint(path);
        debug!(url = %url, "GET request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(CommandError::transport(context))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CommandError::Remote(format!(
                "{context}, the server response code was: \"{}\"",
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(CommandError::transport(context))?;
        serde_json::from_str(&body).map_err(|e| {
            CommandError::Remote(format!("Error unmarshalling response from {url}: {e}"))
        })
    }

    /// All accelerators registered with the server.
    ///
    /// # Errors
    /// Returns error if the server cannot be reached or answers with an error.
    pub async fn list_accelerators(&self) -> Result<Vec<ServerAccelerator>> {
        let context = format!(
            "Error getting accelerators from {}, check that --server-url or the ACC_SERVER_URL env variable is set with the correct value, or use the --from-context flag to get the accelerators from your current context",
            self.url
        );
        let list: AcceleratorList = self.get("accelerators", &[], &context).await?;
        Ok(list.embedded.accelerators)
    }

    /// Options declared by accelerator `name`.
    ///
    /// # Errors
    /// Returns error if the server cannot be reached or answers with an error.
    pub async fn accelerator_options(&self, name: &str) -> Result<Vec<AcceleratorOption>> {
        let context = format!("Error getting accelerator {name} options from {}", self.url);
        let response: OptionsResponse = self
            .get("accelerators/options", &[("name", name)], &context)
            .await?;
        Ok(response.options)
    }

    /// Generate a project from a registered accelerator, returning the zip bytes.
    ///
    /// # Errors
    /// Returns [`CommandError::NotFound`] when the accelerator is unknown and
    /// [`CommandError::Remote`] for other failures.
    pub async fn generate(
        &self,
        name: &str,
        options: &Map<String, Value>,
        tracking: &Tracking,
    ) -> Result<Vec<u8>> {
        let url = self.endpoint("accelerators/zip");
        debug!(url = %url, accelerator = name, "POST generate");

        let response = self
            .client
            .post(&url)
            .query(&tracking.query(name))
            .json(&GenerateBody {
                accelerator: name,
                options,
            })
            .send()
            .await
            .map_err(CommandError::transport(format!(
                "there was an error generating the accelerator {name}"
            )))?;

        read_archive(response, format!("accelerator {name} not found")).await
    }

    /// Generate a project from a multipart request, returning the zip bytes.
    ///
    /// # Errors
    /// Returns [`CommandError::NotFound`] when a referenced accelerator or fragment
    /// is unknown and [`CommandError::Remote`] for other failures.
    pub async fn generate_from_local(&self, request: GenerationRequest) -> Result<Vec<u8>> {
        let url = self.endpoint("accelerators/zip");
        debug!(url = %url, project = request.project_name(), "POST multipart generate");

        let response = self
            .client
            .post(&url)
            .multipart(request.into_form())
            .send()
            .await
            .map_err(CommandError::transport("there was an error generating the accelerator"))?;

        read_archive(
            response,
            "one of the accelerators or fragments was not found".to_string(),
        )
        .await
    }

    /// Record that accelerator `name` was downloaded.
    ///
    /// Servers without the `invoked` endpoint get the older `downloaded` call; a
    /// server without either is left alone.
    ///
    /// # Errors
    /// Returns error if the server answers with an error other than 404.
    pub async fn register_download(&self, name: &str, tracking: &Tracking) -> Result<()> {
        let context = "there was an error registering download for the accelerator";

        let mut query = vec![("type", "download")];
        query.extend(tracking.query(name));
        let response = self.post_tracking("accelerators/invoked", &query, context).await?;
        if response.status() != StatusCode::NOT_FOUND {
            return check_tracking(response, context).await;
        }

        debug!("invoked endpoint missing, falling back to downloaded");
        let response = self
            .post_tracking("accelerators/downloaded", &tracking.query(name), context)
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_tracking(response, context).await
    }

    async fn post_tracking(
        &self,
        path: &str,
        query: &[(&str, &str)],
        context: &str,
    ) -> Result<Response> {
        let url = self.endpoint(path);
        debug!(url = %url, "POST tracking");
        self.client
            .post(&url)
            .query(query)
            .send()
            .await
            .map_err(CommandError::transport(context))
    }
}

/// Probe `<url>/api/about`; a 200 means the server is addressed directly.
async fn detect_prefix(client: &Client, url: &ServerUrl) -> &'static str {
    let about = url.join("api/about");
    debug!(url = %about, "probing API prefix");
    match client.get(&about).send().await {
        Ok(response) if response.status() == StatusCode::OK => DIRECT_PREFIX,
        _ => PROXY_PREFIX,
    }
}

async fn error_detail(response: Response) -> (u16, Option<String>) {
    let status = response.status().as_u16();
    let detail = response
        .text()
        .await
        .ok()
        .and_then(|body| serde_json::from_str::<ErrorResponse>(&body).ok())
        .and_then(|error| error.detail)
        .filter(|detail| !detail.is_empty());
    (status, detail)
}

fn remote_error(context: &str, status: u16, detail: Option<String>) -> CommandError {
    match detail {
        Some(detail) => {
            CommandError::Remote(format!("{context}, the server response was: \"{detail}\""))
        }
        None => CommandError::Remote(format!(
            "{context}, the server response code was: \"{status}\""
        )),
    }
}

async fn read_archive(response: Response, not_found: String) -> Result<Vec<u8>> {
    let status = response.status();
    if status.as_u16() < 300 {
        let bytes = response
            .bytes()
            .await
            .map_err(CommandError::transport("could not read generated archive"))?;
        return Ok(bytes.to_vec());
    }
    if status == StatusCode::NOT_FOUND {
        return Err(CommandError::NotFound(not_found));
    }

    let (status, detail) = error_detail(response).await;
    Err(remote_error(
        "there was an error generating the accelerator",
        status,
        detail,
    ))
}

async fn check_tracking(response: Response, context: &str) -> Result<()> {
    if response.status().as_u16() < 400 {
        return Ok(());
    }
    let (status, detail) = error_detail(response).await;
    Err(remote_error(context, status, detail))
}
