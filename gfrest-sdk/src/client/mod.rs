//! HTTP client for the Gravity Forms REST API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the signing primitives do not pull in `reqwest`.

use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use crate::NAMESPACE;
use crate::objects::RestErrorBody;
use crate::signature::{SignedRequest, expires_in};

/// Default lifetime of a request signature, in seconds.
pub const DEFAULT_SIGNATURE_LIFETIME: i64 = 5 * 60;

/// Errors produced by [`RestClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a REST error body.
    #[error("api error: {0}")]
    Api(RestErrorBody),

    /// The server returned a non-2xx status without a REST error body.
    #[error("unexpected status {status}, body: {body}")]
    Status { status: StatusCode, body: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Typed HTTP client that signs every request with a public/private key pair.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: Url,
    url_prefix: String,
    public_key: String,
    private_key: Vec<u8>,
    lifetime: i64,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("url_prefix", &self.url_prefix)
            .field("public_key", &self.public_key)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Create a new `RestClient`.
    ///
    /// * `base_url` – site root (e.g. `https://forms.example.com/blog/`).
    /// * `public_key` / `private_key` – the credential to sign with.
    pub fn new(
        base_url: Url,
        public_key: impl Into<String>,
        private_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url,
            url_prefix: "wp-json".to_string(),
            public_key: public_key.into(),
            private_key: private_key.into(),
            lifetime: DEFAULT_SIGNATURE_LIFETIME,
        }
    }

    /// Replace the default `reqwest::Client` (e.g. to configure timeouts).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Use a REST URL prefix other than `wp-json`.
    pub fn with_url_prefix(mut self, prefix: impl AsRef<str>) -> Self {
        self.url_prefix = prefix.as_ref().trim_matches('/').to_string();
        self
    }

    /// Seconds each signature stays valid.
    pub fn with_signature_lifetime(mut self, seconds: i64) -> Self {
        self.lifetime = seconds;
        self
    }

    /// Build the signed URL for `method route`, valid until `expires`.
    ///
    /// `route` is relative to the `gf/v2` namespace, e.g. `forms/1/entries`.
    pub fn signed_url(&self, method: &Method, route: &str, expires: i64) -> Result<Url, ClientError> {
        let route = route.trim_start_matches('/');
        let route = route.strip_suffix('/').unwrap_or(route);
        let mut url = self
            .base_url
            .join(&format!("{}/{NAMESPACE}/{route}", self.url_prefix))?;
        let signed = SignedRequest::sign(
            self.public_key.as_str(),
            &self.private_key,
            method.as_str(),
            route,
            expires,
        );
        signed.append_to_url(&mut url);
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(&self, route: &str) -> Result<T, ClientError> {
        self.send::<(), T>(Method::GET, route, None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        route: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(Method::POST, route, Some(body)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        route: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(Method::PUT, route, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, route: &str) -> Result<T, ClientError> {
        self.send::<(), T>(Method::DELETE, route, None).await
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        route: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        let url = self.signed_url(&method, route, expires_in(self.lifetime))?;
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(body)?);
        }
        parse_response(request.send().await?).await
    }
}

async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(match serde_json::from_str::<RestErrorBody>(&body) {
            Ok(error) => ClientError::Api(error),
            Err(_) => ClientError::Status { status, body },
        });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
