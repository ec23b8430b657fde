//! REST transport for the FleetLink API.
//!
//! [`Client`] executes one authenticated HTTP exchange per call and
//! normalizes its outcome: 2xx bodies are decoded as JSON, everything else
//! becomes a [`ClientError`] carrying the status code. Retry and backoff are
//! intentionally left to callers.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Production address of the FleetLink API.
pub const DEFAULT_ADDR: &str = "https://api.fleetlink.io";

/// Header carrying the API token on every request and stream handshake.
pub(crate) const API_TOKEN_HEADER: &str = "X-API-Token";

/// Authenticated client for the FleetLink REST API.
///
/// The address and token are immutable for the lifetime of the client, so a
/// single instance (or clones of it) can issue any number of concurrent
/// requests.
#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    addr: String,
    token: SecretString,
}

impl Client {
    /// Creates a client against the production API address.
    pub fn new(token: SecretString) -> Self {
        Self::with_addr(DEFAULT_ADDR, token)
    }

    /// Creates a client against an explicit base address.
    ///
    /// The address must carry an `http` or `https` scheme; it also determines
    /// the scheme of any output stream opened from this client.
    pub fn with_addr(addr: impl Into<String>, token: SecretString) -> Self {
        let addr = addr.into();
        Self {
            http: reqwest::Client::new(),
            addr: addr.trim_end().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Returns the base address this client talks to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub(crate) fn token(&self) -> &SecretString {
        &self.token
    }

    /// Fetches `path` and decodes the response body.
    ///
    /// An empty 2xx body is not an error; the default value is returned
    /// unmodified.
    pub async fn get<T>(&self, path: &str) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
    {
        Ok(self
            .request::<(), T>(Method::GET, path, None)
            .await?
            .unwrap_or_default())
    }

    /// Creates a resource by POSTing `body` to `path`.
    ///
    /// The decoded response body is returned; when the server responds with
    /// an empty body the input is echoed back unchanged.
    pub async fn create<T>(&self, path: &str, body: &T) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        Ok(self
            .request(Method::POST, path, Some(body))
            .await?
            .unwrap_or_else(|| body.clone()))
    }

    /// Updates a resource by PUTting `body` to `path`.
    ///
    /// Same echo semantics as [`Client::create`].
    pub async fn update<T>(&self, path: &str, body: &T) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        Ok(self
            .request(Method::PUT, path, Some(body))
            .await?
            .unwrap_or_else(|| body.clone()))
    }

    /// Deletes the resource at `path`, discarding any response body.
    pub async fn delete(&self, path: &str) -> Result<(), Error> {
        self.request::<(), IgnoredAny>(Method::DELETE, path, None)
            .await?;
        Ok(())
    }

    /// Executes one authenticated exchange against `path`.
    ///
    /// `body` is serialized as JSON when present and omitted entirely when
    /// `None`. On a 2xx response the body is decoded into `T`, with an empty
    /// body yielding `Ok(None)`. On any other status a [`ClientError`] with
    /// that status code is returned and the body is only consulted for its
    /// error message.
    pub async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.addr, path);
        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(API_TOKEN_HEADER, self.token.expose_secret());

        if let Some(body) = body {
            let payload = serde_json::to_vec(body).map_err(Error::Json)?;
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(payload);
        }

        let response = builder.send().await.map_err(Error::Transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(Error::Transport)?;

        debug!(
            event = "api_request_finished",
            method = %method,
            path,
            status = status.as_u16()
        );

        if !status.is_success() {
            return Err(Error::Client(ClientError {
                status,
                message: error_message(status, &bytes),
            }));
        }

        if bytes.is_empty() {
            return Ok(None);
        }

        serde_json::from_slice(&bytes).map(Some).map_err(Error::Json)
    }
}

/// Errors produced by the REST transport.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure: DNS, TCP, or TLS.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Malformed JSON in a request or response body.
    #[error("json error: {0}")]
    Json(#[source] serde_json::Error),
}

impl Error {
    /// Returns the HTTP status code when this is a [`ClientError`].
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Client(err) => Some(err.status),
            _ => None,
        }
    }
}

/// A non-2xx response from the API.
///
/// The message is taken from the response body when the server provided one,
/// otherwise it falls back to the generic description of the status.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("server returned {status}: {message}")]
pub struct ClientError {
    /// HTTP status code of the response.
    pub status: StatusCode,
    /// Server-supplied message, or the status description.
    pub message: String,
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    #[derive(Debug, Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return message;
        }
    }

    status
        .canonical_reason()
        .unwrap_or("unknown status")
        .to_string()
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use secrecy::SecretString;

    use super::{error_message, Client, ClientError, Error, DEFAULT_ADDR};

    fn client_with_addr(addr: &str) -> Client {
        Client::with_addr(addr, SecretString::new("test-token".to_string()))
    }

    #[test]
    fn client_uses_production_addr_by_default() {
        let client = Client::new(SecretString::new("test-token".to_string()));
        assert_eq!(client.addr(), DEFAULT_ADDR);
    }

    #[test]
    fn addr_is_trimmed() {
        let client = client_with_addr("https://api.dev.example/  \n");
        assert_eq!(client.addr(), "https://api.dev.example");

        let client = client_with_addr("https://api.dev.example/");
        assert_eq!(client.addr(), "https://api.dev.example");
    }

    #[test]
    fn error_message_prefers_server_message_field() {
        let message = error_message(
            StatusCode::NOT_FOUND,
            br#"{"message":"collection not found"}"#,
        );
        assert_eq!(message, "collection not found");
    }

    #[test]
    fn error_message_accepts_error_field() {
        let message = error_message(StatusCode::CONFLICT, br#"{"error":"already exists"}"#);
        assert_eq!(message, "already exists");
    }

    #[test]
    fn error_message_falls_back_to_status_description() {
        let message = error_message(StatusCode::NOT_FOUND, b"<html>nope</html>");
        assert_eq!(message, "Not Found");

        let message = error_message(StatusCode::IM_A_TEAPOT, b"");
        assert_eq!(message, "I'm a teapot");
    }

    #[test]
    fn status_is_exposed_for_client_errors_only() {
        let err = Error::Client(ClientError {
            status: StatusCode::NOT_FOUND,
            message: "missing".to_string(),
        });
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

        let err = Error::Json(serde_json::from_str::<u32>("[").unwrap_err());
        assert_eq!(err.status(), None);
    }
}
