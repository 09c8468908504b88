//! HTTP transport built on `reqwest`.

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

use muzikax_core::error::{Error, InvalidInputError, TransportError, UpstreamError};
use muzikax_core::{AccessToken, Result};

use crate::config::ClientConfig;
use crate::endpoints::ErrorBody;
use crate::request::PendingRequest;

/// Thin wrapper over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the timeout and user agent from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(transport_error)?;

        Ok(Self { client })
    }

    /// Dispatch `request` with `token` attached as a bearer credential.
    ///
    /// Caller headers are applied first, then a JSON content type when a
    /// body is present and none was given, then `Authorization`, which
    /// always wins.
    #[instrument(skip(self, request, token), fields(method = %request.method(), url = %request.url()))]
    pub async fn dispatch(
        &self,
        request: &PendingRequest,
        token: &AccessToken,
    ) -> Result<reqwest::Response> {
        let mut headers = request.headers().clone();

        if request.body_bytes().is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let mut auth_value =
            HeaderValue::from_str(&token.bearer()).map_err(|e| InvalidInputError::Header {
                name: AUTHORIZATION.to_string(),
                reason: e.to_string(),
            })?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let mut builder = self
            .client
            .request(request.method().clone(), request.url())
            .headers(headers);

        if let Some(body) = request.body_bytes() {
            builder = builder.body(body.to_vec());
        }

        let response = builder.send().await.map_err(transport_error)?;
        trace!(status = %response.status(), "Response received");

        Ok(response)
    }

    /// Unauthenticated JSON POST, used for login and refresh.
    #[instrument(skip(self, body))]
    pub async fn post_json<B>(&self, url: &str, body: &B) -> Result<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        debug!("Unauthenticated POST");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        trace!(status = %response.status(), "Response received");
        Ok(response)
    }
}

/// Classify a `reqwest` failure.
pub(crate) fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            message: err.to_string(),
        }
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else if err.is_decode() {
        TransportError::Decode {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    }
}

/// Read the `message` field of an error body, if there is one.
pub(crate) async fn error_message(response: reqwest::Response) -> Option<String> {
    match response.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => None,
    }
}

/// Turn a non-2xx response into an [`UpstreamError`].
pub(crate) async fn upstream_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    Error::Upstream(UpstreamError::new(status, error_message(response).await))
}

/// Deserialize a successful response body.
pub(crate) async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> Result<R> {
    if response.status() == StatusCode::NO_CONTENT {
        return serde_json::from_value(serde_json::Value::Null).map_err(|e| {
            Error::Transport(TransportError::Decode {
                message: e.to_string(),
            })
        });
    }
    response
        .json::<R>()
        .await
        .map_err(|e| Error::Transport(transport_error(e)))
}
