//! REST request client.
//!
//! Attaches the bearer token of the current session, unwraps the
//! `{success, data | error}` envelope and normalizes every failure into an
//! [`ApiError`]. A 401 clears the stored session and redirects to login
//! before the error is returned, unless the session was replaced while the
//! request was in flight. Requests are never retried.

use crate::config::ClientConfig;
use crate::nav::Navigator;
use crate::session::SessionRepository;
use notebook_core::{ApiError, ApiResult, Envelope, ErrorCode};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    sessions: Arc<dyn SessionRepository>,
    navigator: Navigator,
}

impl RestClient {
    pub fn new(
        config: &ClientConfig,
        sessions: Arc<dyn SessionRepository>,
        navigator: Navigator,
    ) -> ApiResult<Self> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::unknown(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            sessions,
            navigator,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }

    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), url);
        let sent_token = self.sessions.get().map(|session| session.token);
        if let Some(token) = &sent_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%method, path, error = %err, "request failed without a response");
                return Err(transport_error(&err));
            }
        };

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%method, path, status = status.as_u16(), error = %err, "failed to read response body");
                return Err(transport_error(&err));
            }
        };
        debug!(%method, path, status = status.as_u16(), bytes = bytes.len(), "request completed");

        let result = interpret_response::<T>(status, &bytes);
        if let Err(err) = &result {
            warn!(%method, path, status = status.as_u16(), code = %err.code, "request rejected");
        }
        if status == StatusCode::UNAUTHORIZED {
            self.on_unauthorized(sent_token.as_deref());
        }
        result
    }

    /// Sign out after the server rejected `sent_token`. A session stored
    /// after the request was sent is left in place.
    fn on_unauthorized(&self, sent_token: Option<&str>) {
        if let Some(current) = self.sessions.get() {
            if sent_token != Some(current.token.as_str()) {
                debug!("401 answered a replaced session; keeping the current one");
                return;
            }
        }
        if let Err(err) = self.sessions.clear() {
            warn!(error = %err, "failed to erase stored session after 401");
        }
        info!("session rejected by server; signed out");
        self.navigator.redirect_to_login();
    }
}

/// Map a send/receive failure. Anything that happened after the request was
/// built counts as "no response".
fn transport_error(err: &reqwest::Error) -> ApiError {
    if err.is_builder() {
        ApiError::unknown(err.to_string())
    } else {
        ApiError::network().with_details(Value::String(err.to_string()))
    }
}

fn interpret_response<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> ApiResult<T> {
    let code = status.as_u16();
    let body: Option<Value> = if bytes.is_empty() {
        Some(Value::Null)
    } else {
        serde_json::from_slice(bytes).ok()
    };

    if status.is_success() {
        let payload = match body.map(Envelope::from_value) {
            Some(Envelope::Success(data)) | Some(Envelope::Bare(data)) => data,
            Some(Envelope::Failure(err)) => return Err(err.into_api_error(Some(code))),
            None => {
                return Err(ApiError::invalid_response("Response body is not valid JSON")
                    .with_status(code))
            }
        };
        return serde_json::from_value::<T>(payload).map_err(|e| {
            ApiError::invalid_response(format!("Unexpected response payload: {}", e))
                .with_status(code)
        });
    }

    match body.map(Envelope::from_value) {
        Some(Envelope::Failure(err)) => Err(err.into_api_error(Some(code))),
        Some(Envelope::Success(data)) | Some(Envelope::Bare(data)) => {
            let message = data
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| status_message(status));
            let err = ApiError::new(ErrorCode::HttpError.as_str(), message).with_status(code);
            Err(if data.is_null() { err } else { err.with_details(data) })
        }
        None => {
            let text = String::from_utf8_lossy(bytes).trim().to_string();
            let message = if text.is_empty() {
                status_message(status)
            } else {
                text
            };
            Err(ApiError::new(ErrorCode::HttpError.as_str(), message).with_status(code))
        }
    }
}

fn status_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| ErrorCode::HttpError.default_message().to_string())
}
