// relayctl - app/api_client.rs
//
// Authenticated HTTP client for the relay service.
//
// One request per operation, no retries. Every failure is mapped onto
// `ApiError` so callers never see a raw transport error.
//
// Mapping order:
//   transport timeout  -> TimedOut
//   transport failure  -> ConnectionFailed
//   401 / 403 / 404    -> AuthenticationFailed / Forbidden / NotFound
//   5xx                -> ServerError
//   other non-2xx      -> ClientError (service `message` or "HTTP <code> <reason>")
//   204                -> T::default()
//   other 2xx          -> JSON body, InvalidResponse if it does not decode

use crate::core::model::{
    ConfigRecord, EnvironmentsResponse, LogEntry, LogQuery, LogsResponse, Metrics,
    RemoteEnvironment, UserInfo, WebhookStatus,
};
use crate::platform::config::AppConfig;
use crate::util::constants;
use crate::util::error::ApiError;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

type Result<T> = std::result::Result<T, ApiError>;

/// Transport settings shared by every request a client makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Budget for one request: connect, send and body read.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(constants::DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: constants::USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for ClientSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: config.request_timeout,
            ..Self::default()
        }
    }
}

/// Client bound to one profile's credentials and base URL.
///
/// Immutable after construction; cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    base_url: String,
    api_key: String,
    user_id: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client for `record`.
    ///
    /// Fails with `MissingCredential` when the record has no API key and with
    /// `ConnectionFailed` when the API URL cannot be parsed. No network
    /// traffic happens here.
    pub fn new(record: &ConfigRecord, settings: &ClientSettings) -> Result<Self> {
        let api_key = match record.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => return Err(ApiError::MissingCredential),
        };

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(&settings.user_agent)
            .build()
            .map_err(|e| ApiError::ConnectionFailed(format!("failed to build HTTP client: {e}")))?;

        let base_url = record.api_url.trim().trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ApiError::ConnectionFailed(format!("invalid API URL '{base_url}'")))?;

        Ok(Self {
            http,
            base,
            base_url,
            api_key,
            user_id: record.user_id.clone(),
        })
    }

    /// Base URL requests are sent to, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// `GET /user/me`: identity behind the API key.
    pub async fn get_user_info(&self) -> Result<UserInfo> {
        let url = self.url(&["user", "me"])?;
        self.execute(self.request(Method::GET, url)).await
    }

    /// `GET /user/{id}/webhook/status`.
    pub async fn get_webhook_status(&self) -> Result<WebhookStatus> {
        let url = self.user_url(&["webhook", "status"])?;
        self.execute(self.request(Method::GET, url)).await
    }

    /// `GET /user/{id}/webhook/logs`, sending only the filters that are set.
    pub async fn get_webhook_logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        let url = self.user_url(&["webhook", "logs"])?;
        let request = self.request(Method::GET, url).query(&query.to_params());
        let response: LogsResponse = self.execute(request).await?;
        Ok(response.logs)
    }

    /// `POST /user/{id}/webhook/test`.
    pub async fn send_test_webhook(
        &self,
        environment: &str,
        payload: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        #[derive(Serialize)]
        struct Body<'a> {
            environment: &'a str,
            payload: Option<&'a serde_json::Value>,
        }

        let url = self.user_url(&["webhook", "test"])?;
        let request = self
            .request(Method::POST, url)
            .json(&Body { environment, payload });
        self.execute(request).await
    }

    /// `POST /user/{id}/webhook/replay`.
    pub async fn replay_webhook(&self, webhook_id: &str) -> Result<serde_json::Value> {
        let url = self.user_url(&["webhook", "replay"])?;
        let request = self
            .request(Method::POST, url)
            .json(&serde_json::json!({ "webhook_id": webhook_id }));
        self.execute(request).await
    }

    /// `GET /user/{id}/webhook/{webhook_id}`.
    ///
    /// The id is sent as a single percent-encoded path segment. An id that
    /// cannot name a segment (empty, `.` or `..`) is `NotFound` without a
    /// request.
    pub async fn get_webhook_detail(&self, webhook_id: &str) -> Result<serde_json::Value> {
        if matches!(webhook_id, "" | "." | "..") {
            return Err(ApiError::NotFound);
        }
        let url = self.user_url(&["webhook", webhook_id])?;
        self.execute(self.request(Method::GET, url)).await
    }

    /// `GET /user/{id}/metrics?days=N`.
    pub async fn get_metrics(&self, days: u32) -> Result<Metrics> {
        let url = self.user_url(&["metrics"])?;
        let request = self.request(Method::GET, url).query(&[("days", days)]);
        self.execute(request).await
    }

    /// `PUT /user/{id}/endpoints`: register `url` for `environment` remotely.
    pub async fn update_endpoint(&self, environment: &str, url: &str) -> Result<serde_json::Value> {
        let endpoint_url = self.user_url(&["endpoints"])?;
        let request = self
            .request(Method::PUT, endpoint_url)
            .json(&serde_json::json!({ "environment": environment, "url": url }));
        self.execute(request).await
    }

    /// `GET /user/{id}/environments`.
    pub async fn list_environments(&self) -> Result<Vec<RemoteEnvironment>> {
        let url = self.user_url(&["environments"])?;
        let response: EnvironmentsResponse =
            self.execute(self.request(Method::GET, url)).await?;
        Ok(response.environments)
    }

    // -------------------------------------------------------------------------
    // Plumbing
    // -------------------------------------------------------------------------

    /// Base URL with `segments` appended. Each segment is percent-encoded,
    /// so `/`, `?` and `#` inside an id stay inside that segment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::ConnectionFailed(format!("invalid API URL '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `/user/{id}/...` under the base URL.
    fn user_url(&self, rest: &[&str]) -> Result<Url> {
        let mut segments = vec!["user", self.user_id.as_str()];
        segments.extend_from_slice(rest);
        self.url(&segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
    }

    async fn execute<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let started = Instant::now();
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.bytes().await.map_err(map_transport_error)?;

        tracing::debug!(
            path = %url,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Service responded"
        );

        let decoded = decode_response(status, &body);
        if let Err(ref e) = decoded {
            tracing::debug!(path = %url, error = %e, "Request failed");
        }
        decoded
    }
}

/// Map a reqwest transport error. Timeouts are checked first: a connect
/// timeout is a timeout, not a refused connection.
pub(crate) fn map_transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::TimedOut
    } else if e.is_connect() {
        ApiError::ConnectionFailed(e.to_string())
    } else {
        ApiError::ConnectionFailed(format!("network error: {e}"))
    }
}

/// Turn a status line and body into a typed result.
pub fn decode_response<T>(status: StatusCode, body: &[u8]) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match status.as_u16() {
        204 => Ok(T::default()),
        200..=299 => {
            serde_json::from_slice(body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
        }
        401 => Err(ApiError::AuthenticationFailed),
        403 => Err(ApiError::Forbidden),
        404 => Err(ApiError::NotFound),
        code if code >= 500 => Err(ApiError::ServerError { status: code }),
        code => Err(ApiError::ClientError {
            status: code,
            message: service_message(body).unwrap_or_else(|| status_line(status)),
        }),
    }
}

/// The `message` field of a JSON error body, if there is one.
fn service_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("HTTP {} {reason}", status.as_u16()),
        None => format!("HTTP {}", status.as_u16()),
    }
}
