// API client module: a small blocking HTTP client for the chat server.
// One call per action, no retries; every request is bounded by the
// configured timeout.

use anyhow::Context;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{LoginRequest, LoginResponse, Message, MessageList, SendRequest, SentMessage};

/// Page requested by `list_messages`.
pub const LIST_LIMIT: u32 = 100;

/// Process-lifetime session: where the server lives and the bearer token
/// once login succeeded. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub base_url: String,
    pub token: Option<String>,
}

/// Blocking client holding the reqwest client and the session.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    session: Session,
}

impl ApiClient {
    /// Create a client for `config.api_url` with the configured timeout.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            session: Session {
                base_url: config.api_url.clone(),
                token: None,
            },
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Store the bearer token for subsequent authenticated requests.
    pub fn set_token(&mut self, token: &str) {
        self.session.token = Some(token.to_string());
    }

    pub fn has_token(&self) -> bool {
        self.session.token.is_some()
    }

    /// Authorization header for the stored token. Fails before any network
    /// I/O when there is no token.
    fn auth_headers(&self) -> Result<HeaderMap, ApiError> {
        let token = self.session.token.as_deref().ok_or(ApiError::NotAuthenticated)?;
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ApiError::InvalidResponse(format!("unusable token: {}", e)))?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.session.base_url, path)
    }

    /// Exchange a username for a bearer token via `POST /login`. A response
    /// without a usable token yields `Ok(None)`.
    pub fn login(&self, username: &str) -> Result<Option<String>, ApiError> {
        let req = self.client.post(self.url("/login")).json(&LoginRequest { username });
        let resp: LoginResponse = execute(req)?;
        Ok(resp.token.filter(|t| !t.is_empty()))
    }

    /// Post a new message via `POST /messages`. Callers validate the text
    /// first (see `models::validate_text`).
    pub fn send_message(&self, text: &str) -> Result<SentMessage, ApiError> {
        let req = self
            .client
            .post(self.url("/messages"))
            .headers(self.auth_headers()?)
            .json(&SendRequest { text });
        execute(req)
    }

    /// Fetch the first page of messages, accepting both the bare-array and
    /// the wrapped response shape.
    pub fn list_messages(&self) -> Result<Vec<Message>, ApiError> {
        let url = self.url(&format!("/messages?limit={}&offset=0", LIST_LIMIT));
        let req = self.client.get(url).headers(self.auth_headers()?);
        let list: MessageList = execute(req)?;
        Ok(list.into_messages())
    }
}

/// Send a request, turn non-2xx statuses into `ApiError::Status` and decode
/// the JSON body of successful responses.
fn execute<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ApiError> {
    let res = req.send()?;
    let res = check_status(res)?;
    let body = res.text()?;
    serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

fn check_status(res: Response) -> Result<Response, ApiError> {
    let status = res.status();
    let url = res.url().to_string();
    debug!(%status, %url, "response received");
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().unwrap_or_default();
    Err(ApiError::from_status(status, &url, &body))
}
