// Error taxonomy for the HTTP actions, plus the text printed for each
// failure class.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of one HTTP action. The variants follow the classes the user is
/// told about: timeouts, unreachable server, error statuses, and the rest.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request timeout")]
    Timeout,

    #[error("Cannot connect to server")]
    Connect,

    #[error("{status} for url: {url}")]
    Status {
        status: StatusCode,
        url: String,
        /// Present when the error body was a JSON object.
        server_error: Option<String>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("{0}")]
    Request(reqwest::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Connect
        } else {
            ApiError::Request(err)
        }
    }
}

impl ApiError {
    /// Build a `Status` error from a non-2xx response body. The server's
    /// `error` field is extracted best-effort; bodies that are not a JSON
    /// object leave `server_error` empty.
    pub fn from_status(status: StatusCode, url: &str, body: &str) -> Self {
        ApiError::Status {
            status,
            url: url.to_string(),
            server_error: server_error_message(body),
        }
    }

    /// Lines shown to the user. `action` completes "Error <action>: ..." for
    /// failures that have no dedicated message.
    pub fn user_lines(&self, action: &str) -> Vec<String> {
        match self {
            ApiError::Timeout | ApiError::Connect => vec![format!("Error: {}", self)],
            ApiError::Status { server_error, .. } => {
                let mut lines = vec![format!("Error: {}", self)];
                if let Some(msg) = server_error {
                    lines.push(format!("Server error: {}", msg));
                }
                lines
            }
            _ => vec![format!("Error {}: {}", action, self)],
        }
    }
}

fn server_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let obj = value.as_object()?;
    let msg = match obj.get("error") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "Unknown error".to_string(),
    };
    Some(msg)
}
