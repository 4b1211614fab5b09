use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

const REQUEST_FAILED: &str = "Request failed";

/// A non-success HTTP response, normalised to a message and status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RequestError {
    pub message: String,
    pub status: u16,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The request never produced a response (connection refused, DNS, TLS...).
    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("the server returned no content where a body was expected")]
    NoContent,
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e)
    }
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request(e) => Some(e.status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) | ApiError::NoContent => None,
        }
    }
}

/// The shapes an error body is known to take.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    Str(String),
    Obj {
        #[serde(default)]
        detail: Option<Detail>,
        #[serde(default)]
        message: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Detail {
    Str(String),
    List(Vec<DetailItem>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DetailItem {
    Msg { msg: String },
    Str(String),
    Other(serde_json::Value),
}

impl Detail {
    fn message(&self) -> Option<String> {
        match self {
            Detail::Str(s) => Some(s.clone()),
            Detail::List(items) => items.first().map(|item| match item {
                DetailItem::Msg { msg } => msg.clone(),
                DetailItem::Str(s) => s.clone(),
                DetailItem::Other(v) => v.to_string(),
            }),
        }
    }
}

impl ErrorPayload {
    /// `detail` wins when it yields a non-empty message, otherwise `message` is used.
    pub fn message(&self) -> Option<String> {
        match self {
            ErrorPayload::Str(s) => Some(s.clone()),
            ErrorPayload::Obj { detail, message } => detail
                .as_ref()
                .and_then(Detail::message)
                .filter(|m| !m.is_empty())
                .or_else(|| message.clone()),
        }
    }
}

impl RequestError {
    /// Decodes an error body once; anything unrecognised falls back to the status phrase.
    pub fn from_response_body(status: StatusCode, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorPayload>(body)
            .ok()
            .and_then(|payload| payload.message())
            .filter(|m| !m.is_empty())
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| REQUEST_FAILED.to_string());

        Self {
            message,
            status: status.as_u16(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(status: u16, body: &str) -> RequestError {
        RequestError::from_response_body(StatusCode::from_u16(status).unwrap(), body.as_bytes())
    }

    #[test]
    fn validation_list_uses_first_msg() {
        let err = decode(422, r#"{"detail":[{"msg":"bad format"},{"msg":"second"}]}"#);
        assert_eq!(err.message, "bad format");
        assert_eq!(err.status, 422);
    }

    #[test]
    fn detail_string_is_used_verbatim() {
        let err = decode(400, r#"{"detail":"Employee ID 'EMP-1' already exists"}"#);
        assert_eq!(err.message, "Employee ID 'EMP-1' already exists");
    }

    #[test]
    fn detail_list_of_strings() {
        let err = decode(400, r#"{"detail":["first problem"]}"#);
        assert_eq!(err.message, "first problem");
    }

    #[test]
    fn message_field_and_bare_string() {
        assert_eq!(decode(500, r#"{"message":"boom"}"#).message, "boom");
        assert_eq!(decode(503, r#""down for maintenance""#).message, "down for maintenance");
    }

    #[test]
    fn empty_detail_falls_through_to_message() {
        assert_eq!(decode(400, r#"{"detail":"","message":"boom"}"#).message, "boom");
        assert_eq!(decode(400, r#"{"detail":[],"message":"boom"}"#).message, "boom");
        assert_eq!(decode(400, r#"{"detail":null,"message":"boom"}"#).message, "boom");
        assert_eq!(decode(400, r#"{"detail":"first","message":"second"}"#).message, "first");
    }

    #[test]
    fn unknown_or_empty_body_falls_back_to_status_phrase() {
        assert_eq!(decode(404, "").message, "Not Found");
        assert_eq!(decode(500, "<html>oops</html>").message, "Internal Server Error");
        assert_eq!(decode(409, r#"{"error":"x"}"#).message, "Conflict");
        assert_eq!(decode(400, r#"{"detail":[]}"#).message, "Bad Request");
    }

    #[test]
    fn unregistered_status_without_body_still_has_a_message() {
        let err = decode(599, "");
        assert_eq!(err.message, "Request failed");
        assert_eq!(err.status, 599);
    }
}
