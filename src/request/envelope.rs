//! Terminal (and partial) response results.

use crate::adapter::decoder::{DecodeError, Payload};
use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured failure carried by a [`ResponseEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    pub message: String,
    pub code: Option<String>,
    pub body: Option<String>,
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Either a decoded payload or a structured error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ResponseEnvelope {
    Success(Payload),
    Failure(ResponseError),
}

impl ResponseEnvelope {
    pub fn success(payload: Payload) -> Self {
        ResponseEnvelope::Success(payload)
    }

    /// Error envelope for a service-reported `(code, message, body)` triple.
    ///
    /// The message reads `"{code} - {message}"`; an empty body is dropped.
    pub fn from_error(code: &str, message: &str, body: &str) -> Self {
        ResponseEnvelope::Failure(ResponseError {
            message: format!("{} - {}", code, message),
            code: Some(code.to_string()),
            body: (!body.is_empty()).then(|| body.to_string()),
        })
    }

    /// Error envelope for a local failure with no service code.
    pub fn from_message(message: impl Into<String>) -> Self {
        ResponseEnvelope::Failure(ResponseError {
            message: message.into(),
            code: None,
            body: None,
        })
    }

    pub fn from_decode_error(error: &DecodeError) -> Self {
        ResponseEnvelope::Failure(ResponseError {
            message: error.to_string(),
            code: Some(defaults::DECODE_ERROR_CODE.to_string()),
            body: Some(error.excerpt.clone()),
        })
    }

    /// Build from a decoder result.
    pub fn build(decoded: Result<Payload, DecodeError>) -> Self {
        match decoded {
            Ok(payload) => Self::success(payload),
            Err(e) => Self::from_decode_error(&e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success(_))
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            ResponseEnvelope::Success(payload) => Some(payload),
            ResponseEnvelope::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ResponseError> {
        match self {
            ResponseEnvelope::Success(_) => None,
            ResponseEnvelope::Failure(error) => Some(error),
        }
    }
}
