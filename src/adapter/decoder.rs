use crate::defaults;
use serde_json::Value;
use thiserror::Error;

/// Structured payload produced by a decoder.
pub type Payload = Value;

/// A raw payload could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to decode payload: {message} (payload: {excerpt:?})")]
pub struct DecodeError {
    pub message: String,
    /// Leading characters of the offending payload.
    pub excerpt: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>, raw: &str) -> Self {
        Self {
            message: message.into(),
            excerpt: raw.chars().take(defaults::DECODE_EXCERPT_CHARS).collect(),
        }
    }
}

/// Trait for turning raw response text into a navigable tree.
///
/// This trait allows swapping implementations (JSON vs a vendor format).
pub trait PayloadDecoder: Send + Sync {
    fn decode(&self, raw: &str) -> Result<Payload, DecodeError>;
}

/// Decodes payloads as JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl PayloadDecoder for JsonDecoder {
    fn decode(&self, raw: &str) -> Result<Payload, DecodeError> {
        if raw.trim().is_empty() {
            return Err(DecodeError::new("empty payload", raw));
        }
        serde_json::from_str(raw).map_err(|e| DecodeError::new(e.to_string(), raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_decoder_parses_object() {
        let payload = JsonDecoder
            .decode(r#"{"text":"turn on the lights","intents":[{"name":"lights_on"}]}"#)
            .expect("valid json should decode");
        assert_eq!(payload["text"], json!("turn on the lights"));
        assert_eq!(payload["intents"][0]["name"], json!("lights_on"));
    }

    #[test]
    fn test_json_decoder_rejects_malformed_payload() {
        let err = JsonDecoder.decode("{\"text\": ").unwrap_err();
        assert_eq!(err.excerpt, "{\"text\": ");
        assert!(
            err.to_string().starts_with("Failed to decode payload:"),
            "unexpected message: {}",
            err
        );
    }

    #[test]
    fn test_json_decoder_rejects_blank_payload() {
        let err = JsonDecoder.decode("   ").unwrap_err();
        assert_eq!(err.message, "empty payload");
    }

    #[test]
    fn test_decode_error_excerpt_is_bounded() {
        let raw = "x".repeat(defaults::DECODE_EXCERPT_CHARS * 3);
        let err = DecodeError::new("bad", &raw);
        assert_eq!(err.excerpt.chars().count(), defaults::DECODE_EXCERPT_CHARS);
    }
}
