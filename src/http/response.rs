//! Response wrapper around one Bot API call.
//!
//! Exposes the raw body, the lazily decoded body as a [`ResponseObject`]
//! and [`result`](TelegramResponse::result), which unwraps the API envelope
//! (`ok` / `result` / `error_code` + `description`).

use std::sync::OnceLock;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::objects::{NO_RELATIONS, ResponseObject, ResponseValue};

/// The decoded response to one API call.
#[derive(Debug)]
pub struct TelegramResponse {
    endpoint: String,
    status: u16,
    body: String,
    decoded: OnceLock<ResponseObject>,
}

impl TelegramResponse {
    /// Wraps a raw transport response.
    pub fn new(endpoint: &str, status: u16, body: String) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            status,
            body,
            decoded: OnceLock::new(),
        }
    }

    /// The API endpoint this response answers.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Transport-level status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Whether the transport-level status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The raw, undecoded body.
    pub fn raw_body(&self) -> &str {
        &self.body
    }

    /// The decoded body. Decoding happens once; later calls return the
    /// cached object.
    pub fn object(&self) -> Result<ResponseObject> {
        if let Some(object) = self.decoded.get() {
            return Ok(object.clone());
        }
        let raw: Map<String, Value> = serde_json::from_str(&self.body)?;
        let object = ResponseObject::with_relations(raw, NO_RELATIONS);
        // A concurrent decode may have won the race; either instance is
        // equivalent.
        let _ = self.decoded.set(object.clone());
        Ok(object)
    }

    /// Unwraps the envelope's `result` field.
    ///
    /// An `ok = false` envelope surfaces as [`Error::Api`] with the remote
    /// code and description preserved. A body that is not a valid envelope
    /// on a non-2xx status surfaces as [`Error::Transport`], so callers can
    /// distinguish "network failure" from "API rejected this call".
    pub fn result(&self) -> Result<ResponseValue> {
        let object = match self.object() {
            Ok(object) => object,
            Err(err) => {
                if !self.is_success() {
                    return Err(Error::Transport {
                        endpoint: self.endpoint.clone(),
                        reason: format!("HTTP {}: undecodable body", self.status),
                    });
                }
                return Err(err);
            }
        };

        if object.get_bool("ok") == Some(true) {
            return Ok(object.get("result"));
        }

        Err(Error::Api {
            endpoint: self.endpoint.clone(),
            error_code: object.get_i64("error_code").unwrap_or(self.status as i64),
            description: object
                .get_str("description")
                .unwrap_or_else(|| "no description".to_string()),
        })
    }

    /// Unwraps the envelope's `result` field as an object.
    pub fn result_object(&self) -> Result<ResponseObject> {
        self.result()?.into_object().ok_or_else(|| {
            Error::Decode(format!(
                "'{}' returned a non-object result",
                self.endpoint
            ))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> TelegramResponse {
        TelegramResponse::new("sendMessage", status, body.to_string())
    }

    #[test]
    fn success_envelope_unwraps_result() {
        let resp = response(200, r#"{"ok":true,"result":{"message_id":7}}"#);
        let result = resp.result_object().unwrap();
        assert_eq!(result.get_i64("message_id"), Some(7));
    }

    #[test]
    fn failure_envelope_surfaces_as_api_error() {
        let resp = response(
            400,
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        );
        match resp.result() {
            Err(Error::Api {
                endpoint,
                error_code,
                description,
            }) => {
                assert_eq!(endpoint, "sendMessage");
                assert_eq!(error_code, 400);
                assert!(description.contains("chat not found"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn undecodable_body_on_http_error_is_a_transport_error() {
        let resp = response(502, "<html>bad gateway</html>");
        assert!(matches!(resp.result(), Err(Error::Transport { .. })));
    }

    #[test]
    fn undecodable_body_on_success_is_a_decode_error() {
        let resp = response(200, "not json");
        assert!(matches!(resp.result(), Err(Error::Decode(_))));
    }

    #[test]
    fn decoding_is_cached() {
        let resp = response(200, r#"{"ok":true,"result":true}"#);
        let first = resp.object().unwrap();
        let second = resp.object().unwrap();
        assert!(first.same_instance(&second));
    }

    #[test]
    fn scalar_results_pass_through() {
        let resp = response(200, r#"{"ok":true,"result":true}"#);
        assert_eq!(resp.result().unwrap(), ResponseValue::Bool(true));
        assert!(resp.result_object().is_err());
    }
}
