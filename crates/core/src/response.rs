use std::fmt;

use serde::{Deserialize, Serialize};

/// Envelope returned by every analysis call.
///
/// Serializes as `{"success": true, ...payload, "message": ...}` or
/// `{"success": false, "error": ..., "message": ...}`. Callers check
/// `success` before reading the payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response<T> {
    pub success: bool,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
}

impl<T> Response<T> {
    pub fn ok(payload: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
            message: message.into(),
        }
    }

    pub fn failure(error: &impl fmt::Display, action: &str) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.to_string()),
            message: format!("Failed to {action}: {error}"),
        }
    }

    pub fn into_result(self) -> anyhow::Result<T> {
        match (self.success, self.payload) {
            (true, Some(payload)) => Ok(payload),
            _ => Err(anyhow::anyhow!(self
                .error
                .unwrap_or_else(|| self.message.clone()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Payload {
        value: u32,
    }

    #[test]
    fn success_flattens_payload() {
        let r = Response::ok(Payload { value: 7 }, "done");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["success"], true);
        assert_eq!(v["value"], 7);
        assert!(v.get("error").is_none());
    }

    #[test]
    fn failure_carries_error_and_message() {
        let r: Response<Payload> = Response::failure(&"boom", "run");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["error"], "boom");
        assert_eq!(v["message"], "Failed to run: boom");
        assert!(r.into_result().is_err());
    }

    #[test]
    fn success_round_trips_through_json() {
        let json = r#"{"success":true,"value":3,"message":"ok"}"#;
        let r: Response<Payload> = serde_json::from_str(json).unwrap();
        assert_eq!(r.into_result().unwrap(), Payload { value: 3 });
    }
}
