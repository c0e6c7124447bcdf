//! RPC interface between the daemon and its clients.
//!
//! Requests travel over a Unix socket as length-delimited JSON frames. The
//! response payloads keep the `{ok, ...}` shape clients of the calculator
//! already expect.

pub mod client;
pub mod server;

use serde::{Deserialize, Serialize};

use crate::calculator::ErrorKind;
use crate::history::HistoryEntry;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalRequest {
    /// Missing means empty, which evaluates to zero.
    #[serde(default)]
    pub expression: Option<String>,
    /// `standard` or `scientific`; anything else is treated as `standard`.
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvalResponse {
    pub fn success(result: String) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(kind: ErrorKind) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(kind.to_string()),
        }
    }
}

impl From<Result<String, ErrorKind>> for EvalResponse {
    fn from(outcome: Result<String, ErrorKind>) -> Self {
        match outcome {
            Ok(result) => Self::success(result),
            Err(kind) => Self::failure(kind),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub ok: bool,
    /// Newest first.
    pub items: Vec<HistoryEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearResponse {
    pub ok: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub ok: bool,
    pub total: usize,
    /// Timestamp of the newest entry, if any.
    pub last: Option<String>,
}

/// Operations served by the daemon.
#[tarpc::service]
pub trait Calculator {
    /// Evaluate an expression and record it on success.
    async fn eval(request: EvalRequest) -> EvalResponse;
    /// Most recent evaluations, newest first.
    async fn history() -> HistoryResponse;
    async fn clear_history() -> ClearResponse;
    async fn stats() -> StatsResponse;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_eval_response_shape() {
        let ok = serde_json::to_value(EvalResponse::success("4".into())).unwrap();
        assert_eq!(ok, serde_json::json!({"ok": true, "result": "4"}));

        let err = serde_json::to_value(EvalResponse::failure(ErrorKind::DivideByZero)).unwrap();
        assert_eq!(err, serde_json::json!({"ok": false, "error": "Divide by zero"}));
    }

    #[test]
    fn test_eval_request_fields_optional() {
        let request: EvalRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, EvalRequest::default());

        let request: EvalRequest =
            serde_json::from_str(r#"{"expression": "1+1", "mode": "scientific"}"#).unwrap();
        assert_eq!(request.expression.as_deref(), Some("1+1"));
        assert_eq!(request.mode.as_deref(), Some("scientific"));
    }
}
