use crate::errors::SessionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound JSON-RPC request payload.
#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a [Value],
}

impl<'a> JsonRpcRequest<'a> {
    pub(crate) const fn new(id: u64, method: &'a str, params: &'a [Value]) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }

    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>, SessionError> {
        serde_json::to_vec(self)
            .map_err(|error| SessionError::invalid_response(self.method, error.to_string()))
    }
}

/// Error object carried by a failed JSON-RPC response.
#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcErrorObject {
    pub(crate) code: i64,
    #[serde(default)]
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) data: Option<Value>,
}

/// Extract the `result` member of a JSON-RPC response body.
///
/// A `null` result is a valid answer (e.g. a pending receipt) and is returned
/// as [`Value::Null`]; only a missing member is an error.
pub(crate) fn parse_response(method: &str, body: &[u8]) -> Result<Value, SessionError> {
    if body.is_empty() {
        return Err(SessionError::invalid_response(method, "empty body"));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|error| SessionError::invalid_response(method, error.to_string()))?;

    let Value::Object(mut object) = value else {
        return Err(SessionError::invalid_response(
            method,
            "JSON-RPC response must be an object",
        ));
    };

    if let Some(error) = object.remove("error").filter(|error| !error.is_null()) {
        let error: JsonRpcErrorObject = serde_json::from_value(error)
            .map_err(|error| SessionError::invalid_response(method, error.to_string()))?;
        return Err(SessionError::Protocol {
            method: method.to_string(),
            code: error.code,
            message: error.message,
            data: error.data,
        });
    }

    object
        .remove("result")
        .ok_or_else(|| SessionError::invalid_response(method, "response carries no result"))
}
