//! Canonical operation record and the normalization rules that build it.
//!
//! Every transport shape the endpoint accepts (GET query string, POST JSON
//! body, multipart form fields) funnels into one [`OperationInvocation`]
//! before dispatch. Normalization failures are [`MalformedRequest`] values,
//! answered with HTTP 400 before the engine is ever involved.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::MalformedRequest;

/// A JSON object in client key order.
pub type JsonObject = serde_json::Map<String, Value>;

/// One GraphQL operation request, normalized.
///
/// Built once per request and not modified afterwards; `variables` is never
/// absent at dispatch time — every input shape that omits it produces an
/// empty map here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationInvocation {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_variables",
        skip_serializing_if = "JsonObject::is_empty"
    )]
    pub variables: JsonObject,
}

impl OperationInvocation {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            operation_name: None,
            variables: JsonObject::new(),
        }
    }
}

/// Accepts a JSON object, a JSON-encoded string containing an object, or
/// null. Both non-null forms deserialize to the same map; anything else is
/// rejected.
fn deserialize_variables<'de, D>(deserializer: D) -> Result<JsonObject, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(JsonObject::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => Err(serde::de::Error::custom(
                "variables should be either an object or a string containing an object",
            )),
        },
        Some(_) => Err(serde::de::Error::custom(
            "variables should be either an object or a string",
        )),
    }
}

/// Parse standalone `variables` text, which must be a JSON object document.
pub fn parse_variables_text(text: &str) -> Result<JsonObject, MalformedRequest> {
    serde_json::from_str::<JsonObject>(text).map_err(|e| MalformedRequest::InvalidVariables {
        detail: e.to_string(),
    })
}

/// Normalize a POST JSON body.
pub fn from_json_body(body: &[u8]) -> Result<OperationInvocation, MalformedRequest> {
    serde_json::from_slice::<OperationInvocation>(body).map_err(|e| {
        MalformedRequest::InvalidJsonBody {
            detail: e.to_string(),
        }
    })
}

/// Normalize GET query parameters. `query` is required; `variables`, when
/// present, must be JSON object text.
pub fn from_query_params(
    params: &HashMap<String, String>,
) -> Result<OperationInvocation, MalformedRequest> {
    let query = params
        .get("query")
        .cloned()
        .ok_or(MalformedRequest::MissingQueryParam)?;
    let variables = match params.get("variables") {
        Some(text) => parse_variables_text(text)?,
        None => JsonObject::new(),
    };
    Ok(OperationInvocation {
        query,
        operation_name: params.get("operationName").cloned(),
        variables,
    })
}

/// Normalize multipart form fields.
///
/// A `graphql` part is a complete JSON document and wins over a raw `query`
/// part when both are present. With neither, the request is malformed. The
/// `operationName` part is trimmed and dropped when empty; an empty
/// `variables` part counts as absent.
pub fn from_multipart_fields(
    graphql: Option<&[u8]>,
    query: Option<&str>,
    operation_name: Option<&str>,
    variables: Option<&str>,
) -> Result<OperationInvocation, MalformedRequest> {
    if let Some(document) = graphql {
        return from_json_body(document);
    }
    let Some(query) = query else {
        return Err(MalformedRequest::MissingOperationPart);
    };
    let operation_name = operation_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    let variables = match variables.filter(|text| !text.is_empty()) {
        Some(text) => parse_variables_text(text)?,
        None => JsonObject::new(),
    };
    Ok(OperationInvocation {
        query: query.to_string(),
        operation_name,
        variables,
    })
}
