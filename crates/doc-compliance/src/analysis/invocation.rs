use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope returned by a synchronous analysis function invocation.
///
/// A function that crashed reports `errorType`/`errorMessage` instead of a
/// status code. `body` is either the block array itself or a JSON string
/// holding it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode", default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(rename = "errorType", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(rename = "errorMessage", default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unexpected response body format: {0}")]
pub struct UnexpectedBody(pub String);

impl InvocationResponse {
    /// Body rendered verbatim for diagnostics.
    pub fn raw_body(&self) -> String {
        match &self.body {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    /// Block records carried in the body.
    pub fn block_records(&self) -> Result<Vec<Value>, UnexpectedBody> {
        match &self.body {
            Some(Value::String(text)) => {
                let parsed: Value = serde_json::from_str(text)
                    .map_err(|err| UnexpectedBody(format!("body is not JSON ({err})")))?;
                records_from_value(parsed)
            }
            Some(value) => records_from_value(value.clone()),
            None => Err(UnexpectedBody("body missing".to_string())),
        }
    }
}

fn records_from_value(value: Value) -> Result<Vec<Value>, UnexpectedBody> {
    match value {
        Value::Array(records) => Ok(records),
        Value::Object(mut object) => match object.remove("Blocks").or_else(|| object.remove("blocks")) {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(UnexpectedBody("object body has no block array".to_string())),
        },
        other => Err(UnexpectedBody(format!("expected blocks, found {other}"))),
    }
}

/// Payload for a synchronous invocation.
#[derive(Debug, Serialize)]
pub(crate) enum InvocationPayload<'a> {
    #[serde(rename = "S3Object")]
    S3Object {
        #[serde(rename = "Bucket")]
        bucket: &'a str,
        #[serde(rename = "Name")]
        name: &'a str,
    },
    #[serde(rename = "image")]
    Image(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_body_is_parsed_as_json() {
        let response = InvocationResponse {
            status_code: Some(200),
            body: Some(json!("[{\"Id\": \"l1\", \"BlockType\": \"LINE\"}]")),
            ..InvocationResponse::default()
        };
        let records = response.block_records().expect("records decode");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn inline_array_and_wrapped_object_bodies_are_accepted() {
        let inline = InvocationResponse {
            status_code: Some(200),
            body: Some(json!([{"Id": "l1"}, {"Id": "l2"}])),
            ..InvocationResponse::default()
        };
        assert_eq!(inline.block_records().expect("inline").len(), 2);

        let wrapped = InvocationResponse {
            status_code: Some(200),
            body: Some(json!({"Blocks": [{"Id": "l1"}]})),
            ..InvocationResponse::default()
        };
        assert_eq!(wrapped.block_records().expect("wrapped").len(), 1);
    }

    #[test]
    fn scalar_body_is_rejected() {
        let response = InvocationResponse {
            status_code: Some(200),
            body: Some(json!(42)),
            ..InvocationResponse::default()
        };
        assert!(response.block_records().is_err());
    }

    #[test]
    fn payload_uses_function_field_names() {
        let located = serde_json::to_value(InvocationPayload::S3Object {
            bucket: "docs",
            name: "reports/a.pdf",
        })
        .expect("payload encodes");
        assert_eq!(located, json!({"S3Object": {"Bucket": "docs", "Name": "reports/a.pdf"}}));

        let inline = serde_json::to_value(InvocationPayload::Image("aGk=".to_string()))
            .expect("payload encodes");
        assert_eq!(inline, json!({"image": "aGk="}));
    }
}
