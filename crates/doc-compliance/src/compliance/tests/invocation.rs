use super::common::*;
use crate::analysis::InvocationResponse;
use crate::compliance::ComplianceError;
use serde_json::json;

#[test]
fn error_envelope_short_circuits() {
    let response: InvocationResponse = serde_json::from_value(json!({
        "errorType": "InvalidS3ObjectException",
        "errorMessage": "Unable to get object metadata from S3"
    }))
    .expect("envelope decodes");

    let evaluation = evaluator()
        .evaluate_invocation(&response)
        .expect("error envelope yields verdict");
    assert!(!evaluation.verdict.passed());
    assert_eq!(
        evaluation.verdict.messages(),
        [
            "Error: InvalidS3ObjectException",
            "Message: Unable to get object metadata from S3"
        ]
    );
    assert!(evaluation.graph.is_none());
}

#[test]
fn non_200_status_carries_raw_body() {
    let response: InvocationResponse = serde_json::from_value(json!({
        "statusCode": 400,
        "body": "\"Unsupported document format\""
    }))
    .expect("envelope decodes");

    let evaluation = evaluator()
        .evaluate_invocation(&response)
        .expect("status failure yields verdict");
    assert_eq!(
        evaluation.verdict.messages(),
        ["Error: 400", "Message: \"Unsupported document format\""]
    );
}

#[test]
fn string_body_is_evaluated_for_missing_fields() {
    let body = json!([
        {"Id": "p1", "BlockType": "PAGE"},
        {"Id": "l1", "BlockType": "LINE", "Text": "Date:"},
        {"Id": "l2", "BlockType": "LINE", "Text": "Signature: J. Smith"},
        {"BlockType": "LINE", "Text": "no id"}
    ])
    .to_string();
    let response = InvocationResponse {
        status_code: Some(200),
        body: Some(json!(body)),
        ..InvocationResponse::default()
    };

    let evaluation = evaluator()
        .evaluate_invocation(&response)
        .expect("body decodes");
    assert_eq!(evaluation.verdict.messages(), ["Date: is missing a value"]);
    let graph = evaluation.graph.expect("graph built");
    assert_eq!(graph.skipped_records(), 1);
}

#[test]
fn unusable_body_is_an_error() {
    let response = InvocationResponse {
        status_code: Some(200),
        body: Some(json!(true)),
        ..InvocationResponse::default()
    };

    match evaluator().evaluate_invocation(&response) {
        Err(ComplianceError::UnexpectedBody(_)) => {}
        other => panic!("expected unexpected body error, got {other:?}"),
    }
}
