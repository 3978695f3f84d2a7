//! Problem Details assertions for backend tests.

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Mirror of the backend's problem body, kept independent of backend types.
#[derive(Debug, Deserialize, Serialize)]
pub struct ProblemDetailsLike {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
    pub trace_id: String,
}

/// Assert that a response honours the error contract and return the parsed body.
///
/// Checks:
/// - HTTP status and `status` field match `expected_status`
/// - `code` matches `expected_code` and `type` ends with it
/// - content type is `application/problem+json`
/// - `x-trace-id` header exists and equals the body `trace_id`
pub async fn assert_problem<B: MessageBody>(
    resp: ServiceResponse<B>,
    expected_code: &str,
    expected_status: StatusCode,
) -> ProblemDetailsLike {
    assert_eq!(resp.status(), expected_status);

    let headers = resp.headers().clone();
    let content_type = headers
        .get("content-type")
        .expect("content-type header should be present")
        .to_str()
        .expect("content-type should be valid UTF-8");
    assert_eq!(content_type, "application/problem+json");

    let trace_id_header = headers
        .get("x-trace-id")
        .expect("x-trace-id header should be present")
        .to_str()
        .expect("x-trace-id header should be valid UTF-8")
        .to_string();

    let body = actix_web::test::read_body(resp).await;
    let problem: ProblemDetailsLike =
        serde_json::from_slice(&body).expect("Response body should be valid ProblemDetails JSON");

    assert_eq!(problem.code, expected_code);
    assert_eq!(problem.status, expected_status.as_u16());
    assert!(
        problem.type_.ends_with(expected_code),
        "type '{}' should end with code '{}'",
        problem.type_,
        expected_code
    );
    assert_eq!(
        problem.trace_id, trace_id_header,
        "trace_id in body should match x-trace-id header"
    );

    problem
}
