//! Verify URL joining and error normalization against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Each error vector describes a simulated response and the status, message
//! and body classification the client must produce for it. The vectors are
//! fed through `ApiClient::parse_response`, the same path the async verb
//! methods use.

use portal_core::http::join_url;
use portal_core::{ApiClient, ClientConfig, ErrorBody, ErrorKind, HttpMethod, HttpResponse};
use serde_json::Value;

fn client() -> ApiClient {
    ApiClient::new(ClientConfig::new("http://localhost:3000"))
}

// ---------------------------------------------------------------------------
// URLs
// ---------------------------------------------------------------------------

#[test]
fn url_test_vectors() {
    let raw = include_str!("../../test-vectors/urls.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let base = case["base"].as_str().unwrap();
        let path = case["path"].as_str().unwrap();
        let expected = case["expected"].as_str().unwrap();

        assert_eq!(join_url(base, path), expected, "{name}: join_url");

        // Same result when the base goes through the client configuration.
        let c = ApiClient::new(ClientConfig::new(base));
        let req = c.build_request::<()>(HttpMethod::Get, path, None, &[]).unwrap();
        assert_eq!(req.url, expected, "{name}: built request");
        assert!(!req.url.contains("//auth"), "{name}: double slash");
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn error_test_vectors() {
    let raw = include_str!("../../test-vectors/errors.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["response"];
        let expected = &case["expected"];

        let headers = sim["content_type"]
            .as_str()
            .map(|ct| vec![("Content-Type".to_string(), ct.to_string())])
            .unwrap_or_default();
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers,
            body: sim["body"].as_str().unwrap().to_string(),
        };

        let err = c.parse_response::<Value>(response).unwrap_err();
        assert_eq!(u64::from(err.status()), expected["status"].as_u64().unwrap(), "{name}: status");
        assert_eq!(err.message(), expected["message"].as_str().unwrap(), "{name}: message");
        assert!(!err.message().is_empty(), "{name}: message must be displayable");
        assert_eq!(
            err.payload().is_some(),
            expected["has_payload"].as_bool().unwrap(),
            "{name}: payload"
        );

        let ErrorKind::Rejected(body) = err.kind() else {
            panic!("{name}: expected a rejected response, got {:?}", err.kind());
        };
        let kind = match body {
            ErrorBody::Structured { .. } => "structured",
            ErrorBody::RawText(_) => "raw_text",
            ErrorBody::Empty { .. } => "empty",
        };
        assert_eq!(kind, expected["body"].as_str().unwrap(), "{name}: body kind");
    }
}
