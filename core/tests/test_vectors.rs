//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Comparing parsed JSON (not raw strings) avoids
//! false negatives from field-ordering differences.

use dynalist_core::{
    Change, ClientConfig, DocumentResponse, DynalistClient, EditResponse, FileListResponse,
    HttpRequest, HttpResponse, InboxResponse, Token,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

fn client() -> DynalistClient {
    DynalistClient::new(ClientConfig::new(Token::new("secret").unwrap()).with_base_url(BASE_URL))
}

fn cases(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn changes(case: &Value) -> Vec<Change> {
    serde_json::from_value(case["changes"].clone()).unwrap()
}

/// Compare a built request with the case's `expected_request`.
fn check_request(name: &str, req: &HttpRequest, case: &Value) {
    let expected = &case["expected_request"];
    assert_eq!(
        req.url,
        format!("{BASE_URL}{}", expected["path"].as_str().unwrap()),
        "{name}: url"
    );
    assert!(
        req.headers
            .contains(&("content-type".to_string(), "application/json".to_string())),
        "{name}: content-type"
    );
    assert!(
        req.headers
            .contains(&("accept".to_string(), "application/json".to_string())),
        "{name}: accept"
    );
    let body: Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(body, expected["body"], "{name}: body");
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

// ---------------------------------------------------------------------------
// file/list
// ---------------------------------------------------------------------------

#[test]
fn file_list_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/file_list.json")) {
        let name = case["name"].as_str().unwrap();

        let req = c.build_file_list().unwrap();
        check_request(name, &req, &case);

        let parsed = c.parse_file_list(simulated(&case)).unwrap();
        let expected: FileListResponse =
            serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(parsed, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// file/edit
// ---------------------------------------------------------------------------

#[test]
fn file_edit_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/file_edit.json")) {
        let name = case["name"].as_str().unwrap();
        let changes = changes(&case);

        let req = c.build_file_edit(&changes).unwrap();
        check_request(name, &req, &case);

        let parsed = c.parse_file_edit(simulated(&case)).unwrap();
        let expected: EditResponse =
            serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(parsed, expected, "{name}: parsed result");
        if parsed.is_ok() {
            assert_eq!(parsed.payload.results.len(), changes.len(), "{name}: result count");
        }
    }
}

// ---------------------------------------------------------------------------
// doc/read
// ---------------------------------------------------------------------------

#[test]
fn doc_read_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/doc_read.json")) {
        let name = case["name"].as_str().unwrap();
        let file_id = case["file_id"].as_str().unwrap();

        let req = c.build_doc_read(file_id).unwrap();
        check_request(name, &req, &case);

        let parsed = c.parse_doc_read(simulated(&case)).unwrap();
        let expected: DocumentResponse =
            serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(parsed, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// doc/edit
// ---------------------------------------------------------------------------

#[test]
fn doc_edit_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/doc_edit.json")) {
        let name = case["name"].as_str().unwrap();
        let file_id = case["file_id"].as_str().unwrap();
        let changes = changes(&case);

        let req = c.build_doc_edit(file_id, &changes).unwrap();
        check_request(name, &req, &case);

        let parsed = c.parse_doc_edit(simulated(&case)).unwrap();
        let expected: EditResponse =
            serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(parsed, expected, "{name}: parsed result");
        if parsed.is_ok() {
            assert_eq!(parsed.payload.results.len(), changes.len(), "{name}: result count");
        }
    }
}

// ---------------------------------------------------------------------------
// inbox/add
// ---------------------------------------------------------------------------

#[test]
fn inbox_add_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/inbox_add.json")) {
        let name = case["name"].as_str().unwrap();
        let change: Change = serde_json::from_value(case["change"].clone()).unwrap();

        let req = c.build_inbox_add(&change).unwrap();
        check_request(name, &req, &case);

        let parsed = c.parse_inbox_add(simulated(&case)).unwrap();
        let expected: InboxResponse =
            serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(parsed, expected, "{name}: parsed result");
    }
}
