//! Request builder and response parser for the Dynalist API.
//!
//! # Design
//! `DynalistClient` holds only the token and the base URL and carries no
//! mutable state between calls. Each endpoint is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`; the round-trip methods (`file_list`,
//! `doc_edit`, ...) glue the two together through a `Transport`.
//!
//! The client never interprets `Response::code`. A `TooManyRequests` or
//! `LockFail` answer is a successfully decoded response.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::change::{Change, ChangeTarget};
use crate::config::{ClientConfig, Token};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::limit::{Endpoint, Limit};
use crate::transport::Transport;
use crate::types::{
    DocumentResponse, EditResponse, FileListResponse, InboxResponse, Response,
};

#[derive(Serialize)]
struct TokenOnly<'a> {
    token: &'a str,
}

#[derive(Serialize)]
struct FileEditBody<'a> {
    token: &'a str,
    changes: &'a [Change],
}

#[derive(Serialize)]
struct DocReadBody<'a> {
    token: &'a str,
    file_id: &'a str,
}

#[derive(Serialize)]
struct DocEditBody<'a> {
    token: &'a str,
    file_id: &'a str,
    changes: &'a [Change],
}

#[derive(Serialize)]
struct InboxAddBody<'a> {
    token: &'a str,
    #[serde(flatten)]
    change: &'a Change,
}

/// Synchronous, stateless client for the Dynalist API.
#[derive(Debug, Clone)]
pub struct DynalistClient {
    base_url: String,
    token: Token,
}

impl DynalistClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        }
    }

    /// Build a client from `$DYNALIST_TOKEN` (and `$DYNALIST_BASE_URL`).
    pub fn from_env() -> Result<Self, ApiError> {
        ClientConfig::from_env().map(Self::new)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_file_list(&self) -> Result<HttpRequest, ApiError> {
        self.encode(
            Endpoint::FileList,
            &TokenOnly {
                token: self.token.expose(),
            },
        )
    }

    pub fn build_file_edit(&self, changes: &[Change]) -> Result<HttpRequest, ApiError> {
        validate_all(changes, ChangeTarget::FileTree)?;
        debug!(changes = changes.len(), "building file/edit");
        self.encode(
            Endpoint::FileEdit,
            &FileEditBody {
                token: self.token.expose(),
                changes,
            },
        )
    }

    pub fn build_doc_read(&self, file_id: &str) -> Result<HttpRequest, ApiError> {
        self.encode(
            Endpoint::DocRead,
            &DocReadBody {
                token: self.token.expose(),
                file_id,
            },
        )
    }

    pub fn build_doc_edit(&self, file_id: &str, changes: &[Change]) -> Result<HttpRequest, ApiError> {
        validate_all(changes, ChangeTarget::Document)?;
        debug!(file_id, changes = changes.len(), "building doc/edit");
        self.encode(
            Endpoint::DocEdit,
            &DocEditBody {
                token: self.token.expose(),
                file_id,
                changes,
            },
        )
    }

    pub fn build_inbox_add(&self, change: &Change) -> Result<HttpRequest, ApiError> {
        change
            .validate(ChangeTarget::Inbox)
            .map_err(|source| ApiError::InvalidChange { index: 0, source })?;
        self.encode(
            Endpoint::InboxAdd,
            &InboxAddBody {
                token: self.token.expose(),
                change,
            },
        )
    }

    pub fn parse_file_list(&self, response: HttpResponse) -> Result<FileListResponse, ApiError> {
        decode(Endpoint::FileList, response)
    }

    pub fn parse_file_edit(&self, response: HttpResponse) -> Result<EditResponse, ApiError> {
        decode(Endpoint::FileEdit, response)
    }

    pub fn parse_doc_read(&self, response: HttpResponse) -> Result<DocumentResponse, ApiError> {
        decode(Endpoint::DocRead, response)
    }

    pub fn parse_doc_edit(&self, response: HttpResponse) -> Result<EditResponse, ApiError> {
        decode(Endpoint::DocEdit, response)
    }

    pub fn parse_inbox_add(&self, response: HttpResponse) -> Result<InboxResponse, ApiError> {
        decode(Endpoint::InboxAdd, response)
    }

    /// List every file and folder in the account.
    pub fn file_list<T: Transport>(&self, transport: &T) -> Result<FileListResponse, ApiError> {
        let response = transport.execute(self.build_file_list()?)?;
        self.parse_file_list(response)
    }

    /// Apply `changes` to the file tree. `results` mirrors `changes`.
    pub fn file_edit<T: Transport>(
        &self,
        transport: &T,
        changes: &[Change],
    ) -> Result<EditResponse, ApiError> {
        let response = transport.execute(self.build_file_edit(changes)?)?;
        self.parse_file_edit(response)
    }

    /// Fetch the title and every node of a document.
    pub fn doc_read<T: Transport>(
        &self,
        transport: &T,
        file_id: &str,
    ) -> Result<DocumentResponse, ApiError> {
        let response = transport.execute(self.build_doc_read(file_id)?)?;
        self.parse_doc_read(response)
    }

    /// Apply `changes` to one document's outline. `results` mirrors `changes`.
    pub fn doc_edit<T: Transport>(
        &self,
        transport: &T,
        file_id: &str,
        changes: &[Change],
    ) -> Result<EditResponse, ApiError> {
        let response = transport.execute(self.build_doc_edit(file_id, changes)?)?;
        self.parse_doc_edit(response)
    }

    /// Append an item to the account's inbox.
    pub fn inbox_add<T: Transport>(
        &self,
        transport: &T,
        change: &Change,
    ) -> Result<InboxResponse, ApiError> {
        let response = transport.execute(self.build_inbox_add(change)?)?;
        self.parse_inbox_add(response)
    }

    pub fn limit_file_list(&self) -> Limit {
        Endpoint::FileList.limit()
    }

    pub fn limit_file_edit(&self) -> Limit {
        Endpoint::FileEdit.limit()
    }

    pub fn limit_doc_read(&self) -> Limit {
        Endpoint::DocRead.limit()
    }

    pub fn limit_doc_edit(&self) -> Limit {
        Endpoint::DocEdit.limit()
    }

    pub fn limit_inbox_add(&self) -> Limit {
        Endpoint::InboxAdd.limit()
    }

    pub fn limit_change(&self) -> Limit {
        Limit::PER_CHANGE
    }

    fn encode<B: Serialize>(&self, endpoint: Endpoint, body: &B) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(body).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        debug!(endpoint = endpoint.path(), bytes = body.len(), "built request");
        Ok(HttpRequest::post_json(
            format!("{}/{}", self.base_url, endpoint.path()),
            body,
        ))
    }
}

fn validate_all(changes: &[Change], target: ChangeTarget) -> Result<(), ApiError> {
    changes.iter().enumerate().try_for_each(|(index, change)| {
        change
            .validate(target)
            .map_err(|source| ApiError::InvalidChange { index, source })
    })
}

/// Reject transport-level failures, then decode the envelope verbatim.
fn decode<P: DeserializeOwned>(
    endpoint: Endpoint,
    response: HttpResponse,
) -> Result<Response<P>, ApiError> {
    let success = (200..300).contains(&response.status);
    let http_error = |response: HttpResponse| ApiError::HttpError {
        status: response.status,
        body: response.body,
    };
    if response.body.trim().is_empty() {
        return Err(if success { ApiError::EmptyBody } else { http_error(response) });
    }
    // A `_code` envelope wins over the status line, e.g. 429 + TooManyRequests.
    let decoded: Response<P> = match serde_json::from_str(&response.body) {
        Ok(decoded) => decoded,
        Err(_) if !success => return Err(http_error(response)),
        Err(e) => return Err(ApiError::DeserializationError(e.to_string())),
    };
    debug!(
        endpoint = endpoint.path(),
        status = response.status,
        code = %decoded.code,
        "decoded response"
    );
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::types::{Action, Code, FileType};

    fn client() -> DynalistClient {
        let token = Token::new("secret").unwrap();
        DynalistClient::new(ClientConfig::new(token).with_base_url("http://localhost:3000"))
    }

    fn body_of(req: &HttpRequest) -> serde_json::Value {
        serde_json::from_str(&req.body).unwrap()
    }

    /// Answers every request with the same canned body and records what it saw.
    struct Canned {
        body: &'static str,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Canned {
        fn new(body: &'static str) -> Self {
            Self {
                body,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request);
            Ok(HttpResponse::ok(self.body))
        }
    }

    #[test]
    fn build_file_list_produces_correct_request() {
        let req = client().build_file_list().unwrap();
        assert_eq!(req.url, "http://localhost:3000/file/list");
        assert_eq!(
            req.headers,
            vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("accept".to_string(), "application/json".to_string()),
            ]
        );
        assert_eq!(body_of(&req), serde_json::json!({ "token": "secret" }));
    }

    #[test]
    fn build_file_edit_keeps_change_order() {
        let changes = vec![
            Change::edit_file("F1", "first"),
            Change::delete_file("F2"),
            Change::move_file("F3", "root", 0),
        ];
        let req = client().build_file_edit(&changes).unwrap();
        assert_eq!(req.url, "http://localhost:3000/file/edit");

        let body = body_of(&req);
        let sent = body["changes"].as_array().unwrap();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0]["file_id"], "F1");
        assert_eq!(sent[1]["action"], "delete");
        assert_eq!(sent[2]["index"], 0);
    }

    #[test]
    fn build_file_edit_rejects_invalid_change_with_position() {
        let changes = vec![Change::delete_file("F1"), Change::new(Action::Move)];
        let err = client().build_file_edit(&changes).unwrap_err();
        assert!(matches!(err, ApiError::InvalidChange { index: 1, .. }));
    }

    #[test]
    fn build_doc_read_sends_file_id() {
        let req = client().build_doc_read("doc1").unwrap();
        assert_eq!(req.url, "http://localhost:3000/doc/read");
        assert_eq!(
            body_of(&req),
            serde_json::json!({ "token": "secret", "file_id": "doc1" })
        );
    }

    #[test]
    fn build_doc_edit_with_no_changes_still_builds() {
        let req = client().build_doc_edit("doc1", &[]).unwrap();
        let body = body_of(&req);
        assert_eq!(body["file_id"], "doc1");
        assert_eq!(body["changes"], serde_json::json!([]));
    }

    #[test]
    fn build_inbox_add_inlines_change_fields() {
        let change = Change::inbox_item("call mom").checked(true);
        let req = client().build_inbox_add(&change).unwrap();
        assert_eq!(req.url, "http://localhost:3000/inbox/add");
        assert_eq!(
            body_of(&req),
            serde_json::json!({
                "token": "secret",
                "action": "insert",
                "content": "call mom",
                "checked": true
            })
        );
    }

    #[test]
    fn parse_passes_non_ok_codes_through() {
        let res = client()
            .parse_doc_edit(HttpResponse::ok(
                r#"{"_code":"LockFail","_msg":"try again"}"#,
            ))
            .unwrap();
        assert_eq!(res.code, Code::LockFail);
        assert_eq!(res.message, "try again");
        assert!(res.payload.results.is_empty());
    }

    #[test]
    fn parse_empty_body_is_transport_error() {
        let err = client().parse_file_list(HttpResponse::ok("")).unwrap_err();
        assert!(matches!(err, ApiError::EmptyBody));
    }

    #[test]
    fn parse_bad_json_is_decode_error() {
        let err = client()
            .parse_doc_read(HttpResponse::ok("not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_non_2xx_is_http_error() {
        let response = HttpResponse {
            status: 503,
            headers: Vec::new(),
            body: "maintenance".to_string(),
        };
        let err = client().parse_inbox_add(response).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 503, .. }));
    }

    #[test]
    fn parse_keeps_envelope_on_non_2xx_status() {
        let response = HttpResponse {
            status: 429,
            headers: Vec::new(),
            body: r#"{"_code":"TooManyRequests","_msg":"slow down"}"#.to_string(),
        };
        let res = client().parse_file_edit(response).unwrap();
        assert_eq!(res.code, Code::TooManyRequests);
        assert_eq!(res.message, "slow down");
        assert!(res.payload.results.is_empty());

        let empty = HttpResponse {
            status: 502,
            headers: Vec::new(),
            body: String::new(),
        };
        let err = client().parse_doc_read(empty).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 502, .. }));
    }

    #[test]
    fn round_trip_goes_through_transport() {
        let transport = Canned::new(
            r#"{"_code":"Ok","_msg":"","root_file_id":"root","files":[{"id":"root","title":"","type":"folder","permission":4}]}"#,
        );
        let res = client().file_list(&transport).unwrap();
        assert!(res.is_ok());
        assert_eq!(res.payload.files[0].file_type, FileType::Folder);

        let seen = transport.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url, "http://localhost:3000/file/list");
    }

    #[test]
    fn invalid_change_never_reaches_transport() {
        let transport = Canned::new(r#"{"_code":"Ok"}"#);
        let err = client()
            .doc_edit(&transport, "doc1", &[Change::new(Action::Insert)])
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidChange { index: 0, .. }));
        assert!(transport.seen.borrow().is_empty());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let token = Token::new("secret").unwrap();
        let client = DynalistClient::new(ClientConfig {
            token,
            base_url: "http://localhost:3000/".to_string(),
        });
        let req = client.build_file_list().unwrap();
        assert_eq!(req.url, "http://localhost:3000/file/list");
    }

    #[test]
    fn limits_are_exposed_per_endpoint() {
        let c = client();
        assert_eq!(c.limit_doc_edit().burst, 20);
        assert_eq!(c.limit_inbox_add(), c.limit_file_list());
        assert_eq!(c.limit_change(), Limit::PER_CHANGE);
    }
}
