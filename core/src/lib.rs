//! Synchronous client for the Dynalist outline service's HTTP+JSON API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). A `Transport` executes the
//! round-trip; `UreqTransport` is provided for blocking use.
//!
//! # Design
//! - `DynalistClient` is stateless: it holds the token and the base URL.
//! - Each endpoint is split into `build_*` and `parse_*`, with a round-trip
//!   method on top, so the I/O boundary stays explicit.
//! - `Change` tracks field presence so unset fields never reach the wire.
//! - Responses are returned verbatim. A non-`Ok` `Code` is data, not an
//!   error; only transport and decoding failures are `ApiError`s.
//! - Rate limits are published through `Endpoint::limit` for a caller-side
//!   throttler. Nothing here enforces them.

pub mod change;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod limit;
pub mod transport;
pub mod types;

pub use change::{Change, ChangeTarget};
pub use client::DynalistClient;
pub use config::{ClientConfig, Token};
pub use error::{ApiError, ChangeError};
pub use http::{HttpRequest, HttpResponse};
pub use limit::{Endpoint, Limit};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Action, Code, Document, DocumentResponse, EditResponse, EditResults, File, FileList,
    FileListResponse, FileType, InboxItem, InboxResponse, Node, Permission, Response,
};
