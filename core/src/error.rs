//! Error types for the Dynalist API client.
//!
//! # Design
//! Only failures that prevent a well-formed `Response` from reaching the
//! caller are errors here. Application-level outcomes such as
//! `TooManyRequests` or `LockFail` arrive as a decoded `Code` inside a
//! successful `Response`, because only the caller knows the right
//! backoff policy.

use thiserror::Error;

use crate::types::Action;

/// Errors returned by `DynalistClient` and `Transport` implementations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No secret token was supplied when building the client.
    #[error("missing API token: set $DYNALIST_TOKEN")]
    MissingToken,

    /// A change in a batch is not valid for the endpoint it was sent to.
    #[error("change #{index} is invalid: {source}")]
    InvalidChange {
        index: usize,
        #[source]
        source: ChangeError,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The transport could not complete the round-trip.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered without a body.
    #[error("no body in the response")]
    EmptyBody,

    /// The server returned a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },
}

/// Reasons a `Change` is rejected before it is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeError {
    #[error("`{action}` requires `{field}`")]
    MissingField { action: Action, field: &'static str },

    #[error("`{field}` is not allowed in this context")]
    UnexpectedField { field: &'static str },

    #[error("`edit` must overwrite at least one field")]
    NothingToEdit,

    #[error("`{0}` is not allowed in this context")]
    UnexpectedAction(Action),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_change_names_position_and_reason() {
        let err = ApiError::InvalidChange {
            index: 2,
            source: ChangeError::MissingField {
                action: Action::Move,
                field: "parent_id",
            },
        };
        assert_eq!(
            err.to_string(),
            "change #2 is invalid: `move` requires `parent_id`"
        );
    }

    #[test]
    fn http_error_includes_status() {
        let err = ApiError::HttpError {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
    }
}
