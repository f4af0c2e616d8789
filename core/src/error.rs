//! Error types for the Sensu API client.
//!
//! # Design
//! A single `ApiError` is returned from every fallible operation. Errors that
//! callers routinely branch on are grouped into nested families:
//! `SessionError` for admission failures (the client is not in a usable
//! authenticated state) and `ResourceError` for server-side rejections of a
//! resource call. `NotFound` and `AlreadyExists` get dedicated variants so
//! callers can build create-if-absent flows without inspecting status codes.
//!
//! Pre-flight errors (`NoServer`, `Session`, `ResourceValidation`) are raised
//! before any network I/O takes place.

use thiserror::Error;

/// Errors returned by `Client` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No server endpoint was configured on the client.
    #[error("no sensu server defined")]
    NoServer,

    /// Configuration loaded from the environment was malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The client is not in a state that admits calls.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Login or token refresh was rejected by the server.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A resource failed local validation; nothing was sent.
    #[error("resource validation failed: {0}")]
    ResourceValidation(#[from] ValidationError),

    /// The server rejected a resource call.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// The request never produced an HTTP response (connection refused,
    /// DNS failure, timeout, TLS failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),
}

/// Admission failures raised by `Client::call_filter`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No login has happened yet.
    #[error("no login token found")]
    NoSession,

    /// The access token is past its expiry; a new login is required.
    #[error("expired login token")]
    Expired,

    /// The access token is close to expiry. Dispatch handles this itself by
    /// refreshing once before sending the request.
    #[error("token needs to be refreshed")]
    NeedsRefresh,
}

/// Server-side rejections of resource calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The server returned 404 for the resource.
    #[error("resource not found at {url}")]
    NotFound { url: String },

    /// The server returned 409 for a create.
    #[error("resource already exists at {url}")]
    AlreadyExists { url: String },

    /// A create, update or delete returned another non-2xx status.
    #[error("resource call rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// A get returned another non-2xx status.
    #[error("failed to get resource(s) (HTTP {status}): {body}")]
    Retrieval { status: u16, body: String },
}

/// A resource failed its own local validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ApiError {
    /// True for `ResourceError::NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Resource(ResourceError::NotFound { .. }))
    }

    /// True for `ResourceError::AlreadyExists`.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ApiError::Resource(ResourceError::AlreadyExists { .. }))
    }

    /// True when the caller has to log in (again) before retrying.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ApiError::Session(SessionError::NoSession | SessionError::Expired)
                | ApiError::AuthenticationFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_errors_display_without_prefix() {
        let err = ApiError::from(SessionError::Expired);
        assert_eq!(err.to_string(), "expired login token");
    }

    #[test]
    fn validation_error_names_the_field() {
        let err = ApiError::from(ValidationError::new("metadata.name", "must not be empty"));
        assert_eq!(
            err.to_string(),
            "resource validation failed: metadata.name: must not be empty"
        );
    }

    #[test]
    fn classification_helpers() {
        let missing = ApiError::from(ResourceError::NotFound {
            url: "/api/core/v2/namespaces/x".to_string(),
        });
        assert!(missing.is_not_found());
        assert!(!missing.is_already_exists());

        let exists = ApiError::from(ResourceError::AlreadyExists {
            url: "/api/core/v2/namespaces".to_string(),
        });
        assert!(exists.is_already_exists());

        assert!(ApiError::from(SessionError::NoSession).requires_login());
        assert!(ApiError::AuthenticationFailed("nope".into()).requires_login());
        assert!(!ApiError::from(SessionError::NeedsRefresh).requires_login());
        assert!(!ApiError::NoServer.requires_login());
    }
}
