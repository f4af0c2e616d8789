//! Header state plus the transport that carries requests.
//!
//! # Design
//! The default header set lives here and nowhere else. The client owns its
//! `Session` exclusively, so header changes (installing or dropping a bearer
//! token) can only happen through `&mut Client`.

use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";

/// Default headers and the transport used to execute requests.
pub struct Session<T> {
    transport: T,
    default_headers: BTreeMap<String, String>,
}

impl<T: Transport> Session<T> {
    /// New session with `Content-Type: application/json` as its only default.
    pub fn new(transport: T) -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert(CONTENT_TYPE.to_string(), "application/json".to_string());
        Self {
            transport,
            default_headers,
        }
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.default_headers.insert(name.to_string(), value.into());
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.default_headers.remove(name)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.default_headers.get(name).map(String::as_str)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute one request. `extra_headers` override defaults of the same
    /// name (compared case-insensitively) for this request only.
    pub fn execute(
        &mut self,
        method: HttpMethod,
        url: &str,
        body: Option<String>,
        extra_headers: &[(&str, String)],
    ) -> Result<HttpResponse, ApiError> {
        let request = HttpRequest {
            method,
            url: url.to_string(),
            headers: self.merged_headers(extra_headers),
            body,
        };
        self.transport.execute(&request)
    }

    fn merged_headers(&self, extra_headers: &[(&str, String)]) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .default_headers
            .iter()
            .filter(|(name, _)| {
                !extra_headers
                    .iter()
                    .any(|(extra, _)| extra.eq_ignore_ascii_case(name))
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        headers.extend(
            extra_headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone())),
        );
        headers
    }
}
