//! HTTP transport types and the blocking transport used in production.
//!
//! # Design
//! Requests and responses are plain data. The client builds `HttpRequest`
//! values and hands them to a `Transport`, which performs the single network
//! round trip and returns an `HttpResponse`. Status interpretation stays in
//! the client; a transport only fails when no HTTP response was obtained at
//! all (connection refused, timeout, TLS failure).
//!
//! `UreqTransport` is the production implementation. Tests swap in an
//! in-memory transport to script responses and record what was sent.

use log::{debug, warn};
use ureq::tls::TlsConfig;
use ureq::{Agent, RequestBuilder};

use crate::config::ClientConfig;
use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// `200 <= status < 300`, the one acceptance test for every call.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one HTTP round trip.
pub trait Transport {
    fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by a `ureq` agent.
///
/// Non-2xx statuses come back as data rather than errors so the client can
/// map them to typed errors itself.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig, ignore_cert: bool) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .tls_config(
                TlsConfig::builder()
                    .disable_verification(ignore_cert)
                    .build(),
            )
            .build()
            .new_agent();
        Self { agent }
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!("{} {}", request.method.as_str(), request.url);

        let url = request.url.as_str();
        let headers = request.headers.as_slice();
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(self.agent.put(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), headers).send_empty(),
        };

        let mut response = result.map_err(|e| {
            warn!("{} {} failed: {e}", request.method.as_str(), request.url);
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(format!("reading response body: {e}")))?;

        debug!("{} {} -> {status}", request.method.as_str(), request.url);
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory transport for unit tests.

    use std::collections::VecDeque;

    use super::*;

    #[derive(Debug, Default)]
    pub(crate) struct ScriptedTransport {
        responses: VecDeque<Result<HttpResponse, ApiError>>,
        pub(crate) sent: Vec<HttpRequest>,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn respond(mut self, status: u16, body: &str) -> Self {
            self.responses.push_back(Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            }));
            self
        }

        pub(crate) fn fail(mut self, message: &str) -> Self {
            self.responses
                .push_back(Err(ApiError::Transport(message.to_string())));
            self
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.sent.push(request.clone());
            self.responses
                .pop_front()
                .unwrap_or_else(|| panic!("no scripted response for {} {}", request.method.as_str(), request.url))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    #[test]
    fn success_is_the_2xx_range() {
        assert!(!response(199).is_success());
        assert!(response(200).is_success());
        assert!(response(201).is_success());
        assert!(response(204).is_success());
        assert!(response(299).is_success());
        assert!(!response(300).is_success());
        assert!(!response(404).is_success());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost:8080/auth".to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: None,
        };
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn connection_refused_is_a_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut transport = UreqTransport::new(&ClientConfig::default(), false);
        let err = transport
            .execute(&HttpRequest {
                method: HttpMethod::Get,
                url: format!("http://127.0.0.1:{port}/auth"),
                headers: Vec::new(),
                body: None,
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    fn silent_server_times_out_as_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        // Accept the connection and hold it open without ever replying.
        let holder = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            std::thread::sleep(std::time::Duration::from_secs(2));
            drop(stream);
        });

        let config = ClientConfig {
            timeout: std::time::Duration::from_millis(200),
            ..ClientConfig::default()
        };
        let mut transport = UreqTransport::new(&config, false);
        let started = std::time::Instant::now();
        let err = transport
            .execute(&HttpRequest {
                method: HttpMethod::Get,
                url: format!("http://127.0.0.1:{port}/auth"),
                headers: Vec::new(),
                body: None,
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
        holder.join().unwrap();
    }
}
