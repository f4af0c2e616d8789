//! Authenticated, blocking client for the Sensu API.
//!
//! # Design
//! `Client` owns an optional `ServerEndpoint`, an optional `Token` and a
//! `Session`. Its authentication state is derived from those three values:
//!
//! - no endpoint: `NoServer`
//! - endpoint, no token: `Unauthenticated`
//! - token past expiry: `Expired`
//! - token inside the refresh threshold: `NeedsRefresh`
//! - otherwise: `Valid`
//!
//! Every resource call goes through `dispatch`, which runs the admission
//! filter first. A token that is merely close to expiry is refreshed once,
//! then the original request proceeds; every other admission failure is
//! returned to the caller. Login and refresh are the only unfiltered calls.
//!
//! A token and its bearer header are always installed together, so the
//! header set never disagrees with the stored token. All state changes take
//! `&mut self`; share a client across threads only behind a lock.

use base64::prelude::*;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::call::CallData;
use crate::config::ClientConfig;
use crate::endpoint::ServerEndpoint;
use crate::error::{ApiError, ResourceError, SessionError};
use crate::http::{HttpMethod, HttpResponse, Transport, UreqTransport};
use crate::resources::{AnyResource, Check, Filter, Handler, Namespace, Resource, ResourceKind, User};
use crate::session::{Session, AUTHORIZATION};
use crate::token::{now_epoch_secs, Token};

pub const AUTH_PATH: &str = "/auth";
pub const REFRESH_PATH: &str = "/auth/token";

/// Where the client stands in the login lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NoServer,
    Unauthenticated,
    Valid,
    NeedsRefresh,
    Expired,
}

/// Whether `dispatch` runs the admission filter before sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Filtered,
    Unfiltered,
}

/// Client for one logical connection to a Sensu backend.
pub struct Client<T = UreqTransport> {
    endpoint: Option<ServerEndpoint>,
    token: Option<Token>,
    session: Session<T>,
    config: ClientConfig,
}

impl Client<UreqTransport> {
    pub fn new(endpoint: Option<ServerEndpoint>) -> Self {
        Self::with_config(endpoint, ClientConfig::default())
    }

    pub fn with_config(endpoint: Option<ServerEndpoint>, config: ClientConfig) -> Self {
        let ignore_cert = endpoint.as_ref().is_some_and(|e| e.ignore_cert);
        let transport = UreqTransport::new(&config, ignore_cert);
        Self::with_transport(endpoint, transport, config)
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(endpoint: Option<ServerEndpoint>, transport: T, config: ClientConfig) -> Self {
        Self {
            endpoint,
            token: None,
            session: Session::new(transport),
            config,
        }
    }

    pub fn endpoint(&self) -> Option<&ServerEndpoint> {
        self.endpoint.as_ref()
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn state(&self) -> AuthState {
        self.state_at(now_epoch_secs())
    }

    pub fn state_at(&self, now: i64) -> AuthState {
        if self.endpoint.is_none() {
            return AuthState::NoServer;
        }
        match &self.token {
            None => AuthState::Unauthenticated,
            Some(token) if token.is_expired_at(now) => AuthState::Expired,
            Some(token) if token.needs_refresh_at(now) => AuthState::NeedsRefresh,
            Some(_) => AuthState::Valid,
        }
    }

    /// Admission check run before every filtered call. Succeeds only in
    /// `AuthState::Valid`.
    pub fn call_filter(&self) -> Result<(), ApiError> {
        admit(self.state())
    }

    pub fn call_filter_at(&self, now: i64) -> Result<(), ApiError> {
        admit(self.state_at(now))
    }

    /// Log in with HTTP Basic credentials. On failure the current token, if
    /// any, is kept.
    pub fn login(&mut self, username: &str, password: &str) -> Result<(), ApiError> {
        let url = self.endpoint.as_ref().ok_or(ApiError::NoServer)?.url_for(AUTH_PATH);
        let credentials = BASE64_STANDARD.encode(format!("{username}:{password}"));

        info!("logging in to {url} as {username}");
        let response = self.session.execute(
            HttpMethod::Get,
            &url,
            None,
            &[(AUTHORIZATION, format!("Basic {credentials}"))],
        )?;

        if !response.is_success() {
            warn!("login as {username} rejected with HTTP {}", response.status);
            return Err(ApiError::AuthenticationFailed(format!(
                "failed to login (HTTP {})",
                response.status
            )));
        }

        let token = self.parse_token(&response.body)?;
        self.install_token(token);
        Ok(())
    }

    /// Exchange the refresh token for a new token. Bypasses the admission
    /// filter. On failure the stale token is kept.
    pub fn refresh_token(&mut self) -> Result<(), ApiError> {
        if self.endpoint.is_none() {
            return Err(ApiError::NoServer);
        }
        let refresh_token = self
            .token
            .as_ref()
            .ok_or(SessionError::NoSession)?
            .refresh_token()
            .to_string();

        debug!("refreshing access token");
        let call = CallData::post(REFRESH_PATH, json!({ "refresh_token": refresh_token }));
        let response = self.dispatch(&call, Admission::Unfiltered)?;

        if !response.is_success() {
            warn!("token refresh rejected with HTTP {}", response.status);
            return Err(ApiError::AuthenticationFailed(format!(
                "failed to refresh token (HTTP {}): {}",
                response.status, response.body
            )));
        }

        let token = self.parse_token(&response.body)?;
        self.install_token(token);
        Ok(())
    }

    /// Install a previously saved token without contacting the server.
    pub fn restore_token(&mut self, token: Token) {
        let token = token.with_refresh_threshold(self.config.refresh_threshold);
        self.install_token(token);
    }

    /// Forget the token and its bearer header.
    pub fn logout(&mut self) {
        self.token = None;
        self.session.remove_header(AUTHORIZATION);
    }

    fn install_token(&mut self, token: Token) {
        self.session.set_header(AUTHORIZATION, token.bearer_header());
        self.token = Some(token);
    }

    fn parse_token(&self, body: &str) -> Result<Token, ApiError> {
        let token: Token =
            serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        Ok(token.with_refresh_threshold(self.config.refresh_threshold))
    }

    /// Send one call. With `Admission::Filtered`, a token that needs refresh
    /// is refreshed exactly once before the request goes out; the filter is
    /// not re-run afterwards.
    pub fn dispatch(&mut self, call: &CallData, admission: Admission) -> Result<HttpResponse, ApiError> {
        if admission == Admission::Filtered {
            match self.call_filter() {
                Ok(()) => {}
                Err(ApiError::Session(SessionError::NeedsRefresh)) => {
                    debug!(
                        "token near expiry before {} {}",
                        call.method.as_str(),
                        call.path
                    );
                    self.refresh_token()?;
                }
                Err(e) => return Err(e),
            }
        }

        let url = self.endpoint.as_ref().ok_or(ApiError::NoServer)?.url_for(&call.path);
        let body = call.body()?;
        self.session.execute(call.method, &url, body, &[])
    }

    /// GET `url` and deserialize the body into `R`. A JSON array yields one
    /// item per element; any other JSON value yields exactly one item.
    pub fn resource_get<R: DeserializeOwned>(&mut self, url: &str) -> Result<Vec<R>, ApiError> {
        let response = self.dispatch(&CallData::get(url), Admission::Filtered)?;

        if response.status == 404 {
            return Err(ResourceError::NotFound {
                url: url.to_string(),
            }
            .into());
        }
        if !response.is_success() {
            return Err(ResourceError::Retrieval {
                status: response.status,
                body: response.body,
            }
            .into());
        }

        let value: Value = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        let items = match value {
            Value::Array(items) => items,
            single => vec![single],
        };
        items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| ApiError::DeserializationError(e.to_string()))
            })
            .collect()
    }

    /// Validate `obj` locally, then POST it to `url` or its creation URL.
    pub fn resource_post<R: Resource>(&mut self, obj: &R, url: Option<&str>) -> Result<(), ApiError> {
        let call = CallData::create(obj, url)?;
        let response = self.dispatch(&call, Admission::Filtered)?;
        check_write(&call, &response)
    }

    /// Validate `obj` locally, then PUT it to `url` or its canonical URL.
    pub fn resource_put<R: Resource>(&mut self, obj: &R, url: Option<&str>) -> Result<(), ApiError> {
        let call = CallData::update(obj, url)?;
        let response = self.dispatch(&call, Admission::Filtered)?;
        check_write(&call, &response)
    }

    /// DELETE `url` or the object's canonical URL. The body is ignored.
    pub fn resource_delete<R: Resource>(&mut self, obj: &R, url: Option<&str>) -> Result<(), ApiError> {
        let call = CallData::delete(obj, url);
        let response = self.dispatch(&call, Admission::Filtered)?;
        check_write(&call, &response)
    }

    /// Fetch resources of a kind chosen at runtime.
    pub fn fetch_kind(
        &mut self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: Option<&str>,
    ) -> Result<Vec<AnyResource>, ApiError> {
        let url = kind.collection_url(namespace, name);
        let items = match kind {
            ResourceKind::Namespace => wrap(self.resource_get::<Namespace>(&url)?, AnyResource::Namespace),
            ResourceKind::Check => wrap(self.resource_get::<Check>(&url)?, AnyResource::Check),
            ResourceKind::Handler => wrap(self.resource_get::<Handler>(&url)?, AnyResource::Handler),
            ResourceKind::Filter => wrap(self.resource_get::<Filter>(&url)?, AnyResource::Filter),
            ResourceKind::User => wrap(self.resource_get::<User>(&url)?, AnyResource::User),
        };
        Ok(items)
    }
}

fn admit(state: AuthState) -> Result<(), ApiError> {
    match state {
        AuthState::NoServer => Err(ApiError::NoServer),
        AuthState::Unauthenticated => Err(SessionError::NoSession.into()),
        AuthState::Expired => Err(SessionError::Expired.into()),
        AuthState::NeedsRefresh => Err(SessionError::NeedsRefresh.into()),
        AuthState::Valid => Ok(()),
    }
}

fn wrap<R>(items: Vec<R>, f: fn(R) -> AnyResource) -> Vec<AnyResource> {
    items.into_iter().map(f).collect()
}

/// Map the status of a create/update/delete to `Ok(())` or a resource error.
fn check_write(call: &CallData, response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let err = match (call.method, response.status) {
        (_, 404) => ResourceError::NotFound {
            url: call.path.clone(),
        },
        (HttpMethod::Post, 409) => ResourceError::AlreadyExists {
            url: call.path.clone(),
        },
        (_, status) => ResourceError::Rejected {
            status,
            body: response.body.clone(),
        },
    };
    warn!("{} {} failed: {err}", call.method.as_str(), call.path);
    Err(err.into())
}
