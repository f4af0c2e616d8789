//! Sensu resource types and the contract the client needs from them.
//!
//! # Design
//! Each kind is a plain serde struct whose JSON shape matches the Sensu API.
//! The `Resource` trait supplies what dispatch needs: a collection URL, a
//! per-instance URL for a given purpose, and a local validation hook.
//! Serialization comes from `Serialize`.
//!
//! Objects do not hold a reference to the client that fetched them. The
//! provided `fetch`/`create`/`update`/`delete` methods take the client as an
//! argument instead.
//!
//! `ResourceKind` is the static registry of known kinds, and `AnyResource`
//! the matching tagged union, for code that picks a kind at runtime.

mod check;
mod filter;
mod handler;
mod namespace;
mod user;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::{ApiError, ValidationError};
use crate::http::Transport;

pub use check::{Check, CheckProxyRequests};
pub use filter::{Filter, FilterAction};
pub use handler::{Handler, HandlerSocket, HandlerType};
pub use namespace::Namespace;
pub use user::User;

pub const API_PREFIX: &str = "/api/core/v2";
pub const DEFAULT_NAMESPACE: &str = "default";

/// Which URL variant a resource should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlPurpose {
    /// The collection the object is POSTed to.
    Create,
    /// The object's own URL, used for update and delete.
    Canonical,
}

/// A typed Sensu API object.
pub trait Resource: Serialize + DeserializeOwned + Sized {
    const KIND: ResourceKind;

    /// URL listing the collection, or a single member when `name` is given.
    /// Cluster-wide kinds ignore `namespace`; namespaced kinds fall back to
    /// `default`.
    fn collection_url(namespace: Option<&str>, name: Option<&str>) -> String;

    fn url(&self, purpose: UrlPurpose) -> String;

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn fetch<T: Transport>(
        client: &mut Client<T>,
        namespace: Option<&str>,
        name: Option<&str>,
    ) -> Result<Vec<Self>, ApiError> {
        client.resource_get(&Self::collection_url(namespace, name))
    }

    fn create<T: Transport>(&self, client: &mut Client<T>) -> Result<(), ApiError> {
        client.resource_post(self, None)
    }

    fn update<T: Transport>(&self, client: &mut Client<T>) -> Result<(), ApiError> {
        client.resource_put(self, None)
    }

    fn delete<T: Transport>(&self, client: &mut Client<T>) -> Result<(), ApiError> {
        client.resource_delete(self, None)
    }
}

/// `/api/core/v2/{collection}[/{name}]`
pub fn cluster_url(collection: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{API_PREFIX}/{collection}/{name}"),
        None => format!("{API_PREFIX}/{collection}"),
    }
}

/// `/api/core/v2/namespaces/{namespace}/{collection}[/{name}]`
pub fn namespaced_url(namespace: &str, collection: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{API_PREFIX}/namespaces/{namespace}/{collection}/{name}"),
        None => format!("{API_PREFIX}/namespaces/{namespace}/{collection}"),
    }
}

/// Metadata block carried by namespaced resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
            ..Self::default()
        }
    }

    pub fn namespace_or_default(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    /// URL of the owning object under `collection`.
    pub(crate) fn url(&self, collection: &str, purpose: UrlPurpose) -> String {
        let name = match purpose {
            UrlPurpose::Create => None,
            UrlPurpose::Canonical => Some(self.name.as_str()),
        };
        namespaced_url(self.namespace_or_default(), collection, name)
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("metadata.name", "must not be empty"));
        }
        if matches!(self.namespace.as_deref(), Some(ns) if ns.trim().is_empty()) {
            return Err(ValidationError::new("metadata.namespace", "must not be empty"));
        }
        Ok(())
    }
}

/// Static registry of the resource kinds this crate knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Namespace,
    Check,
    Handler,
    Filter,
    User,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Namespace,
        ResourceKind::Check,
        ResourceKind::Handler,
        ResourceKind::Filter,
        ResourceKind::User,
    ];

    /// Path segment of the collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Namespace => "namespaces",
            ResourceKind::Check => "checks",
            ResourceKind::Handler => "handlers",
            ResourceKind::Filter => "filters",
            ResourceKind::User => "users",
        }
    }

    pub fn is_namespaced(&self) -> bool {
        matches!(
            self,
            ResourceKind::Check | ResourceKind::Handler | ResourceKind::Filter
        )
    }

    pub fn collection_url(&self, namespace: Option<&str>, name: Option<&str>) -> String {
        match self {
            ResourceKind::Namespace => Namespace::collection_url(namespace, name),
            ResourceKind::Check => Check::collection_url(namespace, name),
            ResourceKind::Handler => Handler::collection_url(namespace, name),
            ResourceKind::Filter => Filter::collection_url(namespace, name),
            ResourceKind::User => User::collection_url(namespace, name),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ApiError;

    /// Accepts the singular or plural name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ResourceKind::ALL
            .into_iter()
            .find(|kind| {
                let plural = kind.as_str();
                lower == plural || lower == plural[..plural.len() - 1]
            })
            .ok_or_else(|| ApiError::InvalidConfig(format!("unknown resource kind: {s}")))
    }
}

/// One resource of any known kind. Serializes to the kind's own JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnyResource {
    Namespace(Namespace),
    Check(Check),
    Handler(Handler),
    Filter(Filter),
    User(User),
}

impl AnyResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            AnyResource::Namespace(_) => ResourceKind::Namespace,
            AnyResource::Check(_) => ResourceKind::Check,
            AnyResource::Handler(_) => ResourceKind::Handler,
            AnyResource::Filter(_) => ResourceKind::Filter,
            AnyResource::User(_) => ResourceKind::User,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AnyResource::Namespace(r) => &r.name,
            AnyResource::Check(r) => &r.metadata.name,
            AnyResource::Handler(r) => &r.metadata.name,
            AnyResource::Filter(r) => &r.metadata.name,
            AnyResource::User(r) => &r.username,
        }
    }
}
