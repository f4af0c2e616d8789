use serde::{Deserialize, Serialize};

use super::{namespaced_url, ObjectMeta, Resource, ResourceKind, UrlPurpose};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerType {
    Pipe,
    Tcp,
    Udp,
    Set,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerSocket {
    pub host: String,
    pub port: u16,
}

/// A Sensu event handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handler {
    pub metadata: ObjectMeta,
    #[serde(rename = "type")]
    pub handler_type: HandlerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handlers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<HandlerSocket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runtime_assets: Vec<String>,
}

impl Handler {
    pub fn pipe(metadata: ObjectMeta, command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::empty(metadata, HandlerType::Pipe)
        }
    }

    pub fn set(metadata: ObjectMeta, handlers: Vec<String>) -> Self {
        Self {
            handlers,
            ..Self::empty(metadata, HandlerType::Set)
        }
    }

    fn empty(metadata: ObjectMeta, handler_type: HandlerType) -> Self {
        Self {
            metadata,
            handler_type,
            command: None,
            filters: Vec::new(),
            handlers: Vec::new(),
            mutator: None,
            socket: None,
            timeout: None,
            runtime_assets: Vec::new(),
        }
    }
}

impl Resource for Handler {
    const KIND: ResourceKind = ResourceKind::Handler;

    fn collection_url(namespace: Option<&str>, name: Option<&str>) -> String {
        namespaced_url(
            namespace.unwrap_or(super::DEFAULT_NAMESPACE),
            Self::KIND.as_str(),
            name,
        )
    }

    fn url(&self, purpose: UrlPurpose) -> String {
        self.metadata.url(Self::KIND.as_str(), purpose)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.metadata.validate()?;
        match self.handler_type {
            HandlerType::Set if self.handlers.is_empty() => {
                Err(ValidationError::new("handlers", "required when type is set"))
            }
            HandlerType::Tcp | HandlerType::Udp if self.socket.is_none() => Err(
                ValidationError::new("socket", "required when type is tcp or udp"),
            ),
            HandlerType::Pipe if self.command.is_none() => {
                Err(ValidationError::new("command", "required when type is pipe"))
            }
            t if t != HandlerType::Pipe && self.command.is_some() => {
                Err(ValidationError::new("command", "only valid when type is pipe"))
            }
            t if t != HandlerType::Set && !self.handlers.is_empty() => {
                Err(ValidationError::new("handlers", "only valid when type is set"))
            }
            _ => Ok(()),
        }
    }
}
