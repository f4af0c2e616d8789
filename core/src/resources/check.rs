use serde::{Deserialize, Serialize};

use super::{namespaced_url, ObjectMeta, Resource, ResourceKind, UrlPurpose};
use crate::error::ValidationError;

/// A Sensu check definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub metadata: ObjectMeta,
    pub command: String,
    pub subscriptions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handlers: Vec<String>,
    #[serde(default)]
    pub publish: bool,
    #[serde(default)]
    pub round_robin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_entity_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_requests: Option<CheckProxyRequests>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runtime_assets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckProxyRequests {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_attributes: Vec<String>,
    #[serde(default)]
    pub splay: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splay_coverage: Option<u32>,
}

impl Check {
    pub fn new(
        metadata: ObjectMeta,
        command: impl Into<String>,
        subscriptions: Vec<String>,
    ) -> Self {
        Self {
            metadata,
            command: command.into(),
            subscriptions,
            interval: None,
            cron: None,
            handlers: Vec::new(),
            publish: false,
            round_robin: false,
            timeout: None,
            ttl: None,
            proxy_entity_name: None,
            proxy_requests: None,
            runtime_assets: Vec::new(),
        }
    }
}

impl Resource for Check {
    const KIND: ResourceKind = ResourceKind::Check;

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
        if self.command.trim().is_empty() {
            return Err(ValidationError::new("command", "must not be empty"));
        }
        if self.subscriptions.is_empty() {
            return Err(ValidationError::new(
                "subscriptions",
                "must have at least one subscription name",
            ));
        }
        if self.interval.is_some() && self.cron.is_some() {
            return Err(ValidationError::new(
                "cron",
                "interval and cron are mutually exclusive",
            ));
        }
        if let Some(proxy) = &self.proxy_requests {
            if proxy.splay && proxy.splay_coverage.is_none() {
                return Err(ValidationError::new(
                    "proxy_requests.splay_coverage",
                    "must be set when splay is true",
                ));
            }
        }
        Ok(())
    }
}
