use serde::{Deserialize, Serialize};

use super::{cluster_url, Resource, ResourceKind, UrlPurpose};
use crate::error::ValidationError;

/// A Sensu namespace. Cluster-wide; the body is just `{"name": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Resource for Namespace {
    const KIND: ResourceKind = ResourceKind::Namespace;

    fn collection_url(_namespace: Option<&str>, name: Option<&str>) -> String {
        cluster_url(Self::KIND.as_str(), name)
    }

    fn url(&self, purpose: UrlPurpose) -> String {
        match purpose {
            UrlPurpose::Create => cluster_url(Self::KIND.as_str(), None),
            UrlPurpose::Canonical => cluster_url(Self::KIND.as_str(), Some(&self.name)),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "must not be empty"));
        }
        Ok(())
    }
}
