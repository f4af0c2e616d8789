use serde::{Deserialize, Serialize};

use super::{namespaced_url, ObjectMeta, Resource, ResourceKind, UrlPurpose};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterAction {
    Allow,
    Deny,
}

/// A Sensu event filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub metadata: ObjectMeta,
    pub action: FilterAction,
    #[serde(default)]
    pub expressions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runtime_assets: Vec<String>,
}

impl Filter {
    pub fn new(metadata: ObjectMeta, action: FilterAction, expressions: Vec<String>) -> Self {
        Self {
            metadata,
            action,
            expressions,
            runtime_assets: Vec::new(),
        }
    }
}

impl Resource for Filter {
    const KIND: ResourceKind = ResourceKind::Filter;

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
        if self.expressions.iter().any(|e| e.trim().is_empty()) {
            return Err(ValidationError::new("expressions", "must not contain blanks"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_serializes_lowercase() {
        let filter = Filter::new(
            ObjectMeta::new("state_change_only", "default"),
            FilterAction::Allow,
            vec!["event.check.occurrences == 1".into()],
        );
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["action"], "allow");
        assert_eq!(
            filter.url(UrlPurpose::Canonical),
            "/api/core/v2/namespaces/default/filters/state_change_only"
        );
    }

    #[test]
    fn blank_expression_is_invalid() {
        let filter = Filter::new(
            ObjectMeta::new("f", "default"),
            FilterAction::Deny,
            vec!["  ".into()],
        );
        assert_eq!(filter.validate().unwrap_err().field, "expressions");
    }
}
