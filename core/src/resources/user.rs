use serde::{Deserialize, Serialize};

use super::{cluster_url, Resource, ResourceKind, UrlPurpose};
use crate::client::Client;
use crate::error::{ApiError, ValidationError};
use crate::http::Transport;

const MIN_PASSWORD_LEN: usize = 8;

/// A Sensu user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub disabled: bool,
    /// Only sent when creating a user; never returned by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl User {
    pub fn new(username: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            username: username.into(),
            groups,
            disabled: false,
            password: None,
        }
    }

    /// Disabling a user is a DELETE on its canonical URL.
    pub fn disable<T: Transport>(&mut self, client: &mut Client<T>) -> Result<(), ApiError> {
        client.resource_delete(&*self, None)?;
        self.disabled = true;
        Ok(())
    }

    pub fn reinstate<T: Transport>(&mut self, client: &mut Client<T>) -> Result<(), ApiError> {
        let url = format!("{}/reinstate", self.url(UrlPurpose::Canonical));
        client.resource_put(&*self, Some(&url))?;
        self.disabled = false;
        Ok(())
    }
}

impl Resource for User {
    const KIND: ResourceKind = ResourceKind::User;

    fn collection_url(_namespace: Option<&str>, name: Option<&str>) -> String {
        cluster_url(Self::KIND.as_str(), name)
    }

    fn url(&self, purpose: UrlPurpose) -> String {
        match purpose {
            UrlPurpose::Create => cluster_url(Self::KIND.as_str(), None),
            UrlPurpose::Canonical => cluster_url(Self::KIND.as_str(), Some(&self.username)),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::new("username", "must not be empty"));
        }
        match &self.password {
            Some(p) if p.chars().count() < MIN_PASSWORD_LEN => Err(ValidationError::new(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters long"),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_password_is_rejected() {
        let mut user = User::new("bob", vec!["ops".into()]);
        user.password = Some("short".into());
        assert_eq!(user.validate().unwrap_err().field, "password");

        user.password = Some("long enough".into());
        assert!(user.validate().is_ok());
    }

    #[test]
    fn password_is_not_serialized_when_absent() {
        let user = User::new("bob", vec![]);
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["disabled"], false);
    }

    #[test]
    fn urls() {
        let user = User::new("bob", vec![]);
        assert_eq!(user.url(UrlPurpose::Create), "/api/core/v2/users");
        assert_eq!(user.url(UrlPurpose::Canonical), "/api/core/v2/users/bob");
    }
}
