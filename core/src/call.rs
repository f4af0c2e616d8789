//! The method + path + payload triple handed to `Client::dispatch`.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::resources::{Resource, UrlPurpose};

/// One API call described as data: where it goes and what it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct CallData {
    pub method: HttpMethod,
    /// Path relative to the endpoint's base URL, e.g. `/api/core/v2/namespaces`.
    pub path: String,
    pub fields: Option<Value>,
}

impl CallData {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            fields: None,
        }
    }

    pub fn post(path: impl Into<String>, fields: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            fields: Some(fields),
        }
    }

    /// POST of `obj` to `url`, or to its creation URL. Fails without building
    /// anything if `obj` does not validate.
    pub fn create<R: Resource>(obj: &R, url: Option<&str>) -> Result<Self, ApiError> {
        obj.validate()?;
        Ok(Self {
            method: HttpMethod::Post,
            path: resolve_url(obj, url, UrlPurpose::Create),
            fields: Some(to_fields(obj)?),
        })
    }

    /// PUT of `obj` to `url`, or to its canonical URL, after validation.
    pub fn update<R: Resource>(obj: &R, url: Option<&str>) -> Result<Self, ApiError> {
        obj.validate()?;
        Ok(Self {
            method: HttpMethod::Put,
            path: resolve_url(obj, url, UrlPurpose::Canonical),
            fields: Some(to_fields(obj)?),
        })
    }

    pub fn delete<R: Resource>(obj: &R, url: Option<&str>) -> Self {
        Self {
            method: HttpMethod::Delete,
            path: resolve_url(obj, url, UrlPurpose::Canonical),
            fields: None,
        }
    }

    /// The request body: `fields` serialized as JSON text.
    pub fn body(&self) -> Result<Option<String>, ApiError> {
        self.fields
            .as_ref()
            .map(|fields| {
                serde_json::to_string(fields).map_err(|e| ApiError::SerializationError(e.to_string()))
            })
            .transpose()
    }
}

fn resolve_url<R: Resource>(obj: &R, url: Option<&str>, purpose: UrlPurpose) -> String {
    match url {
        Some(url) => url.to_string(),
        None => obj.url(purpose),
    }
}

fn to_fields<T: Serialize>(obj: &T) -> Result<Value, ApiError> {
    serde_json::to_value(obj).map_err(|e| ApiError::SerializationError(e.to_string()))
}
