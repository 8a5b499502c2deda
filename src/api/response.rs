//! Response envelopes
//!
//! Two templates wrap a list of results:
//!
//! - [`PaginatedEnvelope`]: `count`, `next`, `previous`, `results`
//! - [`ItemEnvelope`]: `count`, `items`
//!
//! Each is specialized per item type through generics; the schema name of a
//! specialization is `<Template>[<Item>]`.

use std::borrow::Cow;
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize, Serializer};
use url::Url;

use super::schema::{capitalize, Schema, SchemaRef};
use crate::error::ValidationError;

/// Envelope templates that can be specialized per item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeTemplate {
    /// `count` / `next` / `previous` / `results`
    Paginated,
    /// `count` / `items`
    Items,
}

impl EnvelopeTemplate {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Paginated => "PaginatedEnvelope",
            Self::Items => "ItemEnvelope",
        }
    }

    /// Name the envelope specialized for `T`.
    ///
    /// Deterministic for a given `T`; nothing is cached or registered.
    pub fn specialize<T: Schema + ?Sized>(self) -> SchemaRef {
        SchemaRef::new(format!(
            "{}[{}]",
            self.name(),
            capitalize(&T::schema_name())
        ))
    }
}

/// Absolute `http`/`https` URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Url")]
pub struct HttpUrl(Url);

impl HttpUrl {
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<Url> for HttpUrl {
    type Error = ValidationError;

    fn try_from(url: Url) -> Result<Self, Self::Error> {
        match url.scheme() {
            "http" | "https" if url.has_host() => Ok(Self(url)),
            scheme => Err(ValidationError::new(format!(
                "URL scheme should be 'http' or 'https', got '{scheme}'"
            ))),
        }
    }
}

impl Serialize for HttpUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

impl fmt::Display for HttpUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Offset-paginated list response.
///
/// `count` is the total across all pages, so `results.len()` is usually
/// smaller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedEnvelope<T> {
    pub count: u64,
    pub next: Option<HttpUrl>,
    pub previous: Option<HttpUrl>,
    pub results: Vec<T>,
}

impl<T> PaginatedEnvelope<T> {
    pub fn new(
        count: u64,
        next: Option<HttpUrl>,
        previous: Option<HttpUrl>,
        results: Vec<T>,
    ) -> Self {
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

impl<T: DeserializeOwned> PaginatedEnvelope<T> {
    /// Validate an untyped payload against this specialization.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        Ok(serde_json::from_value(value)?)
    }
}

impl<T: Schema> Schema for PaginatedEnvelope<T> {
    fn schema_name() -> Cow<'static, str> {
        Cow::Owned(EnvelopeTemplate::Paginated.specialize::<T>().into_name())
    }
}

impl<T: Serialize> IntoResponse for PaginatedEnvelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Simple `count` + `items` list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEnvelope<T> {
    pub count: u64,
    pub items: Vec<T>,
}

impl<T> ItemEnvelope<T> {
    pub fn new(count: u64, items: Vec<T>) -> Self {
        Self { count, items }
    }
}

impl<T: DeserializeOwned> ItemEnvelope<T> {
    pub fn from_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        Ok(serde_json::from_value(value)?)
    }
}

impl<T: Schema> Schema for ItemEnvelope<T> {
    fn schema_name() -> Cow<'static, str> {
        Cow::Owned(EnvelopeTemplate::Items.specialize::<T>().into_name())
    }
}

impl<T: Serialize> IntoResponse for ItemEnvelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Helper for creating responses with status codes
pub struct Created<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}
