//! Three-state configuration values
//!
//! A route that says nothing about `auth` inherits the controller's policy; a
//! route that says `auth: null` has no auth at all. A plain `Option` cannot
//! tell those apart, [`Setting`] can.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting<T> {
    /// Nothing configured; inherit from the enclosing scope.
    NotSet,
    /// Explicitly configured as absent.
    Disabled,
    /// Explicitly configured value.
    Value(T),
}

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Self::NotSet
    }
}

impl<T> Setting<T> {
    pub fn is_not_set(&self) -> bool {
        matches!(self, Self::NotSet)
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    pub fn as_ref(&self) -> Setting<&T> {
        match self {
            Self::NotSet => Setting::NotSet,
            Self::Disabled => Setting::Disabled,
            Self::Value(value) => Setting::Value(value),
        }
    }

    /// Fall back to `parent` only when nothing was configured here.
    pub fn or_inherit(self, parent: Setting<T>) -> Setting<T> {
        match self {
            Self::NotSet => parent,
            configured => configured,
        }
    }

    /// Collapse to an `Option`, treating "not set" like "disabled".
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::NotSet | Self::Disabled => None,
        }
    }
}

impl<T> From<Option<T>> for Setting<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Value(value),
            None => Self::Disabled,
        }
    }
}

// A missing field never reaches the deserializer; `#[serde(default)]` turns it
// into `NotSet`. An explicit `null` arrives here as `None`.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Setting<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

impl<T: Serialize> Serialize for Setting<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::NotSet | Self::Disabled => serializer.serialize_none(),
        }
    }
}

/// Name of an authentication policy, e.g. `"bearer"` or `"session"`.
///
/// Routes only carry the name. Enforcement happens in front of the router.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthPolicy(String);

impl AuthPolicy {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
