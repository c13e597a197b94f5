//! Identity types: namespaced identifiers, owners and modifier ids.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::category::EntityCategory;
use crate::error::{ErrorSeverity, StatError};

/// Namespace used by the builtin attribute catalog and builtin modifier sources.
pub const STATCORE_NAMESPACE: &str = "statcore";

/// Errors raised when constructing or parsing an [`Identifier`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier `{input}` is missing the `namespace:path` separator")]
    MissingSeparator { input: String },

    #[error("identifier namespace `{namespace}` must match [a-z0-9_.-]+")]
    InvalidNamespace { namespace: String },

    #[error("identifier path `{path}` must match [a-z0-9_./]+")]
    InvalidPath { path: String },
}

impl StatError for IdentifierError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingSeparator { .. } => "IDENTIFIER_MISSING_SEPARATOR",
            Self::InvalidNamespace { .. } => "IDENTIFIER_INVALID_NAMESPACE",
            Self::InvalidPath { .. } => "IDENTIFIER_INVALID_PATH",
        }
    }
}

/// Globally unique namespaced identifier (`namespace:path`).
///
/// Used both for attribute definitions and for modifier source tags. Builtin
/// identifiers are `const` and borrow static strings; identifiers built at
/// runtime own their text.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier {
    namespace: Cow<'static, str>,
    path: Cow<'static, str>,
}

impl Identifier {
    /// Builds an identifier from static parts without validation.
    ///
    /// Intended for compile-time constants whose text is known to be valid.
    pub const fn from_static(namespace: &'static str, path: &'static str) -> Self {
        Self {
            namespace: Cow::Borrowed(namespace),
            path: Cow::Borrowed(path),
        }
    }

    /// Builds a validated identifier.
    pub fn new(
        namespace: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<Self, IdentifierError> {
        let namespace = namespace.into();
        let path = path.into();

        if !is_valid_namespace(&namespace) {
            return Err(IdentifierError::InvalidNamespace { namespace });
        }
        if !is_valid_path(&path) {
            return Err(IdentifierError::InvalidPath { path });
        }

        Ok(Self {
            namespace: Cow::Owned(namespace),
            path: Cow::Owned(path),
        })
    }

    /// Builds a validated identifier in the `statcore` namespace.
    pub fn statcore(path: impl Into<String>) -> Result<Self, IdentifierError> {
        Self::new(STATCORE_NAMESPACE, path)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, path) =
            s.split_once(':')
                .ok_or_else(|| IdentifierError::MissingSeparator {
                    input: s.to_owned(),
                })?;
        Self::new(namespace, path)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Identifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Identifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = <std::string::String as serde::Deserialize>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

fn is_valid_namespace(namespace: &str) -> bool {
    !namespace.is_empty()
        && namespace
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_' | b'.' | b'-'))
}

fn is_valid_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_' | b'.' | b'/'))
}

/// Stable identity of a host entity that owns attributes.
///
/// The core never holds the entity itself, only this key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OwnerId(pub u64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An owner identity together with its host-supplied category.
///
/// Every gated read and write takes an `OwnerRef` so applicability can be
/// checked without reaching back into the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OwnerRef {
    pub id: OwnerId,
    pub category: EntityCategory,
}

impl OwnerRef {
    pub const fn new(id: OwnerId, category: EntityCategory) -> Self {
        Self { id, category }
    }

    pub const fn player(id: u64) -> Self {
        Self::new(OwnerId(id), EntityCategory::Player)
    }

    pub const fn monster(id: u64) -> Self {
        Self::new(OwnerId(id), EntityCategory::Monster)
    }
}

/// Unique identifier of a [`Modifier`](crate::modifier::Modifier).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierId(Uuid);

impl ModifierId {
    /// Generates a random (v4) identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Deterministic identifier, handy for well-known modifiers and tests.
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ModifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
