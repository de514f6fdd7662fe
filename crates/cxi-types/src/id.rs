use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The shape of identifier an entity kind is addressed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdShape {
    /// A 64-bit numeric id (pages, spaces, attachments, groups, ...).
    Numeric,
    /// An opaque string key (user implementations keyed by credential key).
    Key,
}

/// Identifier of a decoded entity.
///
/// Numeric ids order numerically and sort before string keys; keys order
/// lexicographically. This gives deterministic enumeration order in the
/// store.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Numeric(i64),
    Key(String),
}

impl EntityId {
    /// Parse the text of an `<id>` element according to the expected shape.
    pub fn parse(shape: IdShape, text: &str) -> Result<Self, TypeError> {
        let text = text.trim();
        match shape {
            IdShape::Numeric => text
                .parse::<i64>()
                .map(Self::Numeric)
                .map_err(|_| TypeError::InvalidNumericId(text.to_string())),
            IdShape::Key if text.is_empty() => Err(TypeError::EmptyKey),
            IdShape::Key => Ok(Self::Key(text.to_string())),
        }
    }

    /// The shape of this identifier.
    pub fn shape(&self) -> IdShape {
        match self {
            Self::Numeric(_) => IdShape::Numeric,
            Self::Key(_) => IdShape::Key,
        }
    }

    /// The numeric value, if this is a numeric id.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Key(_) => None,
        }
    }

    /// The string key, if this is a key id.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Numeric(_) => None,
            Self::Key(k) => Some(k),
        }
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "EntityId({n})"),
            Self::Key(k) => write!(f, "EntityId({k:?})"),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Key(k) => f.write_str(k),
        }
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        Self::Numeric(n)
    }
}

impl From<&str> for EntityId {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}
