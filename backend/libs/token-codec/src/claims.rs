//! Identity claim carried by a verified token

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Subject identifier, either an opaque string or an integer
///
/// Issuers disagree on the type of `sub` (database row ids vs. external ids);
/// both are kept exactly as issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Numeric(id) => write!(f, "{id}"),
            Subject::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for Subject {
    fn from(id: i64) -> Self {
        Subject::Numeric(id)
    }
}

impl From<&str> for Subject {
    fn from(id: &str) -> Self {
        Subject::Text(id.to_string())
    }
}

impl From<String> for Subject {
    fn from(id: String) -> Self {
        Subject::Text(id)
    }
}

/// Decoded payload of a valid token
///
/// `sub` and `iat` are required; a payload without them is malformed.
/// Any member not modelled here lands in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityClaim {
    /// Subject (user or vendor identifier)
    pub sub: Subject,

    /// Role / permission tag
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Not before (Unix timestamp)
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Remaining payload members, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Optional member that must not be `null` when present
///
/// A missing key falls back to `None` through `#[serde(default)]`; an explicit
/// `null` is a type error, so `"exp": null` cannot disable expiry.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl IdentityClaim {
    pub fn new(sub: impl Into<Subject>, iat: i64) -> Self {
        Self {
            sub: sub.into(),
            role: None,
            iat,
            exp: None,
            nbf: None,
            extra: Map::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_expiry(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    pub fn with_not_before(mut self, nbf: i64) -> Self {
        self.nbf = Some(nbf);
        self
    }

    /// Attach an extra payload member (e.g. `email`, `iss`)
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Check the role tag
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }

    /// Check if the subject matches a resource owner
    pub fn is_owner(&self, owner: &Subject) -> bool {
        &self.sub == owner
    }
}
