//! Tenant identifier type.
//!
//! This module defines the [`TenantId`] type, an opaque identifier for the
//! customer or organization whose rows a request is scoped to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An opaque tenant identifier.
///
/// The identifier is compared byte-for-byte against the `tenant_id` column of
/// tenant-scoped tables and the `tenant_id` field of search documents.
///
/// # Examples
///
/// ```
/// use atrium_data::tenant::TenantId;
///
/// let tenant = TenantId::new("tenant-2");
/// assert_eq!(tenant.as_str(), "tenant-2");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant ID from the given string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parses a stored or user-supplied value, treating blank input as "no tenant".
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Examples
    ///
    /// ```
    /// use atrium_data::tenant::TenantId;
    ///
    /// assert_eq!(TenantId::parse(" tenant-1 "), Some(TenantId::new("tenant-1")));
    /// assert_eq!(TenantId::parse("   "), None);
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self::new(trimmed))
        }
    }

    /// Returns the tenant ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the ID and returns the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantId({})", self.0)
    }
}

impl FromStr for TenantId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TenantId::new(s))
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        TenantId::new(s)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        TenantId::new(s)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
