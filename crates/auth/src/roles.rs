use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role of a user within a tenant.
///
/// Roles are opaque strings at this layer; the backend owns the mapping of
/// roles to permissions. A few well-known roles get constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const SUPER_ADMIN: Role = Role(Cow::Borrowed("super_admin"));
    pub const TENANT_ADMIN: Role = Role(Cow::Borrowed("tenant_admin"));
    pub const INSTRUCTOR: Role = Role(Cow::Borrowed("instructor"));
    pub const LEARNER: Role = Role(Cow::Borrowed("learner"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the role administers a tenant (or the whole platform).
    pub fn is_admin(&self) -> bool {
        *self == Self::SUPER_ADMIN || *self == Self::TENANT_ADMIN
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::LEARNER
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
