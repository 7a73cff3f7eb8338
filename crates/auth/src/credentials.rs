//! Login and registration payloads, with the client-side checks run before
//! anything goes over the wire.

use serde::{Deserialize, Serialize};

use skillhub_core::{DomainError, DomainResult, SecurityPolicy, TenantId};

use crate::Role;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            remember_me: false,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(DomainError::field("password", "password is required"));
        }
        Ok(())
    }
}

impl core::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl RegisterData {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: name.into(),
            tenant_id: None,
            role: None,
        }
    }

    /// Validate against the default security policy.
    pub fn validate(&self) -> DomainResult<()> {
        self.validate_for(&SecurityPolicy::default())
    }

    /// Validate against a tenant's security policy (password length, email
    /// domain allow-list).
    pub fn validate_for(&self, policy: &SecurityPolicy) -> DomainResult<()> {
        validate_email(&self.email)?;
        if !policy.allows_email(&self.email) {
            return Err(DomainError::field(
                "email",
                "email domain is not allowed for this tenant",
            ));
        }
        if self.password.chars().count() < policy.password_min_length {
            return Err(DomainError::field(
                "password",
                format!(
                    "password must be at least {} characters",
                    policy.password_min_length
                ),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::field("name", "name is required"));
        }
        Ok(())
    }
}

impl core::fmt::Debug for RegisterData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisterData")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("tenant_id", &self.tenant_id)
            .field("role", &self.role)
            .finish()
    }
}

fn validate_email(email: &str) -> DomainResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DomainError::field("email", "invalid email format"))
    }
}
