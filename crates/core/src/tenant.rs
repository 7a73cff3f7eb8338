//! Tenant configuration records.
//!
//! A `TenantConfig` is owned by the backend and cached client-side. Nothing
//! in the client mutates it in place; updates go through the tenant workflow
//! and come back as a fresh record.

use serde::{Deserialize, Serialize};

use crate::TenantId;

/// Lifecycle status of a tenant organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    #[default]
    Active,
    Trial,
    Suspended,
}

/// Feature flags gating optional product areas for a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantFeatures {
    pub ai_chatbot: bool,
    pub group_management: bool,
    pub job_board: bool,
    pub presentations: bool,
    pub analytics: bool,
    pub custom_branding: bool,
    pub sso: bool,
}

/// Plan limits. `None` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantLimits {
    pub max_users: Option<u32>,
    pub max_storage_gb: Option<u32>,
    pub max_api_calls_per_month: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantBranding {
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
}

/// Tenant-wide security policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityPolicy {
    pub require_mfa: bool,
    pub session_timeout_minutes: u32,
    pub password_min_length: usize,
    /// Empty means any email domain may register.
    pub allowed_email_domains: Vec<String>,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            require_mfa: false,
            session_timeout_minutes: 60,
            password_min_length: 8,
            allowed_email_domains: Vec::new(),
        }
    }
}

impl SecurityPolicy {
    /// Whether `email` is allowed to belong to this tenant.
    pub fn allows_email(&self, email: &str) -> bool {
        if self.allowed_email_domains.is_empty() {
            return true;
        }
        let Some((_, domain)) = email.rsplit_once('@') else {
            return false;
        };
        self.allowed_email_domains
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(domain))
    }
}

/// Descriptive record of a tenant organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    pub id: TenantId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    #[serde(default)]
    pub features: TenantFeatures,
    #[serde(default)]
    pub limits: TenantLimits,
    #[serde(default)]
    pub branding: TenantBranding,
    #[serde(default)]
    pub security: SecurityPolicy,
    #[serde(default)]
    pub status: TenantStatus,
}

impl TenantConfig {
    /// Minimal record with defaults everywhere else; the slug mirrors the id.
    pub fn new(id: impl Into<TenantId>, name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            slug: id.as_str().to_string(),
            id,
            name: name.into(),
            domain: None,
            custom_domain: None,
            features: TenantFeatures::default(),
            limits: TenantLimits::default(),
            branding: TenantBranding::default(),
            security: SecurityPolicy::default(),
            status: TenantStatus::default(),
        }
    }

    pub fn with_features(mut self, features: TenantFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status != TenantStatus::Suspended
    }
}
