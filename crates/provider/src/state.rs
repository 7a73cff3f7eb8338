use serde::{Deserialize, Serialize};

use skillhub_auth::AuthUser;
use skillhub_core::TenantConfig;

/// Session view of the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<AuthUser>,
    pub token: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantState {
    pub current_tenant: Option<TenantConfig>,
    pub available_tenants: Vec<TenantConfig>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiNotification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub sidebar_open: bool,
    pub theme: Theme,
    pub notifications: Vec<UiNotification>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            theme: Theme::default(),
            notifications: Vec::new(),
        }
    }
}

/// Everything the client knows about the current session.
///
/// Only ever replaced through [`crate::reduce`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalState {
    pub auth: AuthState,
    pub tenant: TenantState,
    pub ui: UiState,
}

impl GlobalState {
    /// The tenant the session currently acts in: the loaded tenant config,
    /// else the signed-in user's tenant.
    pub fn current_tenant_id(&self) -> Option<&skillhub_core::TenantId> {
        self.tenant
            .current_tenant
            .as_ref()
            .map(|t| &t.id)
            .or_else(|| self.auth.user.as_ref().map(|u| &u.tenant_id))
    }
}
