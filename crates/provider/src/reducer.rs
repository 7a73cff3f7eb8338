//! The single transition function over [`GlobalState`].

use skillhub_auth::AuthUser;
use skillhub_core::TenantConfig;

use crate::state::{AuthState, GlobalState, Theme, UiNotification};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Restore a previously persisted session.
    Hydrate {
        user: Option<AuthUser>,
        token: Option<String>,
        tenant: Option<TenantConfig>,
    },
    AuthStart,
    AuthSuccess {
        user: AuthUser,
        token: String,
        tenant: Option<TenantConfig>,
    },
    AuthFailure(String),
    TokenRefreshed(String),
    Logout,
    TenantStart,
    /// Make `0` the current tenant and re-point the signed-in user at it.
    TenantSuccess(TenantConfig),
    TenantFailure(String),
    TenantsLoaded(Vec<TenantConfig>),
    ToggleSidebar,
    SetTheme(Theme),
    Notify(UiNotification),
    DismissNotification(u64),
    ClearErrors,
}

/// Apply `action` to `state`, returning the next state.
///
/// Pure: no IO, no clock, no randomness.
pub fn reduce(state: &GlobalState, action: &Action) -> GlobalState {
    let mut next = state.clone();

    match action {
        Action::Hydrate { user, token, tenant } => {
            if let (Some(user), Some(token)) = (user, token) {
                next.auth = AuthState {
                    is_authenticated: true,
                    user: Some(user.clone()),
                    token: Some(token.clone()),
                    loading: false,
                    error: None,
                };
            }
            if tenant.is_some() {
                next.tenant.current_tenant = tenant.clone();
            }
        }
        Action::AuthStart => {
            next.auth.loading = true;
            next.auth.error = None;
        }
        Action::AuthSuccess { user, token, tenant } => {
            next.auth = AuthState {
                is_authenticated: true,
                user: Some(user.clone()),
                token: Some(token.clone()),
                loading: false,
                error: None,
            };
            // The held tenant only survives if the user still belongs to it.
            let stale = next
                .tenant
                .current_tenant
                .as_ref()
                .is_some_and(|current| current.id != user.tenant_id);
            if tenant.is_some() || stale {
                next.tenant.current_tenant = tenant.clone();
            }
        }
        Action::AuthFailure(message) => {
            next.auth = AuthState {
                error: Some(message.clone()),
                ..AuthState::default()
            };
        }
        Action::TokenRefreshed(token) => {
            next.auth.token = Some(token.clone());
        }
        Action::Logout => {
            next.auth = AuthState::default();
        }
        Action::TenantStart => {
            next.tenant.loading = true;
            next.tenant.error = None;
        }
        Action::TenantSuccess(config) => {
            next.auth.user = next.auth.user.map(|user| user.in_tenant(config.id.clone()));
            next.tenant.current_tenant = Some(config.clone());
            next.tenant.loading = false;
            next.tenant.error = None;
        }
        Action::TenantFailure(message) => {
            next.tenant.loading = false;
            next.tenant.error = Some(message.clone());
        }
        Action::TenantsLoaded(tenants) => {
            next.tenant.available_tenants = tenants.clone();
            next.tenant.loading = false;
            next.tenant.error = None;
        }
        Action::ToggleSidebar => {
            next.ui.sidebar_open = !next.ui.sidebar_open;
        }
        Action::SetTheme(theme) => {
            next.ui.theme = *theme;
        }
        Action::Notify(notification) => {
            next.ui.notifications.push(notification.clone());
        }
        Action::DismissNotification(id) => {
            next.ui.notifications.retain(|n| n.id != *id);
        }
        Action::ClearErrors => {
            next.auth.error = None;
            next.tenant.error = None;
        }
    }

    next
}
