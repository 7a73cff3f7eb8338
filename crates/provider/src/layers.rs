//! The application's provider stacks.

use core::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::json;
use tracing::debug;

use skillhub_core::{TenantConfig, TenantFeatures, TenantId};

use crate::compose::{ProviderComposer, ProviderDescriptor};
use crate::state::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Theme,
    Router,
    Auth,
    Onboarding,
    Notification,
    AiChatbot,
    GroupManagement,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Theme => "ThemeProvider",
            ProviderKind::Router => "Router",
            ProviderKind::Auth => "AuthProvider",
            ProviderKind::Onboarding => "OnboardingProvider",
            ProviderKind::Notification => "NotificationProvider",
            ProviderKind::AiChatbot => "AiChatbotProvider",
            ProviderKind::GroupManagement => "GroupManagementProvider",
        };
        f.write_str(name)
    }
}

/// Layers every page sits in, tenant or not.
pub fn global_providers(theme: Theme) -> ProviderComposer<ProviderKind> {
    ProviderComposer::default()
        .with(ProviderDescriptor::new(ProviderKind::Theme).with_props(json!({ "defaultTheme": theme.as_str() })))
        .with(ProviderDescriptor::new(ProviderKind::Router))
}

/// Per-tenant layers, rebuilt only when the tenant or its feature flags
/// change.
#[derive(Debug, Default)]
pub struct TenantScopedProviders {
    cached: Mutex<Option<CachedStack>>,
}

#[derive(Debug)]
struct CachedStack {
    tenant_id: TenantId,
    features: TenantFeatures,
    composer: Arc<ProviderComposer<ProviderKind>>,
}

impl TenantScopedProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_tenant(&self, tenant: &TenantConfig) -> Arc<ProviderComposer<ProviderKind>> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(stack) = cached.as_ref() {
            if stack.tenant_id == tenant.id && stack.features == tenant.features {
                return stack.composer.clone();
            }
        }

        debug!(tenant_id = %tenant.id, "building tenant provider stack");
        let composer = Arc::new(build(tenant));
        *cached = Some(CachedStack {
            tenant_id: tenant.id.clone(),
            features: tenant.features,
            composer: composer.clone(),
        });
        composer
    }
}

fn build(tenant: &TenantConfig) -> ProviderComposer<ProviderKind> {
    let tenant_props = json!({ "tenantId": tenant.id });
    let TenantFeatures {
        ai_chatbot,
        group_management,
        ..
    } = tenant.features;

    ProviderComposer::default()
        .with(ProviderDescriptor::new(ProviderKind::Auth).with_props(tenant_props.clone()))
        .with(ProviderDescriptor::new(ProviderKind::Onboarding))
        .with(ProviderDescriptor::new(ProviderKind::Notification))
        .with(
            ProviderDescriptor::new(ProviderKind::AiChatbot)
                .with_props(tenant_props.clone())
                .when(move || ai_chatbot),
        )
        .with(
            ProviderDescriptor::new(ProviderKind::GroupManagement)
                .with_props(tenant_props)
                .when(move || group_management),
        )
}
