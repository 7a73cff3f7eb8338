//! Wiring: config → session store → HTTP client → mounted provider.

use std::sync::Arc;

use anyhow::Context as _;
use serde_json::{Value, json};
use tracing::{info, warn};

use skillhub_auth::{LoginCredentials, RegisterData};
use skillhub_client::{ClientConfig, HttpPlatformApi, PlatformApi};
use skillhub_core::{TenantId, TenantResolution, TenantResolver, TenantSource};
use skillhub_provider::{TenantScopedProviders, Theme, WorkflowProvider, global_providers};
use skillhub_session::{SessionStore, SqliteSessionStore, keys, load_json};
use skillhub_workflow::WorkflowManager;

use crate::cli::Command;

pub struct App {
    config: ClientConfig,
    api: Arc<dyn PlatformApi>,
    provider: WorkflowProvider,
    scoped: TenantScopedProviders,
}

impl App {
    pub async fn connect(config: ClientConfig) -> anyhow::Result<Self> {
        let session: Arc<dyn SessionStore> = match &config.session_db {
            Some(url) => Arc::new(SqliteSessionStore::new(url.clone())),
            None => Arc::new(SqliteSessionStore::open_default().context("locating session database")?),
        };
        let api: Arc<dyn PlatformApi> = Arc::new(HttpPlatformApi::new(&config.api_url));

        let stored = match load_json::<TenantId>(session.as_ref(), keys::CURRENT_TENANT_ID).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "stored tenant pointer unreadable");
                None
            }
        };
        let resolution = resolve_tenant(&config, stored.as_ref());
        let tenant_id = resolution
            .as_ref()
            .map(|r| r.tenant_id.clone())
            .unwrap_or_else(|| config.default_tenant.clone());
        info!(api_url = %config.api_url, %tenant_id, "connecting");

        let provider = WorkflowProvider::mount(
            Arc::new(WorkflowManager::new()),
            api.clone(),
            session,
            tenant_id,
        )
        .await;

        // A tenant named by the address outranks whatever the cached session
        // was last using.
        if let Some(pinned) = addressed_tenant(resolution.as_ref()) {
            let current = provider.state().current_tenant_id().cloned();
            if current.as_ref() != Some(pinned) {
                info!(tenant_id = %pinned, cached = ?current, "switching to addressed tenant");
                if let Err(err) = provider.switch_tenant(pinned).await {
                    warn!(tenant_id = %pinned, error = %err, "could not switch to addressed tenant");
                }
            }
        }

        Ok(Self {
            config,
            api,
            provider,
            scoped: TenantScopedProviders::new(),
        })
    }

    /// Run one command; the returned text goes to stdout.
    pub async fn run(&self, command: Command) -> anyhow::Result<String> {
        let provider = &self.provider;

        let output = match command {
            Command::Status => {
                let state = provider.state();
                json!({
                    "apiUrl": self.config.api_url,
                    "backendReachable": self.api.health().await,
                    "authenticated": state.auth.is_authenticated,
                    "user": state.auth.user,
                    "tenantId": state.current_tenant_id(),
                })
            }
            Command::Login { email, password } => {
                let user = provider.login(&LoginCredentials::new(email, password)).await?;
                json!({ "user": user })
            }
            Command::Register { email, password, name } => {
                let user = provider.register(&RegisterData::new(email, password, name)).await?;
                json!({ "user": user })
            }
            Command::Logout => {
                provider.logout().await;
                json!({ "authenticated": provider.is_authenticated() })
            }
            Command::Refresh => {
                provider.refresh_session().await?;
                json!({ "refreshed": true })
            }
            Command::Tenants => serde_json::to_value(provider.get_all_tenants().await?)?,
            Command::Current => serde_json::to_value(provider.get_current_tenant().await?)?,
            Command::Switch { tenant_id } => {
                let tenant_id = TenantId::parse(&tenant_id)?;
                serde_json::to_value(provider.switch_tenant(&tenant_id).await?)?
            }
            Command::Tree { theme } => return Ok(self.tree(theme.into())),
            Command::Run { workflow_id, data } => {
                let data: Value = serde_json::from_str(&data).context("payload is not valid JSON")?;
                serde_json::to_value(provider.execute_workflow(&workflow_id, data).await)?
            }
        };

        Ok(serde_json::to_string_pretty(&output)?)
    }

    fn tree(&self, theme: Theme) -> String {
        let global = global_providers(theme);
        let composer = match self.provider.tenant().current_tenant {
            Some(tenant) => global.then(&self.scoped.for_tenant(&tenant)),
            None => global,
        };
        composer.compose("App").to_string()
    }
}

/// Tenant to act in before anything is loaded: from the address the client
/// was opened with, else the stored pointer. `None` leaves the configured
/// default.
pub fn resolve_tenant(config: &ClientConfig, stored: Option<&TenantId>) -> Option<TenantResolution> {
    let mut resolver = TenantResolver::new();
    if let Some(domain) = &config.base_domain {
        resolver = resolver.with_base_domain(domain.clone());
    }
    for (host, tenant_id) in &config.custom_domains {
        resolver = resolver.with_custom_domain(host.clone(), tenant_id.clone());
    }

    let (host, path) = match config.tenant_url.as_deref().map(reqwest::Url::parse) {
        Some(Ok(url)) => (url.host_str().unwrap_or_default().to_string(), url.path().to_string()),
        Some(Err(err)) => {
            warn!(error = %err, "ignoring unparsable SKILLHUB_TENANT_URL");
            (String::new(), String::new())
        }
        None => (String::new(), String::new()),
    };

    resolver.resolve(&host, &path, stored)
}

/// The resolved tenant when it came from the address rather than the cache.
fn addressed_tenant(resolution: Option<&TenantResolution>) -> Option<&TenantId> {
    resolution
        .filter(|r| r.source != TenantSource::Stored)
        .map(|r| &r.tenant_id)
}
