//! Client configuration (environment driven).

use skillhub_core::TenantId;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_TENANT_ID: &str = "default";

/// Startup configuration, read once from the environment.
///
/// | Variable | Default |
/// |---|---|
/// | `SKILLHUB_API_URL` | `http://localhost:3000` |
/// | `SKILLHUB_TENANT_ID` | `default` |
/// | `SKILLHUB_BASE_DOMAIN` | unset (no subdomain resolution) |
/// | `SKILLHUB_CUSTOM_DOMAINS` | unset; `learn.acme.com=acme,portal.globex.io=globex` |
/// | `SKILLHUB_TENANT_URL` | unset (address the client was opened with) |
/// | `SKILLHUB_SESSION_DB` | unset (OS data dir) |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub default_tenant: TenantId,
    pub base_domain: Option<String>,
    /// Hosts mapped straight to a tenant, in declaration order.
    pub custom_domains: Vec<(String, TenantId)>,
    pub tenant_url: Option<String>,
    pub session_db: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            default_tenant: TenantId::new(DEFAULT_TENANT_ID),
            base_domain: None,
            custom_domains: Vec::new(),
            tenant_url: None,
            session_db: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let default_tenant = match get("SKILLHUB_TENANT_ID") {
            Some(raw) => TenantId::parse(&raw).unwrap_or_else(|err| {
                tracing::warn!("ignoring SKILLHUB_TENANT_ID: {err}");
                defaults.default_tenant.clone()
            }),
            None => defaults.default_tenant.clone(),
        };

        Self {
            api_url: get("SKILLHUB_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            default_tenant,
            base_domain: get("SKILLHUB_BASE_DOMAIN"),
            custom_domains: get("SKILLHUB_CUSTOM_DOMAINS")
                .map(|raw| parse_custom_domains(&raw))
                .unwrap_or_default(),
            tenant_url: get("SKILLHUB_TENANT_URL"),
            session_db: get("SKILLHUB_SESSION_DB"),
        }
    }
}

/// `host=tenant` pairs separated by commas. Malformed pairs are skipped.
fn parse_custom_domains(raw: &str) -> Vec<(String, TenantId)> {
    raw.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| {
            let parsed = entry
                .split_once('=')
                .map(|(host, tenant)| (host.trim(), tenant))
                .filter(|(host, _)| !host.is_empty())
                .and_then(|(host, tenant)| TenantId::parse(tenant).ok().map(|id| (host.to_string(), id)));
            if parsed.is_none() {
                tracing::warn!(entry, "ignoring malformed SKILLHUB_CUSTOM_DOMAINS entry");
            }
            parsed
        })
        .collect()
}
