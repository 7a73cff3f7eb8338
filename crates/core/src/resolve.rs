//! Tenant identification from the address the client was opened with.
//!
//! Resolution order:
//! 1. custom domain (`learn.acme.com` mapped explicitly to a tenant)
//! 2. subdomain of the platform domain (`acme.skillhub.io`)
//! 3. path prefix (`/tenant/acme/...`)
//! 4. the tenant id stored in the local session (development fallback)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::TenantId;

const PATH_PREFIX: &str = "tenant";
const RESERVED_SUBDOMAINS: &[&str] = &["www", "app", "api", "admin"];

/// Where a resolved tenant id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TenantSource {
    CustomDomain,
    Subdomain,
    PathPrefix,
    Stored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantResolution {
    pub tenant_id: TenantId,
    pub source: TenantSource,
}

/// Resolves the active tenant from host/path information.
#[derive(Debug, Clone, Default)]
pub struct TenantResolver {
    base_domain: Option<String>,
    custom_domains: HashMap<String, TenantId>,
}

impl TenantResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform domain under which tenants get a subdomain each.
    pub fn with_base_domain(mut self, domain: impl Into<String>) -> Self {
        self.base_domain = Some(normalize_host(&domain.into()));
        self
    }

    pub fn with_custom_domain(mut self, domain: impl Into<String>, tenant_id: TenantId) -> Self {
        self.custom_domains
            .insert(normalize_host(&domain.into()), tenant_id);
        self
    }

    pub fn resolve(
        &self,
        host: &str,
        path: &str,
        stored: Option<&TenantId>,
    ) -> Option<TenantResolution> {
        let host = normalize_host(host);

        let resolved = self
            .from_custom_domain(&host)
            .or_else(|| self.from_subdomain(&host))
            .or_else(|| from_path(path))
            .or_else(|| {
                stored.map(|id| TenantResolution {
                    tenant_id: id.clone(),
                    source: TenantSource::Stored,
                })
            });

        match &resolved {
            Some(r) => tracing::debug!(tenant_id = %r.tenant_id, source = ?r.source, "tenant resolved"),
            None => tracing::debug!(%host, path, "no tenant could be resolved"),
        }

        resolved
    }

    fn from_custom_domain(&self, host: &str) -> Option<TenantResolution> {
        self.custom_domains.get(host).map(|id| TenantResolution {
            tenant_id: id.clone(),
            source: TenantSource::CustomDomain,
        })
    }

    fn from_subdomain(&self, host: &str) -> Option<TenantResolution> {
        let base = self.base_domain.as_deref()?;
        let label = host.strip_suffix(base)?.strip_suffix('.')?;

        // Only a single label directly under the platform domain counts.
        if label.is_empty() || label.contains('.') || RESERVED_SUBDOMAINS.contains(&label) {
            return None;
        }

        Some(TenantResolution {
            tenant_id: TenantId::new(label),
            source: TenantSource::Subdomain,
        })
    }
}

fn from_path(path: &str) -> Option<TenantResolution> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    if segments.next()? != PATH_PREFIX {
        return None;
    }
    let slug = segments.next()?;
    TenantId::parse(slug).ok().map(|tenant_id| TenantResolution {
        tenant_id,
        source: TenantSource::PathPrefix,
    })
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('.');
    let host = host.split(':').next().unwrap_or(host);
    host.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> TenantResolver {
        TenantResolver::new()
            .with_base_domain("skillhub.io")
            .with_custom_domain("learn.acme.com", TenantId::new("acme"))
    }

    #[test]
    fn custom_domain_wins_over_everything() {
        let stored = TenantId::new("other");
        let r = resolver()
            .resolve("LEARN.acme.com:443", "/tenant/globex", Some(&stored))
            .unwrap();
        assert_eq!(r.tenant_id.as_str(), "acme");
        assert_eq!(r.source, TenantSource::CustomDomain);
    }

    #[test]
    fn subdomain_of_platform_domain() {
        let r = resolver().resolve("globex.skillhub.io", "/", None).unwrap();
        assert_eq!(r.tenant_id.as_str(), "globex");
        assert_eq!(r.source, TenantSource::Subdomain);
    }

    #[test]
    fn reserved_and_nested_subdomains_are_ignored() {
        assert!(resolver().resolve("www.skillhub.io", "/", None).is_none());
        assert!(resolver().resolve("a.b.skillhub.io", "/", None).is_none());
        assert!(resolver().resolve("skillhub.io", "/", None).is_none());
    }

    #[test]
    fn path_prefix_then_stored_fallback() {
        let r = resolver()
            .resolve("localhost:5173", "/tenant/initech/dashboard", None)
            .unwrap();
        assert_eq!(r.tenant_id.as_str(), "initech");
        assert_eq!(r.source, TenantSource::PathPrefix);

        let stored = TenantId::new("dev-tenant");
        let r = resolver()
            .resolve("localhost:5173", "/dashboard", Some(&stored))
            .unwrap();
        assert_eq!(r.tenant_id, stored);
        assert_eq!(r.source, TenantSource::Stored);
    }

    #[test]
    fn path_prefix_without_slug_falls_through() {
        assert!(resolver().resolve("localhost", "/tenant/", None).is_none());
    }
}
