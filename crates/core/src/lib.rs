//! `skillhub-core`: shared vocabulary of the client workflow layer.
//!
//! This crate contains **pure** types (no IO): identifiers, the domain error
//! model, tenant configuration records and tenant identification.

pub mod error;
pub mod id;
pub mod resolve;
pub mod tenant;

pub use error::{DomainError, DomainResult};
pub use id::{TenantId, UserId};
pub use resolve::{TenantResolution, TenantResolver, TenantSource};
pub use tenant::{
    SecurityPolicy, TenantBranding, TenantConfig, TenantFeatures, TenantLimits, TenantStatus,
};
