//! `skillhub-auth`: identity types exchanged with the auth endpoints.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod credentials;
pub mod roles;
pub mod user;

pub use credentials::{LoginCredentials, RegisterData};
pub use roles::Role;
pub use user::{AuthData, AuthUser, TokenPair};
