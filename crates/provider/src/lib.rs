//! `skillhub-provider`
//!
//! **Responsibility:** the client-side owner of session state and the
//! provider-layer composition around application content.
//!
//! This crate provides:
//! - `GlobalState` and the pure `reduce` transition function
//! - `WorkflowProvider`, which runs workflows and folds their results into state
//! - `ProviderComposer`, conditional nesting of provider layers
//! - the global and tenant-scoped provider stacks

pub mod compose;
pub mod layers;
pub mod provider;
pub mod reducer;
pub mod state;

pub use compose::{Condition, ProviderComposer, ProviderDescriptor, ProviderNode};
pub use layers::{ProviderKind, TenantScopedProviders, global_providers};
pub use provider::{ProviderError, WorkflowProvider};
pub use reducer::{Action, reduce};
pub use state::{AuthState, GlobalState, NotificationLevel, TenantState, Theme, UiNotification, UiState};
