//! Well-known session keys.

/// Bearer token of the signed-in user.
pub const AUTH_TOKEN: &str = "auth_token";

/// Serialized `AuthUser`.
pub const USER_DATA: &str = "user_data";

/// Id of the tenant the session currently points at.
pub const CURRENT_TENANT_ID: &str = "current_tenant_id";

/// Serialized `TenantConfig` of the current tenant.
pub const TENANT_CONFIG: &str = "tenant_config";

/// Chat history of the assistant UI. Owned by the UI, never touched by the
/// workflow layer beyond a full session clear.
pub const AI_CHATBOT_CONVERSATIONS: &str = "aiChatbotConversations";

/// Content niche picked during onboarding. UI-owned, like the above.
pub const USER_NICHE: &str = "userNiche";

/// Keys dropped on logout. The tenant pointer survives so the next login
/// lands on the same tenant.
pub const AUTH_KEYS: &[&str] = &[AUTH_TOKEN, USER_DATA, TENANT_CONFIG];
