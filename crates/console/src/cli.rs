use clap::{Parser, Subcommand, ValueEnum};

use skillhub_provider::Theme;

/// Drive a SkillHub tenant session from the terminal.
///
/// Backend, tenant and session storage come from the `SKILLHUB_*`
/// environment variables.
#[derive(Debug, Parser)]
#[command(name = "skillhub", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Backend reachability and the current session
    Status,

    /// Sign in to the current tenant
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SKILLHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account in the current tenant and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SKILLHUB_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        name: String,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Exchange the stored token for a fresh one
    Refresh,

    /// List tenants visible to the session
    Tenants,

    /// Show the current tenant's configuration
    Current,

    /// Make another tenant current
    Switch { tenant_id: String },

    /// Print the provider layers the current tenant renders inside
    Tree {
        #[arg(long, value_enum, default_value_t = ThemeArg::Light)]
        theme: ThemeArg,
    },

    /// Run any registered workflow with a raw JSON payload
    Run {
        workflow_id: String,
        /// e.g. '{"action":"broadcast","channel":"groups"}'
        data: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}
