//! Clap derive structures for the `healthdash` CLI.
//!
//! Every subcommand, its arguments, and the flags shared by all of them.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Entry point ──────────────────────────────────────────────────────

/// healthdash -- service health dashboard for the terminal
#[derive(Debug, Parser)]
#[command(
    name = "healthdash",
    version,
    about = "Monitor service health from the command line",
    long_about = "Polls a health-check API and shows per-service status grouped by\n\
        category, with environment switching and continuous watch mode.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Shared flags ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config profile to use
    #[arg(long, short = 'p', env = "HEALTHDASH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Health API root URL (overrides profile)
    #[arg(long, short = 'u', env = "HEALTHDASH_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "HEALTHDASH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Colorize status glyphs and labels
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print nothing but errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip TLS certificate verification
    #[arg(long, short = 'k', env = "HEALTHDASH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "HEALTHDASH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Rendering choices ────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Grouped tables with a summary header
    Table,
    /// Pretty-printed JSON
    Json,
    /// JSON on a single line
    JsonCompact,
    /// YAML
    Yaml,
    /// Tab-separated lines for scripts
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Only when stdout is a terminal
    Auto,
    /// Even when piped
    Always,
    /// Plain text only
    Never,
}

// ── Subcommands ──────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll once and print service status
    #[command(alias = "st", alias = "s")]
    Status(StatusArgs),

    /// Keep polling and print every new snapshot
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Show or switch the monitored environment
    #[command(alias = "environment")]
    Env(EnvArgs),

    /// Manage CLI configuration, profiles, and the server's service list
    Config(ConfigArgs),

    /// Print a shell completion script
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STATUS / WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Filters shared by `status` and `watch`.
#[derive(Debug, Clone, Default, Args)]
pub struct ViewFilter {
    /// Only show this category (case-insensitive)
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Only show services that are not healthy
    #[arg(long)]
    pub problems: bool,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub filter: ViewFilter,

    /// Exit non-zero when any service is unhealthy or erroring
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub filter: ViewFilter,

    /// Stop after this many snapshots
    #[arg(long, short = 'n')]
    pub count: Option<u32>,

    /// Do not clear the screen between snapshots
    #[arg(long)]
    pub no_clear: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ENVIRONMENT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EnvArgs {
    #[command(subcommand)]
    pub command: EnvCommand,
}

#[derive(Debug, Subcommand)]
pub enum EnvCommand {
    /// Show the current environment
    Get,

    /// List environments the server accepts
    #[command(alias = "ls")]
    List,

    /// Switch the server to another environment
    Set {
        /// Target environment (e.g. homolog, prod)
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create (or extend) the config file with a profile
    Init {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Overwrite an existing profile with the same name
        #[arg(long)]
        force: bool,
    },

    /// Print the active profile as TOML
    Show,

    /// Print the config file path
    Path,

    /// Name every profile in the config file
    Profiles,

    /// Make a profile the default
    Use {
        /// Existing profile name
        name: String,
    },

    /// Show the server's dashboard configuration
    Remote,

    /// Replace the server's service list from a JSON file
    Push {
        /// JSON file with `refreshInterval`, `timeout`, and `services`
        file: PathBuf,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
