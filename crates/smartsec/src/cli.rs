//! Clap derive structures for the `smartsec` CLI.
//!
//! Defines the command tree, global flags, and shared types. Kept free of
//! workspace crates so `build.rs` can include it for man page generation.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// smartsec -- watch and control a smart security panel
#[derive(Debug, Parser)]
#[command(
    name = "smartsec",
    version,
    about = "Watch and control a smart security panel from the command line",
    long_about = "Keeps a cached view of a hosted security panel in sync with the device.\n\n\
        Status is polled whenever the cached snapshot expires; arm and disarm\n\
        requests are forwarded to the panel unless it reports a triggered\n\
        alarm with an active fault.",
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

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Account profile to use
    #[arg(long, short = 'p', env = "SMARTSEC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Portal domain or URL (overrides profile)
    #[arg(long, short = 'd', env = "SMARTSEC_DOMAIN", global = true)]
    pub domain: Option<String>,

    /// Account username (overrides profile)
    #[arg(long, short = 'u', env = "SMARTSEC_USERNAME", global = true)]
    pub username: Option<String>,

    /// Account password
    #[arg(long, env = "SMARTSEC_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Seconds a fetched status stays cached
    #[arg(long, env = "SMARTSEC_CACHE_TTL", global = true)]
    pub cache_ttl: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SMARTSEC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SMARTSEC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "SMARTSEC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the panel's current status
    #[command(alias = "st")]
    Status,

    /// Stream status updates as the cache refreshes
    Watch(WatchArgs),

    /// Arm the panel
    Arm(ArmArgs),

    /// Disarm the panel
    Disarm(DisarmArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many updates (default: run until interrupted)
    #[arg(long, short = 'n')]
    pub count: Option<usize>,

    /// Print raw characteristic updates instead of snapshots
    #[arg(long)]
    pub characteristics: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ARM / DISARM
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ArmMode {
    /// Everyone is away
    Away,
    /// Someone is home
    #[value(alias = "home")]
    Stay,
}

#[derive(Debug, Args)]
pub struct ArmArgs {
    /// Arming mode
    #[arg(default_value = "away")]
    pub mode: ArmMode,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(Debug, Args)]
pub struct DisarmArgs {
    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(Debug, Args)]
pub struct WaitArgs {
    /// Wait until the panel reports the new state (e.g. "30s", "2m")
    #[arg(long, short = 'w', value_parser = humantime::parse_duration)]
    pub wait: Option<Duration>,
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
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
