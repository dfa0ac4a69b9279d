//! Clap derive structures for the `fleetdash` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fleetdash -- fleet dashboard layout and telemetry from the command line
#[derive(Debug, Parser)]
#[command(
    name = "fleetdash",
    version,
    about = "Edit your fleet dashboard layout and query cached telemetry",
    long_about = "Manage the widget layout stored on your tracking-server profile\n\
        and read the fleet summary, recent events and daily distance reports\n\
        the dashboard widgets display.",
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
    /// Tracking server URL (overrides config file)
    #[arg(long, short = 'u', env = "FLEETDASH_URL", global = true)]
    pub url: Option<String>,

    /// API token (overrides config file)
    #[arg(long, env = "FLEETDASH_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FLEETDASH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "FLEETDASH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides config file)
    #[arg(long, env = "FLEETDASH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// View and edit the dashboard widget layout
    #[command(alias = "l")]
    Layout(LayoutArgs),

    /// Per-device totals over the last 7 days
    #[command(alias = "sum")]
    Summary(SummaryArgs),

    /// Events from the last 24 hours
    #[command(alias = "ev")]
    Events(EventsArgs),

    /// Per-day distance for the most relevant devices
    Daily(DailyArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Layout
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LayoutArgs {
    #[command(subcommand)]
    pub command: LayoutCommand,
}

#[derive(Debug, Subcommand)]
pub enum LayoutCommand {
    /// List widgets in the stored layout
    #[command(alias = "ls")]
    Show,

    /// Add a widget below the existing ones
    Add {
        /// Widget type (see `layout kinds`)
        kind: String,

        /// Widget title (defaults to "Widget <type>")
        #[arg(long, short = 't')]
        title: Option<String>,
    },

    /// Remove a widget
    #[command(alias = "rm")]
    Remove {
        /// Widget ID
        id: String,
    },

    /// Move a widget (requires edit mode)
    Move {
        /// Widget ID
        id: String,
        x: u32,
        y: u32,
    },

    /// Resize a widget (requires edit mode)
    Resize {
        /// Widget ID
        id: String,
        width: u32,
        height: u32,
    },

    /// Change a widget's title
    Rename {
        /// Widget ID
        id: String,
        title: String,
    },

    /// Turn layout edit mode on or off
    EditMode {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Restore the six default widgets
    Reset,

    /// List registered widget types and their default sizes
    Kinds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Self::On
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Reports
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Bypass the cache freshness check
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct EventsArgs {
    /// Only events of this type (e.g. deviceOverspeed)
    #[arg(long = "type", short = 't')]
    pub event_type: Option<String>,

    /// Bypass the cache freshness check
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct DailyArgs {
    /// Days to look back (defaults to dashboard.daily_days)
    #[arg(long, short = 'd')]
    pub days: Option<u32>,

    /// Cap on devices included (defaults to dashboard.max_devices)
    #[arg(long, short = 'm')]
    pub max_devices: Option<usize>,

    /// Bypass the cache freshness check
    #[arg(long, short = 'f')]
    pub force: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Config / Completions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file from the given flags
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
