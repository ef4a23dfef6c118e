//! Clap derive structures for the `hcbridge` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hcbridge: bridge Home Connect appliances to your terminal
#[derive(Debug, Parser)]
#[command(
    name = "hcbridge",
    version,
    about = "Monitor and control Home Connect appliances from the command line",
    long_about = "Authorizes against the Home Connect cloud, reads appliance state,\n\
        runs programs, and streams live attribute updates.",
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
    #[arg(long, short = 'p', env = "HCBRIDGE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "HCBRIDGE_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides the profile)
    #[arg(long, global = true)]
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
    /// Authorize against the appliance cloud
    Auth(AuthArgs),

    /// List and inspect paired appliances
    #[command(alias = "ha")]
    Appliances(AppliancesArgs),

    /// Show normalized status attributes of an appliance
    Status(HaIdArg),

    /// Show raw settings of an appliance
    Settings(HaIdArg),

    /// Inspect available and active programs
    Programs(ProgramsArgs),

    /// Start a program
    Start(StartArgs),

    /// Stop the active program
    Stop(HaIdArg),

    /// Change an option of the active program
    Option(OptionArgs),

    /// Switch appliance power
    Power(PowerArgs),

    /// Stream live attribute updates until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HaIdArg {
    /// Appliance haId
    pub ha_id: String,
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Run the authorization code flow and store the token
    Login {
        /// Redirect URL (or its query string) received after granting access
        #[arg(long)]
        callback: Option<String>,
    },

    /// Show whether a token is stored and when it expires
    Status,

    /// Delete the stored token
    Logout,
}

// ── Appliances ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AppliancesArgs {
    #[command(subcommand)]
    pub command: AppliancesCommand,
}

#[derive(Debug, Subcommand)]
pub enum AppliancesCommand {
    /// List appliances paired with the account
    #[command(alias = "ls")]
    List {
        /// Include appliances outside the profile's selection
        #[arg(long, short = 'a')]
        all: bool,
    },

    /// Show one appliance
    Show(HaIdArg),
}

// ── Programs ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProgramsArgs {
    #[command(subcommand)]
    pub command: ProgramsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProgramsCommand {
    /// Programs the appliance offers in its current state
    Available(HaIdArg),

    /// The running program and its options
    Active(HaIdArg),

    /// The selected program and its options
    Selected(HaIdArg),

    /// Select a program without starting it
    Select {
        /// Appliance haId
        ha_id: String,
        /// Program key, e.g. Dishwasher.Program.Eco50
        program: String,
    },
}

// ── Control ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StartArgs {
    /// Appliance haId
    pub ha_id: String,

    /// Program key, e.g. Dishwasher.Program.Eco50
    pub program: String,

    /// Program option as key=value (repeatable). Values are parsed as JSON
    /// when possible, otherwise sent as strings.
    #[arg(long = "option", short = 'O', value_name = "KEY=VALUE")]
    pub options: Vec<String>,
}

#[derive(Debug, Args)]
pub struct OptionArgs {
    /// Appliance haId
    pub ha_id: String,

    /// Option key, e.g. BSH.Common.Option.StartInRelative
    pub key: String,

    /// New value (JSON, or a bare string)
    pub value: String,
}

#[derive(Debug, Args)]
pub struct PowerArgs {
    /// Appliance haId
    pub ha_id: String,

    /// Target power state
    pub state: PowerArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PowerArg {
    On,
    Off,
    Standby,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Appliances to watch (default: the profile's selection, or all)
    pub ha_ids: Vec<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive profile setup
    Init,

    /// Print the resolved configuration (secrets redacted)
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}
