use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::net::Ipv4Addr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "zbxsync")]
#[command(author = "zbxsync contributors")]
#[command(version)]
#[command(about = "Idempotent provisioning of Zabbix monitoring", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub server: ServerArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection settings, each overriding the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct ServerArgs {
    /// Config file (default: ~/.config/zbxsync/config.toml)
    #[arg(short, long, env = "ZBXSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Zabbix frontend URL
    #[arg(long, env = "ZABBIX_URL", global = true)]
    pub url: Option<String>,

    /// API user
    #[arg(long, env = "ZABBIX_USER", global = true)]
    pub username: Option<String>,

    /// API password
    #[arg(long, env = "ZABBIX_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Send the session token as an Authorization header
    #[arg(long, global = true)]
    pub bearer: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create or update groups, hosts, checks and dashboards
    Apply(ApplyArgs),

    /// List hosts with their agent status and addresses
    Agents,

    /// Rewrite agent interface addresses to match the config
    Addresses {
        /// Show what would change without changing it
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Check that the API endpoint answers
    Probe,

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Apply
// ============================================================================

#[derive(Args, Debug, Default)]
pub struct ApplyArgs {
    /// Address of the public web endpoint (checked as http://<ip>/)
    #[arg(long, conflicts_with = "target_url")]
    pub target_ip: Option<Ipv4Addr>,

    /// Full URL of the public web endpoint
    #[arg(long)]
    pub target_url: Option<String>,

    /// What to do with dashboards that already exist
    #[arg(long, value_enum)]
    pub on_conflict: Option<OnConflict>,

    /// Look everything up but change nothing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnConflict {
    Skip,
    Replace,
}

impl From<OnConflict> for reconcile::ConflictPolicy {
    fn from(value: OnConflict) -> Self {
        match value {
            OnConflict::Skip => Self::Skip,
            OnConflict::Replace => Self::Replace,
        }
    }
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write a sample configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
