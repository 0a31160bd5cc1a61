use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use skubridge_core::models::{SyncDirection, SyncMode, SyncStatus};

#[derive(Parser)]
#[command(name = "skubridge")]
#[command(about = "Reconcile and sync product records between an ERP and a storefront")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local queue database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name for gateway configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match ERP records against storefront records and show the plan
    Preview(PreviewArgs),
    /// Inspect and edit the sync queue
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
    /// Fill the sync queue from a saved search pattern
    Populate {
        /// Pattern identifier known to the gateway
        pattern: String,
        /// Empty the queue before adding the pattern's records
        #[arg(long)]
        clear: bool,
        /// Direction for newly queued items (profile default when omitted)
        #[arg(long, value_enum)]
        direction: Option<DirectionArg>,
        /// Mode for newly queued items (profile default when omitted)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
    /// Sync queued items, one remote call per direction
    Bulk(BulkArgs),
    /// Stage edits to one record and sync it immediately
    Push(PushArgs),
    /// Show recent remote sync calls
    Logs {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configure CLI gateway profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct PreviewArgs {
    /// ERP records as a JSON array (fetched from the gateway when omitted)
    #[arg(long, value_name = "PATH", requires = "target_file")]
    pub source_file: Option<PathBuf>,
    /// Storefront records as a JSON array
    #[arg(long, value_name = "PATH", requires = "source_file")]
    pub target_file: Option<PathBuf>,
    /// Search text forwarded to the gateway
    #[arg(short, long)]
    pub query: Option<String>,
    /// Maximum records fetched per platform
    #[arg(long)]
    pub limit: Option<usize>,
    /// Sync direction (profile default when omitted)
    #[arg(long, value_enum)]
    pub direction: Option<DirectionArg>,
    /// Authoritative record ids to leave out of the plan
    #[arg(long, value_name = "ID", num_args = 1..)]
    pub exclude: Vec<String>,
    #[command(flatten)]
    pub output: ReportArgs,
}

#[derive(Args)]
pub struct BulkArgs {
    /// Queue item IDs or unique ID prefixes
    pub ids: Vec<String>,
    /// Sync every queued item matching the filters
    #[arg(long, conflicts_with = "ids")]
    pub all: bool,
    /// Only items with this direction (with --all)
    #[arg(long, value_enum, requires = "all")]
    pub direction: Option<DirectionArg>,
    /// Only items whose last attempt had this status (with --all)
    #[arg(long, value_enum, requires = "all")]
    pub status: Option<StatusArg>,
    #[command(flatten)]
    pub output: ReportArgs,
}

#[derive(Args)]
pub struct PushArgs {
    /// Id of the authoritative record to push
    pub source_id: String,
    /// Field edits as field=value; unknown fields land in extensions
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub assignments: Vec<String>,
    /// Sync direction (profile default when omitted)
    #[arg(long, value_enum)]
    pub direction: Option<DirectionArg>,
    /// Search text used to fetch records around the pushed one
    #[arg(short, long)]
    pub query: Option<String>,
    /// Show the effective record without sending it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Clone, Default)]
pub struct ReportArgs {
    /// Output as JSON
    #[arg(long, conflicts_with = "markdown")]
    pub json: bool,
    /// Output as Markdown
    #[arg(long)]
    pub markdown: bool,
    /// Optional output path (stdout when omitted)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum QueueCommands {
    /// List queued items in creation order
    List {
        #[arg(long, value_enum)]
        direction: Option<DirectionArg>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        /// Only natural keys starting with this prefix
        #[arg(long, value_name = "PREFIX")]
        prefix: Option<String>,
        /// Number of items to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Queue a record by natural key
    Add {
        /// Natural key (e.g. SKU)
        natural_key: String,
        /// ERP record id
        #[arg(long, value_name = "ID")]
        source_id: Option<String>,
        /// Storefront record id
        #[arg(long, value_name = "ID")]
        target_id: Option<String>,
        #[arg(long, value_enum)]
        direction: Option<DirectionArg>,
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
    /// Remove queued items
    #[command(alias = "rm")]
    Remove {
        /// Queue item IDs or unique ID prefixes
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Remove every queued item
    Clear,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update the profile named by --profile (or the active one)
    Init {
        /// Integration gateway base URL
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
        /// Bearer token for the gateway
        #[arg(long, value_name = "TOKEN")]
        api_token: Option<String>,
        /// Request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Default direction for queued items
        #[arg(long, value_enum)]
        default_direction: Option<DirectionArg>,
        /// Default mode for queued items
        #[arg(long, value_enum)]
        default_mode: Option<ModeArg>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum DirectionArg {
    SourceToTarget,
    TargetToSource,
    Bidirectional,
}

impl From<DirectionArg> for SyncDirection {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::SourceToTarget => Self::SourceToTarget,
            DirectionArg::TargetToSource => Self::TargetToSource,
            DirectionArg::Bidirectional => Self::Bidirectional,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ModeArg {
    Delta,
    Full,
}

impl From<ModeArg> for SyncMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Delta => Self::Delta,
            ModeArg::Full => Self::Full,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Success,
    Failed,
}

impl From<StatusArg> for SyncStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Pending => Self::Pending,
            StatusArg::Success => Self::Success,
            StatusArg::Failed => Self::Failed,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
