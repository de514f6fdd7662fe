use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use cxi_store::RecordSet;

#[derive(Parser)]
#[command(
    name = "cxi",
    about = "Ingest object graph exports into a queryable property store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode an export into a property store and keep it on disk
    Import(ImportArgs),
    /// List the spaces of a store with their page counts
    Spaces(SpacesArgs),
    /// Print records of a store
    Show(ShowArgs),
    /// List the ids of a record family
    Ids(IdsArgs),
    /// Evaluate an id range list against a sequence of ids
    Ranges(RangesArgs),
}

#[derive(Args)]
pub struct ImportArgs {
    /// Export directory or zip archive
    pub export: PathBuf,
    /// TOML import configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Id range list gating pages and blog posts, e.g. "[2,9],[10,7]"
    #[arg(long)]
    pub id_ranges: Option<String>,
    /// Parent directory for the working directory
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
    /// Space key to flag as excluded (repeatable)
    #[arg(long = "exclude", value_name = "KEY")]
    pub exclude: Vec<String>,
}

#[derive(Args)]
pub struct SpacesArgs {
    /// Store directory printed by `cxi import`
    pub store: PathBuf,
}

#[derive(Args)]
pub struct ShowArgs {
    pub store: PathBuf,
    pub kind: RecordKind,
    #[arg(required = true)]
    pub ids: Vec<String>,
    /// Owning space, page or permission set for nested kinds
    #[arg(long)]
    pub parent: Option<i64>,
}

#[derive(Args)]
pub struct IdsArgs {
    pub store: PathBuf,
    pub kind: RecordKind,
    #[arg(long)]
    pub parent: Option<i64>,
}

#[derive(Args)]
pub struct RangesArgs {
    /// Id range list, e.g. "[2,9],(10,]"
    pub expr: String,
    /// Ids in arrival order
    pub ids: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum RecordKind {
    Pages,
    Spaces,
    SpacePermissions,
    Attachments,
    Objects,
    InternalUsers,
    UserImpls,
    Groups,
    ContentPermissionSets,
    ContentPermissions,
}

impl RecordKind {
    /// The record family, resolving nested kinds against `parent`.
    pub fn record_set(self, parent: Option<i64>) -> anyhow::Result<RecordSet> {
        let need_parent = |what: &str| {
            parent.ok_or_else(|| anyhow::anyhow!("--parent <{what} id> is required for this kind"))
        };
        Ok(match self {
            Self::Pages => RecordSet::Pages,
            Self::Spaces => RecordSet::Spaces,
            Self::SpacePermissions => RecordSet::SpacePermissions { space: need_parent("space")? },
            Self::Attachments => RecordSet::Attachments { page: need_parent("page")? },
            Self::Objects => RecordSet::Objects,
            Self::InternalUsers => RecordSet::InternalUsers,
            Self::UserImpls => RecordSet::UserImpls,
            Self::Groups => RecordSet::Groups,
            Self::ContentPermissionSets => RecordSet::ContentPermissionSets,
            Self::ContentPermissions => RecordSet::ContentPermissions { set: need_parent("set")? },
        })
    }
}
