//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, duplicate::DuplicateArgs, params::ParamsArgs,
    usage::UsageArgs, where_used::WhereUsedArgs,
};

#[derive(Parser)]
#[command(name = "lcag")]
#[command(author, version, about = "Lifecycle emissions graph toolkit")]
#[command(long_about = "Query and edit lifecycle-analysis datasets: find where entities are used, list unused ones, inspect parameters and duplicate pathways, processes and mixes.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Dataset file
    #[arg(long, short = 'd', global = true, env = "LCAG_DATASET", default_value = "lcag.yaml")]
    pub dataset: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find the entities that depend on an entity
    WhereUsed(WhereUsedArgs),

    /// List used, unused or discarded entities of a kind
    Usage(UsageArgs),

    /// List the parameters an entity owns
    Params(ParamsArgs),

    /// Duplicate a pathway, process or mix
    Duplicate(DuplicateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (table for terminals)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Aligned columns (for terminals and piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just entity references, one per line
    Id,
}

/// Entity kind argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    Pathway,
    Process,
    Mix,
    Resource,
    Technology,
    Mode,
    Vehicle,
}

impl From<KindArg> for crate::core::identity::EntityKind {
    fn from(kind: KindArg) -> Self {
        use crate::core::identity::EntityKind;
        match kind {
            KindArg::Pathway => EntityKind::Pathway,
            KindArg::Process => EntityKind::Process,
            KindArg::Mix => EntityKind::Mix,
            KindArg::Resource => EntityKind::Resource,
            KindArg::Technology => EntityKind::Technology,
            KindArg::Mode => EntityKind::Mode,
            KindArg::Vehicle => EntityKind::Vehicle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_where_used() {
        let cli = Cli::try_parse_from([
            "lcag", "--dataset", "d.yaml", "where-used", "pathway", "7", "--first",
        ])
        .unwrap();
        assert_eq!(cli.global.dataset, PathBuf::from("d.yaml"));
        assert!(matches!(cli.command, Commands::WhereUsed(ref a) if a.first && a.id == 7));
    }
}
