//! `lcag usage` command - list used, unused or discarded entities of a kind

use miette::Result;

use crate::cli::args::KindArg;
use crate::cli::helpers::{effective_format, load_config, load_graph};
use crate::cli::table::{TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{EntityKind, EntityRef};
use crate::resolver::{DependencyResolver, ResolveOptions};

#[derive(clap::Args, Debug)]
pub struct UsageArgs {
    /// Kind of entity to report on
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Only list entities nothing depends on
    #[arg(long, conflicts_with = "discarded")]
    pub unused: bool,

    /// Only list discarded entities
    #[arg(long)]
    pub discarded: bool,
}

pub fn run(args: UsageArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let graph = load_graph(global)?;
    let resolver = DependencyResolver::new(&graph, ResolveOptions::from_config(&config));
    let kind: EntityKind = args.kind.into();

    let tagged: Vec<(EntityRef, &str)> = if args.unused {
        resolver.unused_ids(kind).into_iter().map(|id| (id, "unused")).collect()
    } else if args.discarded {
        resolver.discarded_ids(kind).into_iter().map(|id| (id, "discarded")).collect()
    } else {
        let report = resolver.usage(kind);
        let mut all: Vec<(EntityRef, &str)> = report
            .used
            .into_iter()
            .map(|id| (id, "used"))
            .chain(report.unused.into_iter().map(|id| (id, "unused")))
            .chain(report.discarded.into_iter().map(|id| (id, "discarded")))
            .collect();
        all.sort();
        all
    };

    let rows: Vec<TableRow> = tagged
        .into_iter()
        .map(|(id, status)| {
            TableRow::new(id)
                .cell(graph.name_of(id).unwrap_or_default())
                .cell(status)
        })
        .collect();
    TableFormatter::new(&["Name", "Status"], kind.as_str())
        .quiet(global.quiet)
        .output(&rows, effective_format(global, &config, OutputFormat::Tsv));
    Ok(())
}
