//! `lcag where-used` command - find the entities that depend on an entity

use console::style;
use miette::Result;

use crate::cli::args::KindArg;
use crate::cli::helpers::{effective_format, load_config, load_graph, lookup};
use crate::cli::table::{TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::Guid;
use crate::entities::Year;
use crate::resolver::{DependencyResolver, ResolveOptions, ScanMode, ShareFilter};

#[derive(clap::Args, Debug)]
pub struct WhereUsedArgs {
    /// Kind of the entity to search for
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Integer id of the entity
    pub id: i32,

    /// Stop at the first dependent found
    #[arg(long)]
    pub first: bool,

    /// Do not report vehicles
    #[arg(long)]
    pub exclude_vehicles: bool,

    /// Ignore mix feeds whose share is zero in every year
    #[arg(long, conflicts_with = "year")]
    pub nonzero_share: bool,

    /// Ignore mix feeds whose share is zero in this year
    #[arg(long)]
    pub year: Option<Year>,

    /// Only count uses of this output or input guid (pathways and processes)
    #[arg(long)]
    pub endpoint: Option<Guid>,

    /// Report discarded entities too
    #[arg(long)]
    pub include_discarded: bool,
}

impl WhereUsedArgs {
    fn options(&self, base: ResolveOptions) -> ResolveOptions {
        let share_filter = match (self.year, self.nonzero_share) {
            (Some(year), _) => ShareFilter::NonZeroIn(year),
            (None, true) => ShareFilter::NonZeroSomewhere,
            (None, false) => ShareFilter::Any,
        };
        ResolveOptions {
            endpoint: self.endpoint,
            exclude_vehicles: self.exclude_vehicles,
            share_filter,
            include_discarded: self.include_discarded,
            ..base
        }
    }
}

pub fn run(args: WhereUsedArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let graph = load_graph(global)?;
    let target = lookup(&graph, args.kind.into(), args.id)?;

    let resolver = DependencyResolver::new(&graph, args.options(ResolveOptions::from_config(&config)));
    let mut found: Vec<_> = if args.first {
        resolver.dependents(target, ScanMode::FirstHit).take(1).collect()
    } else {
        resolver.dependents(target, ScanMode::All).collect()
    };
    found.sort();

    let format = effective_format(global, &config, OutputFormat::Tsv);
    if !global.quiet && matches!(format, OutputFormat::Tsv) {
        let name = graph.name_of(target).unwrap_or_default();
        println!(
            "{} {} {}\n",
            style("References to").bold(),
            style(target).cyan(),
            style(name).dim()
        );
    }

    if found.is_empty() {
        if !global.quiet && matches!(format, OutputFormat::Tsv) {
            println!("{}", style("No references found.").yellow());
        } else if matches!(format, OutputFormat::Json) {
            println!("[]");
        }
        return Ok(());
    }

    let rows: Vec<TableRow> = found
        .iter()
        .map(|d| {
            TableRow::new(d.entity)
                .cell(graph.name_of(d.entity).unwrap_or_default())
                .cell(d.relation.as_str())
        })
        .collect();
    TableFormatter::new(&["Name", "Relationship"], "reference")
        .quiet(global.quiet)
        .output(&rows, format);
    Ok(())
}
