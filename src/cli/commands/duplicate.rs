//! `lcag duplicate` command - copy a pathway, process or mix

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::args::KindArg;
use crate::cli::helpers::{load_config, load_graph, lookup};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::SequentialIds;
use crate::duplicate::duplicate;
use crate::yaml::save_dataset;

#[derive(clap::Args, Debug)]
pub struct DuplicateArgs {
    /// Kind of the entity to copy (pathway, process or mix)
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Integer id of the entity to copy
    pub id: i32,

    /// Suffix appended to the copy's name (default from config)
    #[arg(long)]
    pub suffix: Option<String>,

    /// Write the updated dataset here instead of overwriting the input
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: DuplicateArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let mut graph = load_graph(global)?;
    let source = lookup(&graph, args.kind.into(), args.id)?;

    let suffix = args
        .suffix
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(config.copy_suffix());
    let mut ids = SequentialIds::from_graph(&graph);
    let copy = duplicate(&mut graph, &mut ids, source, suffix).map_err(|e| {
        miette::miette!(code = "lcag::duplicate", "{}", e)
    })?;
    if let Some(meta) = graph.metadata_mut(copy) {
        meta.touch(config.author());
    }

    let target = args.output.unwrap_or_else(|| global.dataset.clone());
    save_dataset(&graph, &target)?;

    match global.format {
        OutputFormat::Id => println!("{}", copy),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "source": source, "copy": copy, "dataset": target.display().to_string() })
        ),
        _ if global.quiet => {}
        _ => {
            let name = graph.name_of(copy).unwrap_or_default();
            println!(
                "{} {} as {} {}",
                style("Duplicated").green().bold(),
                source,
                style(copy).cyan(),
                style(format!("\"{}\"", name)).dim()
            );
            println!("{} {}", style("Saved").dim(), target.display());
        }
    }
    Ok(())
}
