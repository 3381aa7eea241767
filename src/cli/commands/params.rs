//! `lcag params` command - list the parameters an entity owns

use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::args::KindArg;
use crate::cli::helpers::{effective_format, escape_csv, load_config, load_graph, lookup};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::Parameter;
use crate::resolver::ParameterReferenceIndex;

#[derive(clap::Args, Debug)]
pub struct ParamsArgs {
    /// Kind of the owning entity
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Integer id of the owning entity
    pub id: i32,

    /// Only list parameters carrying a formula
    #[arg(long)]
    pub formulas: bool,
}

#[derive(Serialize)]
struct ParamRecord<'a> {
    id: &'a str,
    name: &'a str,
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    formula: Option<&'a str>,
}

impl<'a> From<&'a Parameter> for ParamRecord<'a> {
    fn from(p: &'a Parameter) -> Self {
        Self {
            id: p.id.as_str(),
            name: &p.name,
            value: display_value(p),
            formula: p.formula.as_deref(),
        }
    }
}

fn display_value(p: &Parameter) -> String {
    use crate::entities::ParameterValue;
    match &p.value {
        ParameterValue::Scalar(q) => q.to_string(),
        ParameterValue::Series(series) => series
            .iter()
            .map(|(year, q)| format!("{}: {}", year, q))
            .collect::<Vec<_>>()
            .join("; "),
    }
}

pub fn run(args: ParamsArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let graph = load_graph(global)?;
    let owner = lookup(&graph, args.kind.into(), args.id)?;

    let index = ParameterReferenceIndex::for_ref(&graph, owner, config.max_depth())
        .ok_or_else(|| miette::miette!("{} not found in dataset", owner))?;
    if index.truncated() {
        eprintln!(
            "{} parameter search stopped at depth {}; the list may be incomplete",
            style("warning:").yellow().bold(),
            config.max_depth()
        );
    }

    let params: Vec<&Parameter> = if args.formulas {
        index.formulas().collect()
    } else {
        index.params().collect()
    };
    let records: Vec<ParamRecord<'_>> = params.iter().map(|p| ParamRecord::from(*p)).collect();

    match effective_format(global, &config, OutputFormat::Tsv) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&records).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&records).unwrap_or_default());
        }
        OutputFormat::Id => {
            for r in &records {
                println!("{}", r.id);
            }
        }
        OutputFormat::Csv => {
            println!("id,name,value,formula");
            for r in &records {
                println!(
                    "{},{},{},{}",
                    escape_csv(r.id),
                    escape_csv(r.name),
                    escape_csv(&r.value),
                    escape_csv(r.formula.unwrap_or_default())
                );
            }
        }
        OutputFormat::Md => {
            let mut builder = tabled::builder::Builder::default();
            builder.push_record(["Id", "Name", "Value", "Formula"]);
            for r in &records {
                builder.push_record([r.id, r.name, r.value.as_str(), r.formula.unwrap_or_default()]);
            }
            println!("{}", builder.build().with(tabled::settings::Style::markdown()));
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            println!(
                "{:<10} {:<24} {:<20} {}",
                style("ID").bold(),
                style("NAME").bold(),
                style("VALUE").bold(),
                style("FORMULA").bold()
            );
            println!("{}", "-".repeat(70));
            for r in &records {
                println!(
                    "{:<10} {:<24} {:<20} {}",
                    style(r.id).cyan(),
                    r.name,
                    r.value,
                    r.formula.unwrap_or_default()
                );
            }
            if !global.quiet {
                println!();
                println!("{} parameter(s) owned by {}.", style(records.len()).cyan(), owner);
            }
        }
    }
    Ok(())
}
