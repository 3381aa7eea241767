//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{EntityKind, EntityRef};
use crate::core::Config;
use crate::graph::EntityGraph;

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Load configuration for the dataset named on the command line
pub fn load_config(global: &GlobalOpts) -> Result<Config> {
    let dir = global.dataset.parent().filter(|p| !p.as_os_str().is_empty());
    Config::load(dir.or(Some(Path::new(".")))).into_diagnostic()
}

/// Load the dataset named on the command line
pub fn load_graph(global: &GlobalOpts) -> Result<EntityGraph> {
    Ok(crate::yaml::load_dataset(&global.dataset)?)
}

/// Resolve `--format auto` against the configured default, then `fallback`
pub fn effective_format(global: &GlobalOpts, config: &Config, fallback: OutputFormat) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    config
        .default_format
        .as_deref()
        .and_then(|f| <OutputFormat as clap::ValueEnum>::from_str(f, true).ok())
        .filter(|f| *f != OutputFormat::Auto)
        .unwrap_or(fallback)
}

/// Build a reference from a kind and id, checking it exists
pub fn lookup(graph: &EntityGraph, kind: EntityKind, id: i32) -> Result<EntityRef> {
    let entity = EntityRef::new(kind, id);
    if !graph.contains(entity) {
        return Err(miette::miette!(
            code = "lcag::cli::not_found",
            help = format!("run `lcag usage {}` to list known ids", kind),
            "{} not found in dataset",
            entity
        ));
    }
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("émissions totales", 8), "émiss...");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }
}
