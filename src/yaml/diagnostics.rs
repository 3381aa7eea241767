//! Dataset parse errors rendered as source-annotated diagnostics

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Dataset YAML that failed to parse or did not match the entity schema
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(lcag::dataset::parse))]
pub struct DatasetSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl DatasetSyntaxError {
    /// Wrap a serde_yml error, pointing at its location in `source`
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));
        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help: generate_help(&message),
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn offset(&self) -> usize {
        self.span.offset()
    }
}

/// Byte offset of a 1-based line / column position
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut line_start = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            let within = text
                .char_indices()
                .nth(column.saturating_sub(1))
                .map_or(text.len(), |(i, _)| i);
            return line_start + within;
        }
        line_start += text.len();
    }
    source.len().saturating_sub(1)
}

/// Suggest a fix for the errors users most often hit when hand-editing datasets
fn generate_help(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("duplicate id") {
        return Some("Ids must be unique within each collection (pathways, mixes, ...).".to_string());
    }
    if msg.contains("unknown variant") {
        return Some(
            "Check the `type:` tag. Sources are well, previous, pathway or mix.".to_string(),
        );
    }
    if msg.contains("missing field `id`") {
        return Some("Every entity and parameter needs an `id`.".to_string());
    }
    if msg.contains("invalid length") || msg.contains("ulid") {
        return Some("Guids are 26-character ULIDs, e.g. 01ARZ3NDEKTSV4RRFFQ69G5FAV.".to_string());
    }
    if msg.contains("tab") {
        return Some("YAML requires spaces for indentation, not tabs.".to_string());
    }
    if msg.contains("mapping values are not allowed") {
        return Some("You may be missing a space after ':' or have incorrect indentation.".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_to_offset() {
        let source = "line1\nline2\nline3";
        assert_eq!(line_col_to_offset(source, 1, 1), 0);
        assert_eq!(line_col_to_offset(source, 2, 1), 6);
        assert_eq!(line_col_to_offset(source, 3, 3), 14);
    }

    #[test]
    fn test_help_generation() {
        assert!(generate_help("duplicate id 3 at line 4").is_some());
        assert!(generate_help("unknown variant `wel`").is_some());
        assert!(generate_help("found tab character").is_some());
        assert!(generate_help("some random error").is_none());
    }

    #[test]
    fn test_points_at_bad_line() {
        let source = "resources:\n  - id: one\n    name: Diesel\n";
        let err = serde_yml::from_str::<crate::graph::EntityGraph>(source).unwrap_err();
        let diag = DatasetSyntaxError::from_serde_error(&err, source, "dataset.yaml");
        assert!(diag.offset() < source.len());
        assert!(!diag.message().is_empty());
    }
}
