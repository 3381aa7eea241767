//! Dataset files: loading and saving an [`EntityGraph`] as YAML

pub mod diagnostics;

use miette::Diagnostic;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::graph::{EntityGraph, GraphError};

pub use diagnostics::DatasetSyntaxError;

/// Errors raised while reading or writing a dataset
#[derive(Debug, Error, Diagnostic)]
pub enum DatasetError {
    #[error("failed to read dataset {path}")]
    #[diagnostic(code(lcag::dataset::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] DatasetSyntaxError),

    #[error("dataset {path} is inconsistent: {source}")]
    #[diagnostic(
        code(lcag::dataset::invalid),
        help("every pathway edge must connect vertices or outputs of the same pathway")
    )]
    Invalid {
        path: PathBuf,
        #[source]
        source: GraphError,
    },

    #[error("failed to serialize dataset: {0}")]
    #[diagnostic(code(lcag::dataset::serialize))]
    Serialize(#[source] serde_yml::Error),
}

/// Parse a dataset from YAML text; `filename` labels diagnostics
pub fn parse_dataset(source: &str, filename: &str) -> Result<EntityGraph, DatasetError> {
    if source.trim().is_empty() {
        return Ok(EntityGraph::new());
    }
    let graph: EntityGraph = serde_yml::from_str(source)
        .map_err(|e| DatasetSyntaxError::from_serde_error(&e, source, filename))?;
    graph.check_pathways().map_err(|source| DatasetError::Invalid {
        path: PathBuf::from(filename),
        source,
    })?;
    Ok(graph)
}

/// Read and validate a dataset file
pub fn load_dataset(path: &Path) -> Result<EntityGraph, DatasetError> {
    let source = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = parse_dataset(&source, &path.display().to_string())?;
    tracing::debug!(
        path = %path.display(),
        pathways = graph.pathways.len(),
        processes = graph.processes.len(),
        mixes = graph.mixes.len(),
        parameters = graph.parameters.len(),
        "dataset loaded"
    );
    Ok(graph)
}

/// Render a dataset as YAML
pub fn to_yaml(graph: &EntityGraph) -> Result<String, DatasetError> {
    serde_yml::to_string(graph).map_err(DatasetError::Serialize)
}

/// Write a dataset file
pub fn save_dataset(graph: &EntityGraph, path: &Path) -> Result<(), DatasetError> {
    let yaml = to_yaml(graph)?;
    fs::write(path, yaml).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}
