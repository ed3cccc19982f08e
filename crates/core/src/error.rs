use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while loading inputs, aggregating orders or emitting the report.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file '{}' could not be opened: {source}", .path.display())]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("input file '{}' is too small ({size} bytes) to contain the header '{header}'", .path.display())]
    InputTooSmall {
        path: PathBuf,
        size: u64,
        header: String,
    },
    #[error("{file} contains no usable rows: {reason}")]
    EmptyInput { file: String, reason: &'static str },
    #[error("{file} header is missing required column '{column}'")]
    MissingColumn { file: String, column: String },
    #[error("{file} line {line} has no value for column '{column}'")]
    MissingField {
        file: String,
        line: u64,
        column: String,
    },
    #[error("orders line {line}: reordered flag must be an unsigned integer (got {value:?})")]
    InvalidReorderFlag { line: u64, value: String },
    #[error("department id {department:?} is not an integer")]
    NonNumericDepartment { department: String },
    #[error("failed to parse {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },
    #[error("failed to write report: {0}")]
    Write(#[from] io::Error),
}

impl PipelineError {
    pub(crate) fn csv(file: &str, source: csv::Error) -> Self {
        Self::Csv {
            file: file.to_string(),
            source,
        }
    }
}
