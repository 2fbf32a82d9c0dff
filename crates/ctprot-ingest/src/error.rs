//! Ingest error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("failed to read directory {path}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML syntax error: {0}")]
    XmlSyntax(String),

    #[error("lookup table `{table}` is not valid JSON")]
    TableJson {
        table: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown extraction rule `{rule}` in lookup table `{table}`")]
    UnknownRule { table: String, rule: String },

    #[error("rule `{name}` in lookup table `{table}` has no pattern")]
    MissingPattern { table: String, name: String },

    #[error("extraction rule `{rule}` cannot read {format} sources")]
    UnsupportedRule {
        rule: &'static str,
        format: &'static str,
    },

    #[error("parameter `{parameter}` not found in {context}")]
    MissingParameter { parameter: String, context: String },

    #[error("{path}: {detail}")]
    Malformed { path: PathBuf, detail: String },

    #[error("invalid interchange JSON in {path}")]
    InterchangeJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected 1 or 2 protocol sequences in {path}, found {count}")]
    ProtocolCount { path: PathBuf, count: usize },
}

pub type Result<T> = std::result::Result<T, IngestError>;
