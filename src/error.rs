use thiserror::Error;

/// Network or HTTP-level failure while retrieving a page.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// The document could not be turned into tables.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unknown character encoding '{0}'")]
    UnknownEncoding(String),

    #[error("table {table}, row {row}: expected {expected} cells, found {found}")]
    RaggedRow {
        table: usize,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("table index {index} out of range ({found} tables found)")]
    TableNotFound { index: usize, found: usize },
}

/// Column classification broke an internal invariant.
#[derive(Error, Debug)]
pub enum TypeError {
    #[error("row {row} has {found} cells but the table has {expected} columns")]
    Shape {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("column '{column}': cannot convert '{value}' to a number")]
    Cast { column: String, value: String },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Type(#[from] TypeError),
}
