use thiserror::Error;

#[derive(Debug, Error)]
pub enum CustomError {
    #[error("could not read {path}")]
    ReadWithPath {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[error("could not read input stream")]
    ReadWithoutPath {
        #[source]
        source: std::io::Error,
    },

    #[error("could not write to {path}")]
    Write {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[error("could not write to output stream")]
    WriteWithoutPath {
        #[source]
        source: std::io::Error,
    },

    #[error("could not write tab-delimited output")]
    CsvWrite(#[from] csv::Error),

    #[error("could not serialize run report")]
    Json(#[from] serde_json::Error),

    #[error("could not open log file {path}")]
    LogFile {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[error("input is empty")]
    EmptyInput,

    #[error("file format not supported: expected \"##fileformat=VCFv4\" (got {line:?})")]
    FileFormat { line: String },

    #[error("no \"#CHROM\" header line found before data (got {line:?})")]
    MissingHeader { line: String },

    #[error("header line is not valid UTF-8")]
    HeaderUtf8 {
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("expected at least {expected} header columns (got {n_columns})")]
    HeaderColumns { n_columns: usize, expected: usize },

    #[error("could not build worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("a worker exited before signaling completion")]
    WorkerLost,

    #[error("thread count must be at least 1")]
    ThreadCount,

    #[error("batch size must be at least 1")]
    BatchSize,
}

pub type Result<T> = std::result::Result<T, CustomError>;
