use thiserror::Error;

/// A trip that could not be written.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("trip output I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("trip CSV: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "sqlite")]
    #[error("trip database: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A write arrived after `finish`.
    #[error("trip writer already finished")]
    Finished,
}

pub type OutputResult<T> = Result<T, OutputError>;
