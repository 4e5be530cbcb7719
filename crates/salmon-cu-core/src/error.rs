use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Table '{table}' is missing expected column(s): {}", .columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    #[error("Unsupported input file '{0}'")]
    UnsupportedInput(String),

    #[error("{0}")]
    Other(String),
}
