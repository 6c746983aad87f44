use thiserror::Error;

/// All errors that can occur in paperset-core.
#[derive(Debug, Error)]
pub enum PapersetError {
    #[error("invalid JSON on line {line}: {source}")]
    InvalidRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {0} is not a JSON object")]
    NotAnObject(usize),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, PapersetError>;
