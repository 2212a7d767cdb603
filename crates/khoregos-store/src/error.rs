use std::path::PathBuf;

/// Errors from the store layer: opening the database, applying
/// migrations, and validating identifiers before SQL ever runs.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("unknown column {column} for table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("unsafe identifier: {0}")]
    UnsafeIdentifier(String),

    #[error("migration {version} failed: {source}")]
    MigrationFailed {
        version: i64,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("row did not match the expected shape: {0}")]
    Schema(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
