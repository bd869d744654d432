use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloudSaveError {
    // IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Config
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found at {0}. Run `cloudsave init` first")]
    ConfigNotFound(String),

    #[error("Invalid backend type: {0}")]
    InvalidBackendKind(String),

    // Naming
    #[error("Invalid archive name '{name}': {reason}")]
    ArchiveName { name: String, reason: String },

    #[error("Invalid timestamp '{0}': expected YYYYMMDDhhmmss")]
    Timestamp(String),

    // Settings
    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Secret error: {0}")]
    Secret(String),

    // Archives
    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // Serialization
    #[error("TOML deserialization error: {0}")]
    TomlDe(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),
}

pub type Result<T> = std::result::Result<T, CloudSaveError>;
