use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] tickdash_core::ValidationError),

    #[error(transparent)]
    Config(#[from] tickdash_core::ConfigError),

    /// The dashboard rendered a failure; it has already been printed.
    #[error("{message} ({code})")]
    Dashboard { code: String, message: String },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 2,
            Self::Dashboard { .. } => 3,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }

    /// Whether `main` still needs to print the message.
    pub const fn is_reported(&self) -> bool {
        matches!(self, Self::Dashboard { .. })
    }
}
