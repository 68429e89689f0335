//! Configuration error types.

/// Errors from loading, saving, or parsing `config.ron`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("could not read config file: {0}")]
    ReadError(#[source] std::io::Error),

    /// The config directory or file could not be written.
    #[error("could not write config file: {0}")]
    WriteError(#[source] std::io::Error),

    /// The file is not valid RON for [`Config`](crate::Config).
    #[error("invalid config file: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    #[error("could not serialize config: {0}")]
    SerializeError(#[source] ron::Error),
}
