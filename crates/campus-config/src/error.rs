use thiserror::Error;

/// Failures while loading or checking Campus configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer failed to parse, or the merged result has the wrong shape.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// An optional section is needed by the caller but left empty, e.g.
    /// gateway keys when a checkout is attempted.
    #[error("[{section}] is not configured")]
    NotConfigured { section: String },

    /// Loaded, but outside the range the server accepts.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
