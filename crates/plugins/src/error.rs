use thiserror::Error;

/// Errors raised while building a stage from its options.
///
/// These are fatal: a server must not start serving requests with a stage whose
/// options were rejected.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{option} is no longer supported")]
    Removed { option: &'static str },

    #[error("{option} is not supported")]
    Unsupported { option: &'static str },

    #[error("only plainObjects are supported")]
    PlainObjectsRequired,

    #[error("invalid {option}: {reason}")]
    InvalidValue { option: &'static str, reason: String },

    #[error("invalid options: {source}")]
    Deserialize {
        #[from]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub fn removed(option: &'static str) -> Self {
        Self::Removed { option }
    }

    pub fn unsupported(option: &'static str) -> Self {
        Self::Unsupported { option }
    }

    pub fn invalid_value<S: ToString>(option: &'static str, reason: S) -> Self {
        Self::InvalidValue { option, reason: reason.to_string() }
    }
}
