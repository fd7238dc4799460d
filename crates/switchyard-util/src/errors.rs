use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all Switchyard operations.
#[derive(Debug, Error, Diagnostic)]
pub enum SwitchyardError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid client configuration.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check app-name and api-url in your config or UNLEASH_* environment"))]
    Config { message: String },

    /// Network request failed before a response was received.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Toggle payload (server response, backup or bootstrap file) did not parse.
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// The server answered with a status the caller treats as a failure.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// The client could not reach a usable state during start-up.
    #[error("Could not initialize client: {message}")]
    Initialization { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

impl SwitchyardError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }
}

/// Convenience alias for `miette::Result<T>`.
pub type SwitchyardResult<T> = miette::Result<T>;
