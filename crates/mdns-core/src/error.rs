//! Error types for the mDNS publisher
//!
//! Failures fall into three classes, and callers decide what to do based on
//! the class rather than the concrete variant:
//!
//! - **transient**: the identity provider was unreachable or answered with
//!   something unusable. The resolver retries these forever.
//! - **configuration**: a statically configured value is wrong (for example a
//!   missing network interface). Retrying cannot help.
//! - **fatal**: anything the name publishing service refused. The process
//!   exits and relies on its supervisor.

use thiserror::Error;

/// Result type alias for mDNS publisher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the mDNS publisher
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors, including a missing or address-less interface
    #[error("Configuration error: {0}")]
    Config(String),

    /// Identity/address provider answered badly or not at all
    #[error("Identity provider error: {0}")]
    Identity(String),

    /// A name publishing service call failed
    #[error("Name publisher error ({operation}): {message}")]
    Publisher {
        /// The group operation that failed (create, add-address, commit, free)
        operation: String,
        /// Error message
        message: String,
    },

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an identity provider error
    pub fn identity(msg: impl Into<String>) -> Self {
        Self::Identity(msg.into())
    }

    /// Create a name publisher error for the given group operation
    pub fn publisher(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publisher {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Whether retrying the same call later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Identity(_) | Self::Http(_) | Self::Json(_)
        )
    }

    /// Whether this error stems from static configuration
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Whether this error must terminate the process
    pub fn is_fatal(&self) -> bool {
        !self.is_transient()
    }
}
