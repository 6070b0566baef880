//! Unified error types for the ferrogram client library.
//!
//! Every fail path carries enough structured detail (which bot, which
//! endpoint, which remote code/description) to let the caller log or react
//! programmatically instead of matching on message strings.

use thiserror::Error;

// =============================================================================
// Request Validation Errors
// =============================================================================

/// Errors raised while validating an outbound request, before any network
/// call is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// No HTTP method was set on the request.
    #[error("no HTTP method specified on the request")]
    MethodNotSpecified,

    /// The HTTP method is not one of GET or POST.
    #[error("invalid HTTP method '{method}', only GET and POST are supported")]
    InvalidMethod {
        /// The rejected method, as supplied by the caller (upper-cased).
        method: String,
    },
}

// =============================================================================
// Library Errors
// =============================================================================

/// Errors that can occur across the client library.
#[derive(Debug, Error)]
pub enum Error {
    /// The named bot has no entry in the `bots` configuration table.
    #[error("bot '{name}' is not configured")]
    BotNotConfigured {
        /// The bot name that failed to resolve.
        name: String,
    },

    /// A call needed the default bot but no default bot name is configured.
    #[error("no default bot is configured")]
    NoDefaultBot,

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Outbound request validation failed.
    #[error(transparent)]
    RequestValidation(#[from] RequestError),

    /// The network call itself failed (connection, TLS, timeout, non-JSON
    /// error page). Distinct from [`Error::Api`], which means the call
    /// reached Telegram and was rejected.
    #[error("transport failure for '{endpoint}': {reason}")]
    Transport {
        /// The API endpoint being called.
        endpoint: String,
        /// Backend-supplied failure description.
        reason: String,
    },

    /// Telegram accepted the request at the transport level but reported
    /// failure in the response envelope.
    #[error("telegram rejected '{endpoint}' with code {error_code}: {description}")]
    Api {
        /// The API endpoint being called.
        endpoint: String,
        /// Remote `error_code` from the response envelope.
        error_code: i64,
        /// Remote `description` from the response envelope.
        description: String,
    },

    /// An inbound update payload matched none of the recognized update kinds.
    #[error("update payload matches no recognized update kind")]
    IndeterminateUpdate,

    /// Malformed caller input, e.g. a file download with neither a file id
    /// nor a descriptor carrying one.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A response body could not be decoded into the expected shape.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// Local I/O failure (file download persistence, upload source read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;
