//! Error types for the memory engine.

/// Result type alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds produced by the memory engine.
///
/// The query path, ingestion path, supervision path, and decay path each
/// have a distinct recovery policy for these; see `is_recoverable` and
/// the module docs in `retrieval` and `ingestion`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The store could not be reached or its connection pool is exhausted.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store returned data that violates an invariant (bad row, torn write).
    #[error("store corruption: {0}")]
    StoreCorruption(String),

    /// The embedding oracle could not be reached.
    #[error("embedding oracle unavailable: {0}")]
    EmbedUnavailable(String),

    /// The embedding oracle did not respond within the configured timeout.
    #[error("embedding oracle timed out")]
    EmbedTimeout,

    /// The embedding oracle responded with a body the client could not parse.
    #[error("embedding oracle returned malformed response: {0}")]
    EmbedMalformed(String),

    /// A memory id did not have the expected `domain:channel:hash` shape.
    #[error("invalid memory id: {0}")]
    InvalidId(String),

    /// A stored or computed embedding did not match the configured dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured embedding dimension.
        expected: usize,
        /// Dimension actually observed.
        actual: usize,
    },

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A referenced memory id does not exist.
    #[error("memory not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure reading configuration or candidate files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller should recover locally (degrade) rather than abort.
    ///
    /// Used by the retrieval pipeline to decide between proceeding without
    /// a semantic component and returning an empty result with a warning.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::EmbedUnavailable(_) | Error::EmbedTimeout | Error::EmbedMalformed(_)
        )
    }
}
