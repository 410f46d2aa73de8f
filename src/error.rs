use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy for the detection pipeline.
///
/// `MalformedTranscript` and `Oracle` abort the whole run; `ProbeTransport`
/// and `Decode` are recovered close to where they happen and never fail a
/// batch on their own.
#[derive(Error, Debug)]
pub enum Error {
    /// The recording is missing the expected `log.entries` structure.
    #[error("malformed transcript: {0}")]
    MalformedTranscript(String),

    /// A live probe could not complete at the transport level.
    #[error("probe transport error: {0}")]
    ProbeTransport(String),

    /// The external endpoint classifier failed.
    #[error("oracle error: {0}")]
    Oracle(String),

    /// An example parameter could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
