use thiserror::Error;

/// Errors surfaced by the round session state machine. All are local and
/// recoverable: rejected calls leave the session exactly as it was.
#[derive(Debug, Error)]
pub enum RoundError {
    /// `start()` guard: the session has no resolved responsible-party name.
    #[error("responsible party unresolved")]
    ResponsibleUnresolved,
    #[error("round already started")]
    AlreadyStarted,
    #[error("round already completed")]
    AlreadyCompleted,
    /// A running-only operation was invoked before `start()`.
    #[error("round is not running")]
    NotRunning,
    /// Policy gate, not a failure: completing without ink needs explicit user
    /// confirmation. The session stays running until the caller retries with
    /// confirmation.
    #[error("completion without a signature requires explicit confirmation")]
    UnsignedCompletion,
    #[error("signature surface: {0}")]
    Signature(#[from] SignatureError),
    /// The round log sink refused the record. The session was not advanced;
    /// completion can be retried without losing state.
    #[error("round log sink rejected the record")]
    Sink(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum SignatureError {
    /// Export was requested on a blank surface. Callers gate on `has_ink`.
    #[error("no ink on the signature surface")]
    NoInk,
    #[error("failed to encode signature raster")]
    Encode(#[from] image::ImageError),
}
