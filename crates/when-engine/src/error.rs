//! Error types for when-engine operations.

use thiserror::Error;

/// Boxed error produced by an injected [`RemainderParser`](crate::RemainderParser).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum WhenError {
    /// The caller required a time and none was recognized.
    #[error("Invalid time provided, try e.g. \"tomorrow\" or \"3 days\"")]
    NoTimeFound,

    /// A time phrase was found, but not at the start or end of the input.
    #[error(
        "Time is in an inappropriate location; it must be at the very start \
         or the very end of your input"
    )]
    MisplacedTime,

    /// The phrase sits one character into the input, but that character is
    /// not an opening double quote.
    #[error("Expected a quote before the time phrase")]
    MissingOpeningQuote,

    /// A quoted time phrase was never closed before the payload.
    #[error("A quoted time phrase must also have a closing quote")]
    MissingClosingQuote,

    /// The resolved instant precedes the reference time and the caller
    /// demanded a future one.
    #[error("This time is in the past")]
    TimeInPast,

    /// Calendar arithmetic left the representable datetime range, or the
    /// local time does not exist in the configured timezone.
    #[error("Datetime out of range: {0}")]
    OutOfRange(String),

    /// Whatever the injected remainder parser raised, forwarded unmodified.
    #[error(transparent)]
    Remainder(#[from] BoxError),
}

pub type Result<T> = std::result::Result<T, WhenError>;
