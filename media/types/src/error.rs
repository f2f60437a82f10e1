/*!
    Error types shared across the media input crates.
*/

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/**
    Errors produced by media sources and the read machinery built on them.

    Opening failures are wrapped separately by the input layer; this type
    covers everything that can go wrong once a source exists.
*/
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error from the underlying container or transport.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A demux or decode failure inside a media source.
    #[error("{0}")]
    Source(String),

    /// A format the input layer cannot carry without conversion.
    #[error("unsupported format: {0}")]
    Unsupported(String),

    /// A background read worker failed to deliver a result.
    #[error("{0}")]
    Read(String),
}

impl Error {
    /**
        Create a source-level error from a message.
    */
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    /**
        Create an unsupported-format error from a message.
    */
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /**
        Create a read-worker error from a message.
    */
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read(message.into())
    }
}
