/*!
    Opening errors.
*/

use thiserror::Error;

/**
    Errors fatal to opening an input.

    Opening is all or nothing: when any of these is returned, every source
    opened so far has already been closed again.
*/
#[derive(Debug, Error)]
pub enum OpenError {
    /// An empty URL list.
    #[error("no sources given")]
    NoSources,

    /// One of the URLs could not be opened.
    #[error("failed to open {url}: {source}")]
    Source {
        url: String,
        source: media_types::Error,
    },

    /// The opened sources cannot form one combined input.
    #[error("sources cannot be combined: {0}")]
    IncompatibleSources(String),
}
