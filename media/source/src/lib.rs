/*!
    Media source interface for the stereoscopic input crates.

    A media source is one opened URL: it exposes its own stream catalog and
    blocking read/seek operations. The input layer combines several sources
    into one logical input and supplies the asynchrony; sources stay simple.

    The [`FfmpegSource`] backend (feature `ffmpeg`) implements the interface
    on top of FFmpeg's demuxers and decoders.
*/

mod source;

pub use self::source::MediaSource;

#[cfg(feature = "ffmpeg")]
mod ffmpeg;

#[cfg(feature = "ffmpeg")]
pub use self::ffmpeg::FfmpegSource;
