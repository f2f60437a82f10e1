/*!
    Shared types for the stereoscopic media input crates.

    This crate holds the descriptor and payload types that cross crate
    boundaries in the input stack. It has no dependency on any demux or
    decode engine, so consumers can depend on it without pulling in native
    bindings.
*/

mod error;
mod format;
mod frame;
mod rational;
mod stereo;

pub use self::error::{Error, Result};
pub use self::format::{ChannelLayout, PixelFormat, SampleFormat};
pub use self::frame::{AudioBlob, AudioBlobInfo, VideoFrame, VideoFrameInfo};
pub use self::rational::Rational;
pub use self::stereo::StereoLayout;
