/*!
    Frame and blob descriptors and their payload-bearing forms.
*/

use std::time::Duration;

use crate::format::{ChannelLayout, PixelFormat, SampleFormat};
use crate::rational::Rational;
use crate::stereo::StereoLayout;

/**
    Immutable description of a decoded video frame's shape.

    Doubles as the template describing an active video stream: the input
    layer hands out a fresh copy per query, with no payload attached.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrameInfo {
    /// Raster width in pixels (both eyes, as stored).
    pub width: u32,
    /// Raster height in pixels (both eyes, as stored).
    pub height: u32,
    /// Pixel format, carried through unconverted.
    pub pixel_format: PixelFormat,
    /// Pixel aspect ratio (1/1 for square pixels).
    pub pixel_aspect: Rational,
    /// How left/right eye imagery is packed.
    pub layout: StereoLayout,
    /// Whether the eyes are reversed relative to the layout's nominal order.
    pub swap_eyes: bool,
    /// Average frame rate. Informational only; streams need not be constant
    /// rate, so presentation times are authoritative.
    pub frame_rate: Option<Rational>,
}

impl VideoFrameInfo {
    /**
        Presentation-duration hint for one frame, derived from the frame rate.
    */
    pub fn frame_duration(&self) -> Option<Duration> {
        let rate = self.frame_rate?;
        if rate.num <= 0 || rate.den <= 0 {
            return None;
        }
        Some(Duration::from_secs_f64(rate.invert().to_f64()))
    }

    /**
        Dimensions of a single eye's view under the current layout, as stored.

        Half layouts report the anamorphic storage size; scaling back to the
        display size is the renderer's concern.
    */
    pub const fn view_dimensions(&self) -> (u32, u32) {
        match self.layout {
            StereoLayout::Mono | StereoLayout::Separate => (self.width, self.height),
            StereoLayout::LeftRight | StereoLayout::LeftRightHalf => {
                (self.width / 2, self.height)
            }
            StereoLayout::TopBottom
            | StereoLayout::TopBottomHalf
            | StereoLayout::EvenOddRows => (self.width, self.height / 2),
        }
    }
}

/**
    A decoded video frame.

    `data` holds the stream's own packing. In the separate-streams layout the
    combiner fills `right_data` with the second eye; the two payloads are in
    presentation order (left first), any requested eye swap already applied.
*/
#[derive(Clone, Debug)]
pub struct VideoFrame {
    /// Shape of this frame.
    pub info: VideoFrameInfo,
    /// Presentation time.
    pub pts: Duration,
    /// Frame payload (the left eye in the separate-streams layout).
    pub data: Vec<u8>,
    /// Right-eye payload, present only in the separate-streams layout.
    pub right_data: Option<Vec<u8>>,
}

/**
    Immutable description of a decoded audio blob's shape.

    Doubles as the template describing an active audio stream.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioBlobInfo {
    /// Channel layout.
    pub channels: ChannelLayout,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Sample format, interleaved.
    pub sample_format: SampleFormat,
}

impl AudioBlobInfo {
    /**
        Bytes per interleaved sample frame (one sample across all channels).
    */
    pub const fn bytes_per_frame(&self) -> usize {
        self.sample_format.bytes_per_sample() * self.channels.channels() as usize
    }

    /**
        Playback duration of `bytes` bytes of this format.
    */
    pub fn duration_of(&self, bytes: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = bytes / self.bytes_per_frame();
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }
}

/**
    A chunk of decoded, interleaved audio data.

    Blobs may come back shorter than requested at end of stream.
*/
#[derive(Clone, Debug)]
pub struct AudioBlob {
    /// Shape of this blob.
    pub info: AudioBlobInfo,
    /// Presentation time of the first sample.
    pub pts: Duration,
    /// Interleaved sample data.
    pub data: Vec<u8>,
}
