/*!
    Conversion helpers between ffmpeg-next types and the shared vocabulary.
*/

use std::time::Duration;

use media_types::{PixelFormat, Rational, SampleFormat};

/**
    Convert ffmpeg_next::Rational to our Rational.
*/
pub fn rational_from_ffmpeg(r: ffmpeg_next::Rational) -> Rational {
    Rational::new(r.numerator(), r.denominator())
}

/**
    Convert ffmpeg_next pixel format to our PixelFormat.

    Returns None for formats the input layer does not carry; streams in such
    formats are skipped at open time.
*/
pub fn pixel_format_from_ffmpeg(format: ffmpeg_next::format::Pixel) -> Option<PixelFormat> {
    use ffmpeg_next::format::Pixel;

    match format {
        Pixel::YUV420P => Some(PixelFormat::Yuv420p),
        Pixel::YUV422P => Some(PixelFormat::Yuv422p),
        Pixel::YUV444P => Some(PixelFormat::Yuv444p),
        Pixel::NV12 => Some(PixelFormat::Nv12),
        Pixel::BGRA => Some(PixelFormat::Bgra),
        Pixel::RGB24 => Some(PixelFormat::Rgb24),
        _ => None,
    }
}

/**
    Convert ffmpeg_next sample format to our SampleFormat.

    Planar and packed variants map to the same format; interleaving is
    handled when samples are copied out of the frame.
*/
pub fn sample_format_from_ffmpeg(format: ffmpeg_next::format::Sample) -> Option<SampleFormat> {
    use ffmpeg_next::format::Sample;

    match format {
        Sample::U8(_) => Some(SampleFormat::U8),
        Sample::I16(_) => Some(SampleFormat::S16),
        Sample::I32(_) => Some(SampleFormat::S32),
        Sample::F32(_) => Some(SampleFormat::F32),
        Sample::F64(_) => Some(SampleFormat::F64),
        _ => None,
    }
}

/**
    Convert a stream timestamp to a presentation time.

    Timestamps before the stream start clamp to zero.
*/
pub fn duration_from_ts(ts: i64, time_base: Rational) -> Duration {
    if ts <= 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(ts as f64 * time_base.to_f64())
}

/**
    Copy a decoded video frame's planes into one tightly packed buffer,
    dropping any stride padding.
*/
pub fn copy_video_planes(
    frame: &ffmpeg_next::util::frame::video::Video,
    format: PixelFormat,
) -> Vec<u8> {
    let width = frame.width();
    let height = frame.height();
    let mut out = Vec::with_capacity(format.frame_size(width, height));

    for plane in 0..format.plane_count() {
        let (rows, row_bytes) = format.plane_dimensions(plane, width, height);
        let stride = frame.stride(plane);
        let data = frame.data(plane);
        for row in 0..rows {
            let start = row * stride;
            out.extend_from_slice(&data[start..start + row_bytes]);
        }
    }

    out
}

/**
    Append a decoded audio frame's samples to `out` in interleaved order.

    Packed frames are copied through; planar frames (one plane per channel)
    are interleaved sample by sample.
*/
pub fn append_interleaved(
    frame: &ffmpeg_next::util::frame::audio::Audio,
    bytes_per_sample: usize,
    out: &mut Vec<u8>,
) {
    let samples = frame.samples();
    let channels = frame.channels() as usize;

    if frame.planes() <= 1 {
        let len = samples * channels * bytes_per_sample;
        out.extend_from_slice(&frame.data(0)[..len]);
        return;
    }

    out.reserve(samples * channels * bytes_per_sample);
    for sample in 0..samples {
        let offset = sample * bytes_per_sample;
        for channel in 0..channels {
            let plane = frame.data(channel);
            out.extend_from_slice(&plane[offset..offset + bytes_per_sample]);
        }
    }
}
