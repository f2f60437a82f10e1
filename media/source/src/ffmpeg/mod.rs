/*!
    FFmpeg-backed media source.

    Wraps one demuxer context plus a decoder per mappable stream. All streams
    get their decoders at open time, so switching the selected stream never
    fails; packets are routed to the selected stream of each kind and
    everything else is dropped at the demuxer.
*/

mod convert;

use std::collections::VecDeque;
use std::time::Duration;

use ffmpeg_next::{
    Packet,
    codec::{self, decoder::Audio as AudioDecoder, decoder::Video as VideoDecoder},
    ffi,
    format::context::Input as InputContext,
    format::stream::Stream,
    media::Type,
    util::frame::audio::Audio as AudioFrameFFmpeg,
    util::frame::video::Video as VideoFrameFFmpeg,
};
use tracing::{debug, warn};

use media_types::{
    AudioBlob, AudioBlobInfo, ChannelLayout, Error, Rational, Result, StereoLayout, VideoFrame,
    VideoFrameInfo,
};

use crate::MediaSource;
use self::convert::{
    append_interleaved, copy_video_planes, duration_from_ts, pixel_format_from_ffmpeg,
    rational_from_ffmpeg, sample_format_from_ffmpeg,
};

/**
    A media source decoding one URL through FFmpeg.
*/
pub struct FfmpegSource {
    url: String,
    input: InputContext,
    video_streams: Vec<VideoStreamState>,
    audio_streams: Vec<AudioStreamState>,
    active_video: usize,
    active_audio: usize,
    tags: Vec<(String, String)>,
    duration: Option<Duration>,
    initial_skip: Duration,
}

// The demuxer context, decoders and packets are exclusively owned by this
// struct, which the input layer only ever touches from one thread at a time
// (behind its per-source lock).
unsafe impl Send for FfmpegSource {}

struct VideoStreamState {
    /// Demuxer-level stream index.
    index: usize,
    name: String,
    info: VideoFrameInfo,
    time_base: Rational,
    decoder: VideoDecoder,
    queued: VecDeque<Packet>,
    pending: VecDeque<VideoFrame>,
    eof: bool,
}

struct AudioStreamState {
    index: usize,
    name: String,
    info: AudioBlobInfo,
    time_base: Rational,
    decoder: AudioDecoder,
    queued: VecDeque<Packet>,
    /// Decoded interleaved samples not yet handed out.
    buffer: Vec<u8>,
    /// Presentation time of the first byte in `buffer`.
    next_pts: Duration,
    eof: bool,
}

impl FfmpegSource {
    /**
        Open a URL and enumerate its streams.

        Streams whose pixel or sample format the vocabulary cannot carry are
        skipped with a warning; a source may end up with no usable streams,
        which the input layer treats like any other empty source.
    */
    pub fn open(url: &str) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::source(e.to_string()))?;

        let input = ffmpeg_next::format::input(&url).map_err(|e| {
            if e.to_string().contains("No such file") {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    e.to_string(),
                ))
            } else {
                Error::source(e.to_string())
            }
        })?;

        let mut video_streams = Vec::new();
        let mut audio_streams = Vec::new();

        for stream in input.streams() {
            match stream.parameters().medium() {
                Type::Video => {
                    let ordinal = video_streams.len();
                    match open_video_stream(&stream, ordinal) {
                        Some(state) => video_streams.push(state),
                        None => warn!(
                            url,
                            index = stream.index(),
                            "skipping video stream with unsupported format"
                        ),
                    }
                }
                Type::Audio => {
                    let ordinal = audio_streams.len();
                    match open_audio_stream(&stream, ordinal) {
                        Some(state) => audio_streams.push(state),
                        None => warn!(
                            url,
                            index = stream.index(),
                            "skipping audio stream with unsupported format"
                        ),
                    }
                }
                _ => {}
            }
        }

        let tags: Vec<(String, String)> = input
            .metadata()
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        let duration = if input.duration() > 0 {
            Some(Duration::from_micros(input.duration() as u64))
        } else {
            None
        };

        // Container start time is not exposed by the safe wrapper.
        // SAFETY: reading a plain field of the AVFormatContext FFmpeg owns.
        let start_time = unsafe { (*input.as_ptr()).start_time };
        let initial_skip = if start_time != ffi::AV_NOPTS_VALUE && start_time > 0 {
            Duration::from_micros(start_time as u64)
        } else {
            Duration::ZERO
        };

        debug!(
            url,
            video_streams = video_streams.len(),
            audio_streams = audio_streams.len(),
            ?duration,
            "opened media source"
        );

        Ok(Self {
            url: url.to_string(),
            input,
            video_streams,
            audio_streams,
            active_video: 0,
            active_audio: 0,
            tags,
            duration,
            initial_skip,
        })
    }

    /**
        Read the next demuxed packet and route it to the selected stream of
        its kind. Returns false at container end.
    */
    fn pump_packet(&mut self) -> bool {
        let (index, packet) = match self.input.packets().next() {
            Some((stream, packet)) => (stream.index(), packet),
            None => return false,
        };

        if let Some(stream) = self.video_streams.get_mut(self.active_video) {
            if stream.index == index {
                stream.queued.push_back(packet);
                return true;
            }
        }
        if let Some(stream) = self.audio_streams.get_mut(self.active_audio) {
            if stream.index == index {
                stream.queued.push_back(packet);
                return true;
            }
        }

        // A packet for an unselected stream; nothing buffers it.
        true
    }
}

impl MediaSource for FfmpegSource {
    fn url(&self) -> &str {
        &self.url
    }

    fn video_stream_count(&self) -> usize {
        self.video_streams.len()
    }

    fn audio_stream_count(&self) -> usize {
        self.audio_streams.len()
    }

    fn video_stream_name(&self, stream: usize) -> String {
        self.video_streams[stream].name.clone()
    }

    fn audio_stream_name(&self, stream: usize) -> String {
        self.audio_streams[stream].name.clone()
    }

    fn video_stream_info(&self, stream: usize) -> VideoFrameInfo {
        self.video_streams[stream].info.clone()
    }

    fn audio_stream_info(&self, stream: usize) -> AudioBlobInfo {
        self.audio_streams[stream].info.clone()
    }

    fn select_video_stream(&mut self, stream: usize) {
        assert!(
            stream < self.video_streams.len(),
            "video stream {stream} out of range"
        );
        self.active_video = stream;
    }

    fn select_audio_stream(&mut self, stream: usize) {
        assert!(
            stream < self.audio_streams.len(),
            "audio stream {stream} out of range"
        );
        self.active_audio = stream;
    }

    fn read_video_frame(&mut self) -> Result<Option<VideoFrame>> {
        if self.video_streams.is_empty() {
            return Err(Error::source("source has no video stream"));
        }

        loop {
            {
                let stream = &mut self.video_streams[self.active_video];
                if let Some(frame) = stream.pending.pop_front() {
                    return Ok(Some(frame));
                }
                if stream.eof {
                    return Ok(None);
                }
                if let Some(packet) = stream.queued.pop_front() {
                    stream.decode_packet(&packet)?;
                    continue;
                }
            }

            if !self.pump_packet() {
                let stream = &mut self.video_streams[self.active_video];
                stream.flush()?;
                stream.eof = true;
            }
        }
    }

    fn read_audio_blob(&mut self, size: usize) -> Result<Option<AudioBlob>> {
        if self.audio_streams.is_empty() {
            return Err(Error::source("source has no audio stream"));
        }

        loop {
            {
                let stream = &mut self.audio_streams[self.active_audio];
                if stream.buffer.len() >= size {
                    return Ok(Some(stream.take_blob(size)));
                }
                if stream.eof {
                    if stream.buffer.is_empty() {
                        return Ok(None);
                    }
                    let remaining = stream.buffer.len();
                    return Ok(Some(stream.take_blob(remaining)));
                }
                if let Some(packet) = stream.queued.pop_front() {
                    stream.decode_packet(&packet)?;
                    continue;
                }
            }

            if !self.pump_packet() {
                let stream = &mut self.audio_streams[self.active_audio];
                stream.flush()?;
                stream.eof = true;
            }
        }
    }

    fn seek(&mut self, pos: Duration) -> Result<()> {
        let timestamp = (pos.as_secs_f64() * f64::from(ffi::AV_TIME_BASE)) as i64;

        self.input
            .seek(timestamp, ..timestamp)
            .map_err(|e| Error::source(format!("seek failed: {e}")))?;

        for stream in &mut self.video_streams {
            stream.reset_after_seek();
        }
        for stream in &mut self.audio_streams {
            stream.reset_after_seek(pos);
        }
        Ok(())
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn initial_skip(&self) -> Duration {
        self.initial_skip
    }

    fn tags(&self) -> &[(String, String)] {
        &self.tags
    }
}

impl VideoStreamState {
    /**
        Send one packet to the decoder and collect every frame it yields.
    */
    fn decode_packet(&mut self, packet: &Packet) -> Result<()> {
        match self.decoder.send_packet(packet) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                // Decoder buffer full; drain, then retry once.
                self.receive_frames()?;
                if let Err(e) = self.decoder.send_packet(packet) {
                    if !matches!(e, ffmpeg_next::Error::Other { errno } if errno == ffi::EAGAIN) {
                        return Err(Error::source(e.to_string()));
                    }
                }
            }
            Err(e) => return Err(Error::source(e.to_string())),
        }
        self.receive_frames()
    }

    /**
        Signal end of stream to the decoder and collect its buffered frames.
    */
    fn flush(&mut self) -> Result<()> {
        match self.decoder.send_eof() {
            Ok(()) | Err(ffmpeg_next::Error::Eof) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                self.receive_frames()?;
                let _ = self.decoder.send_eof();
            }
            Err(e) => return Err(Error::source(e.to_string())),
        }
        self.receive_frames()
    }

    fn receive_frames(&mut self) -> Result<()> {
        let mut decoded = VideoFrameFFmpeg::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    let pts =
                        duration_from_ts(decoded.pts().unwrap_or(0), self.time_base);
                    self.pending.push_back(VideoFrame {
                        info: self.info.clone(),
                        pts,
                        data: copy_video_planes(&decoded, self.info.pixel_format),
                        right_data: None,
                    });
                }
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => break,
                Err(ffmpeg_next::Error::Eof) => break,
                Err(e) => return Err(Error::source(e.to_string())),
            }
        }
        Ok(())
    }

    fn reset_after_seek(&mut self) {
        self.decoder.flush();
        self.queued.clear();
        self.pending.clear();
        self.eof = false;
    }
}

impl AudioStreamState {
    fn decode_packet(&mut self, packet: &Packet) -> Result<()> {
        match self.decoder.send_packet(packet) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                self.receive_frames()?;
                if let Err(e) = self.decoder.send_packet(packet) {
                    if !matches!(e, ffmpeg_next::Error::Other { errno } if errno == ffi::EAGAIN) {
                        return Err(Error::source(e.to_string()));
                    }
                }
            }
            Err(e) => return Err(Error::source(e.to_string())),
        }
        self.receive_frames()
    }

    fn flush(&mut self) -> Result<()> {
        match self.decoder.send_eof() {
            Ok(()) | Err(ffmpeg_next::Error::Eof) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                self.receive_frames()?;
                let _ = self.decoder.send_eof();
            }
            Err(e) => return Err(Error::source(e.to_string())),
        }
        self.receive_frames()
    }

    fn receive_frames(&mut self) -> Result<()> {
        let mut decoded = AudioFrameFFmpeg::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    if self.buffer.is_empty() {
                        if let Some(pts) = decoded.pts() {
                            self.next_pts = duration_from_ts(pts, self.time_base);
                        }
                    }
                    append_interleaved(
                        &decoded,
                        self.info.sample_format.bytes_per_sample(),
                        &mut self.buffer,
                    );
                }
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => break,
                Err(ffmpeg_next::Error::Eof) => break,
                Err(e) => return Err(Error::source(e.to_string())),
            }
        }
        Ok(())
    }

    /**
        Hand out the first `size` buffered bytes as one blob.
    */
    fn take_blob(&mut self, size: usize) -> AudioBlob {
        let size = size.min(self.buffer.len());
        let data: Vec<u8> = self.buffer.drain(..size).collect();
        let pts = self.next_pts;
        self.next_pts += self.info.duration_of(size);
        AudioBlob {
            info: self.info.clone(),
            pts,
            data,
        }
    }

    fn reset_after_seek(&mut self, pos: Duration) {
        self.decoder.flush();
        self.queued.clear();
        self.buffer.clear();
        self.next_pts = pos;
        self.eof = false;
    }
}

/**
    Build the decoder and descriptor for one video stream, or None when the
    stream cannot be mapped.
*/
fn open_video_stream(stream: &Stream<'_>, ordinal: usize) -> Option<VideoStreamState> {
    let decoder_ctx = codec::context::Context::from_parameters(stream.parameters()).ok()?;
    let decoder = decoder_ctx.decoder().video().ok()?;

    let pixel_format = pixel_format_from_ffmpeg(decoder.format())?;
    let width = decoder.width();
    let height = decoder.height();

    let aspect = rational_from_ffmpeg(decoder.aspect_ratio());
    let pixel_aspect = if aspect.num > 0 && aspect.den > 0 {
        aspect
    } else {
        Rational::ONE
    };

    let frame_rate = if stream.avg_frame_rate().numerator() != 0 {
        Some(rational_from_ffmpeg(stream.avg_frame_rate()))
    } else if stream.rate().numerator() != 0 {
        Some(rational_from_ffmpeg(stream.rate()))
    } else {
        None
    };

    let name = match stream.metadata().get("language") {
        Some(language) => format!("video {ordinal} [{language}]: {width}x{height}"),
        None => format!("video {ordinal}: {width}x{height}"),
    };

    Some(VideoStreamState {
        index: stream.index(),
        name,
        info: VideoFrameInfo {
            width,
            height,
            pixel_format,
            pixel_aspect,
            layout: StereoLayout::Mono,
            swap_eyes: false,
            frame_rate,
        },
        time_base: rational_from_ffmpeg(stream.time_base()),
        decoder,
        queued: VecDeque::new(),
        pending: VecDeque::new(),
        eof: false,
    })
}

/**
    Build the decoder and descriptor for one audio stream, or None when the
    stream cannot be mapped.
*/
fn open_audio_stream(stream: &Stream<'_>, ordinal: usize) -> Option<AudioStreamState> {
    let decoder_ctx = codec::context::Context::from_parameters(stream.parameters()).ok()?;
    let decoder = decoder_ctx.decoder().audio().ok()?;

    let sample_format = sample_format_from_ffmpeg(decoder.format())?;
    let sample_rate = decoder.rate();
    let channels = ChannelLayout::from_count(decoder.channels());

    let name = match stream.metadata().get("language") {
        Some(language) => format!(
            "audio {ordinal} [{language}]: {sample_rate} Hz, {} channels",
            channels.channels()
        ),
        None => format!(
            "audio {ordinal}: {sample_rate} Hz, {} channels",
            channels.channels()
        ),
    };

    Some(AudioStreamState {
        index: stream.index(),
        name,
        info: AudioBlobInfo {
            channels,
            sample_rate,
            sample_format,
        },
        time_base: rational_from_ffmpeg(stream.time_base()),
        decoder,
        queued: VecDeque::new(),
        buffer: Vec::new(),
        next_pts: Duration::ZERO,
        eof: false,
    })
}
