/*!
    The input combiner.
*/

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use media_source::MediaSource;
use media_types::{
    AudioBlob, AudioBlobInfo, Rational, Result, StereoLayout, VideoFrame, VideoFrameInfo,
};

use crate::catalog::Catalog;
use crate::config::InputConfig;
use crate::error::OpenError;
use crate::read::{ReadChannel, ReadJob};

/// A source shared with the read workers. The combiner is the only other
/// holder; the lock serializes one worker at a time against one source.
type SharedSource = Arc<Mutex<Box<dyn MediaSource>>>;

/**
    One or more media sources combined into a single logical input.

    The input owns its sources exclusively. All methods are called from the
    consuming thread; the only concurrency inside is the read workers spawned
    by `start_*_read` and collected by `finish_*_read`. Selection and layout
    calls while a read is in flight are a caller contract violation.
*/
pub struct MediaInput {
    id: String,
    sources: Vec<SharedSource>,
    catalog: Catalog,
    tags: Vec<(String, String)>,
    supports_separate: bool,
    layout: StereoLayout,
    swap_eyes: bool,
    active_video: Option<usize>,
    active_audio: Option<usize>,
    video_template: Option<VideoFrameInfo>,
    audio_template: Option<AudioBlobInfo>,
    initial_skip: Duration,
    duration: Option<Duration>,
    video_read: ReadChannel<VideoFrame>,
    audio_read: ReadChannel<AudioBlob>,
}

impl MediaInput {
    /**
        Open the given URLs with the FFmpeg backend and combine them.
    */
    #[cfg(feature = "ffmpeg")]
    pub fn open<S: AsRef<str>>(
        urls: &[S],
        config: &InputConfig,
    ) -> std::result::Result<Self, OpenError> {
        Self::open_with(urls, config, |url| {
            Ok(Box::new(media_source::FfmpegSource::open(url)?))
        })
    }

    /**
        Open the given URLs through `open_source` and combine the results.

        All or nothing: if any URL fails, sources opened so far are closed
        again and the error names the failing URL. With several sources,
        playback starts at the latest `initial_skip` and ends at the earliest
        `duration`, so no source is read past its end while another still has
        data.
    */
    pub fn open_with<S, F>(
        urls: &[S],
        config: &InputConfig,
        mut open_source: F,
    ) -> std::result::Result<Self, OpenError>
    where
        S: AsRef<str>,
        F: FnMut(&str) -> Result<Box<dyn MediaSource>>,
    {
        if urls.is_empty() {
            return Err(OpenError::NoSources);
        }

        let mut sources: Vec<Box<dyn MediaSource>> = Vec::with_capacity(urls.len());
        for url in urls {
            let url = url.as_ref();
            // On failure the sources opened so far drop here, closing them.
            let source = open_source(url).map_err(|source| OpenError::Source {
                url: url.to_string(),
                source,
            })?;
            sources.push(source);
        }

        let id = urls
            .iter()
            .map(|url| url.as_ref())
            .collect::<Vec<_>>()
            .join("/");
        let catalog = Catalog::build(&sources);

        let mut tags = Vec::new();
        for source in &sources {
            tags.extend_from_slice(source.tags());
        }

        // Start where every source has data, stop before any source runs
        // out; a single source degenerates to its own values.
        let initial_skip = sources
            .iter()
            .map(|source| source.initial_skip())
            .max()
            .unwrap_or(Duration::ZERO);
        let duration = sources.iter().filter_map(|source| source.duration()).min();

        // The separate-streams layout needs exactly one video stream from
        // each of two sources.
        let supports_separate = catalog.video_count() == 2
            && catalog.locate_video(0).source != catalog.locate_video(1).source;

        if supports_separate {
            let left_entry = catalog.locate_video(0);
            let right_entry = catalog.locate_video(1);
            let left = sources[left_entry.source].video_stream_info(left_entry.local);
            let right = sources[right_entry.source].video_stream_info(right_entry.local);
            if left.width != right.width
                || left.height != right.height
                || left.pixel_format != right.pixel_format
            {
                return Err(OpenError::IncompatibleSources(format!(
                    "eye streams disagree on geometry: {}x{} {:?} vs {}x{} {:?}",
                    left.width,
                    left.height,
                    left.pixel_format,
                    right.width,
                    right.height,
                    right.pixel_format
                )));
            }
        }

        // Default to the first stream of each kind.
        let active_video = (catalog.video_count() > 0).then_some(0);
        let active_audio = (catalog.audio_count() > 0).then_some(0);
        if let Some(stream) = active_video {
            let entry = catalog.locate_video(stream);
            sources[entry.source].select_video_stream(entry.local);
        }
        if let Some(stream) = active_audio {
            let entry = catalog.locate_audio(stream);
            sources[entry.source].select_audio_stream(entry.local);
        }

        let mut input = Self {
            id,
            sources: sources
                .into_iter()
                .map(|source| Arc::new(Mutex::new(source)))
                .collect(),
            catalog,
            tags,
            supports_separate,
            layout: StereoLayout::Mono,
            swap_eyes: false,
            active_video,
            active_audio,
            video_template: None,
            audio_template: None,
            initial_skip,
            duration,
            video_read: ReadChannel::new("video"),
            audio_read: ReadChannel::new("audio"),
        };
        input.rebuild_video_template();
        input.rebuild_audio_template();

        if (input.layout, input.swap_eyes) != (config.layout, config.swap_eyes)
            && !input.set_stereo_layout(config.layout, config.swap_eyes)
        {
            debug!(
                layout = %config.layout,
                "configured stereo layout rejected by topology, staying mono"
            );
        }

        debug!(
            id = %input.id,
            video_streams = input.catalog.video_count(),
            audio_streams = input.catalog.audio_count(),
            separate = input.supports_separate,
            "opened input"
        );
        Ok(input)
    }

    // ── Information ───────────────────────────────────────────────────

    /// Identifier of this input: the URLs joined with `/`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of video streams across all sources.
    pub fn video_streams(&self) -> usize {
        self.catalog.video_count()
    }

    /// Number of audio streams across all sources.
    pub fn audio_streams(&self) -> usize {
        self.catalog.audio_count()
    }

    /// Name of the given video stream.
    pub fn video_stream_name(&self, stream: usize) -> &str {
        self.catalog.video_name(stream)
    }

    /// Name of the given audio stream.
    pub fn audio_stream_name(&self, stream: usize) -> &str {
        self.catalog.audio_name(stream)
    }

    /// The currently active video stream, if any video exists.
    pub fn active_video_stream(&self) -> Option<usize> {
        self.active_video
    }

    /// The currently active audio stream, if any audio exists.
    pub fn active_audio_stream(&self) -> Option<usize> {
        self.active_audio
    }

    /// The current stereo layout.
    pub fn stereo_layout(&self) -> StereoLayout {
        self.layout
    }

    /// Whether the eyes are reversed relative to the layout's nominal order.
    pub fn eyes_swapped(&self) -> bool {
        self.swap_eyes
    }

    /// Aggregated metadata of all sources, in open order.
    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    /// First metadata value with the given name, across all sources.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(tag, _)| tag == name)
            .map(|(_, value)| value.as_str())
    }

    /// Initial portion of the input to skip.
    pub fn initial_skip(&self) -> Duration {
        self.initial_skip
    }

    /// Total combined duration, when any source reports one.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /**
        Descriptor of the active video stream under the current layout, with
        no payload attached.
    */
    pub fn video_frame_template(&self) -> Option<&VideoFrameInfo> {
        self.video_template.as_ref()
    }

    /**
        Descriptor of the active audio stream, with no payload attached.
    */
    pub fn audio_blob_template(&self) -> Option<&AudioBlobInfo> {
        self.audio_template.as_ref()
    }

    /// Frame rate of the active video stream. Informational only; streams
    /// need not be constant rate.
    pub fn video_frame_rate(&self) -> Option<Rational> {
        self.video_template.as_ref()?.frame_rate
    }

    /// Presentation-duration hint for one frame, derived from the frame rate.
    pub fn video_frame_duration(&self) -> Option<Duration> {
        self.video_template.as_ref()?.frame_duration()
    }

    // ── Selection ─────────────────────────────────────────────────────

    /**
        Make the given video stream the active one.

        Selecting a single stream leaves the separate-streams layout, if it
        was active. Out of range panics; reselecting the active stream is a
        no-op.
    */
    pub fn select_video_stream(&mut self, stream: usize) {
        if self.active_video == Some(stream) && self.layout.is_single_stream() {
            return;
        }
        let entry = self.catalog.locate_video(stream).clone();
        self.sources[entry.source]
            .lock()
            .unwrap()
            .select_video_stream(entry.local);
        self.active_video = Some(stream);
        if self.layout == StereoLayout::Separate {
            self.layout = StereoLayout::Mono;
        }
        self.rebuild_video_template();
        debug!(stream, "selected video stream");
    }

    /**
        Make the given audio stream the active one.

        Out of range panics; reselecting the active stream is a no-op.
    */
    pub fn select_audio_stream(&mut self, stream: usize) {
        if self.active_audio == Some(stream) {
            return;
        }
        let entry = self.catalog.locate_audio(stream).clone();
        self.sources[entry.source]
            .lock()
            .unwrap()
            .select_audio_stream(entry.local);
        self.active_audio = Some(stream);
        self.rebuild_audio_template();
        debug!(stream, "selected audio stream");
    }

    /**
        Reinterpret the active video under the given stereo layout.

        Returns false and changes nothing when the topology cannot satisfy
        the request; callers are expected to check and fall back. On success
        the video template reflects the new layout without any data being
        re-read.
    */
    pub fn set_stereo_layout(&mut self, layout: StereoLayout, swap: bool) -> bool {
        if !self.layout_accepted(layout) {
            debug!(%layout, "stereo layout rejected");
            return false;
        }

        self.layout = layout;
        self.swap_eyes = swap;
        if layout == StereoLayout::Separate {
            // Both eye streams become jointly active; the left one is the
            // nominal selection.
            for stream in 0..2 {
                let entry = self.catalog.locate_video(stream).clone();
                self.sources[entry.source]
                    .lock()
                    .unwrap()
                    .select_video_stream(entry.local);
            }
            self.active_video = Some(0);
        }
        self.rebuild_video_template();
        debug!(%layout, swap, "set stereo layout");
        true
    }

    /**
        The layout acceptance table: requested layout against the opened
        topology and the active stream's geometry.
    */
    fn layout_accepted(&self, layout: StereoLayout) -> bool {
        let Some(template) = self.video_template.as_ref() else {
            return false;
        };
        match layout {
            StereoLayout::Separate => self.supports_separate,
            StereoLayout::Mono | StereoLayout::LeftRightHalf | StereoLayout::TopBottomHalf => true,
            StereoLayout::LeftRight => template.width % 2 == 0,
            StereoLayout::TopBottom | StereoLayout::EvenOddRows => template.height % 2 == 0,
        }
    }

    fn rebuild_video_template(&mut self) {
        let template = self.active_video.map(|stream| {
            let entry = self.catalog.locate_video(stream);
            let mut info = self.sources[entry.source]
                .lock()
                .unwrap()
                .video_stream_info(entry.local);
            info.layout = self.layout;
            info.swap_eyes = self.swap_eyes;
            info
        });
        self.video_template = template;
    }

    fn rebuild_audio_template(&mut self) {
        let template = self.active_audio.map(|stream| {
            let entry = self.catalog.locate_audio(stream);
            self.sources[entry.source]
                .lock()
                .unwrap()
                .audio_stream_info(entry.local)
        });
        self.audio_template = template;
    }

    // ── Asynchronous reads ────────────────────────────────────────────

    /**
        Start reading the next video frame on background threads and return
        immediately.

        In the separate-streams layout both eye sources decode concurrently;
        otherwise only the active stream's source is dispatched. Panics when
        a video read is already in flight or the input has no video stream.
        A no-op after end of stream.
    */
    pub fn start_video_frame_read(&mut self) {
        let active = self.active_video.expect("input has no video stream");
        let entries = if self.layout == StereoLayout::Separate {
            vec![
                self.catalog.locate_video(0).clone(),
                self.catalog.locate_video(1).clone(),
            ]
        } else {
            vec![self.catalog.locate_video(active).clone()]
        };

        let jobs: Vec<ReadJob<VideoFrame>> = entries
            .into_iter()
            .map(|entry| {
                let source = Arc::clone(&self.sources[entry.source]);
                Box::new(move || source.lock().unwrap().read_video_frame())
                    as ReadJob<VideoFrame>
            })
            .collect();
        self.video_read.start(jobs);
    }

    /**
        Block until the started video read completes and return the frame.

        `Ok(None)` means end of stream and is stable: once reported, every
        further round reports it again (a separate pair with one ended eye
        counts as ended). Panics when no read was started.
    */
    pub fn finish_video_frame_read(&mut self) -> Result<Option<VideoFrame>> {
        let Some(frames) = self.video_read.finish()? else {
            return Ok(None);
        };
        let template = self
            .video_template
            .clone()
            .expect("video template exists while reading");

        let mut frames = frames.into_iter();
        let frame = match (frames.next(), frames.next()) {
            (Some(mut left), Some(mut right)) => {
                let pts = left.pts.min(right.pts);
                if self.swap_eyes {
                    std::mem::swap(&mut left, &mut right);
                }
                VideoFrame {
                    info: template,
                    pts,
                    data: left.data,
                    right_data: Some(right.data),
                }
            }
            (Some(single), None) => VideoFrame {
                info: template,
                pts: single.pts,
                data: single.data,
                right_data: None,
            },
            (None, _) => return Ok(None),
        };
        Ok(Some(frame))
    }

    /**
        Start reading roughly `size` bytes of audio on a background thread
        and return immediately.

        Panics when an audio read is already in flight or the input has no
        audio stream. A no-op after end of stream.
    */
    pub fn start_audio_blob_read(&mut self, size: usize) {
        let active = self.active_audio.expect("input has no audio stream");
        let entry = self.catalog.locate_audio(active).clone();
        let source = Arc::clone(&self.sources[entry.source]);
        let job: ReadJob<AudioBlob> =
            Box::new(move || source.lock().unwrap().read_audio_blob(size));
        self.audio_read.start(vec![job]);
    }

    /**
        Block until the started audio read completes and return the blob.

        The blob may be shorter than requested near end of stream; `Ok(None)`
        means nothing is left and is stable. Panics when no read was started.
    */
    pub fn finish_audio_blob_read(&mut self) -> Result<Option<AudioBlob>> {
        let Some(blobs) = self.audio_read.finish()? else {
            return Ok(None);
        };
        Ok(blobs.into_iter().next())
    }

    // ── Seeking and cleanup ───────────────────────────────────────────

    /**
        Seek every source to the given position.

        The position is not range-checked here. Per-source failures are not
        surfaced synchronously: they are logged and show up as a position
        discrepancy on the next completed read. Callers must finish any
        outstanding read before seeking.
    */
    pub fn seek(&mut self, pos: Duration) {
        if self.video_read.is_reading() || self.audio_read.is_reading() {
            warn!("seeking with a read in flight; its result is undefined");
        }
        for (index, source) in self.sources.iter().enumerate() {
            if let Err(e) = source.lock().unwrap().seek(pos) {
                warn!(
                    source = index,
                    error = %e,
                    "seek failed, position will diverge until the next read"
                );
            }
        }
        // Reads may resume after a backward seek past a previous end.
        self.video_read.rewind();
        self.audio_read.rewind();
        debug!(?pos, "seeked input");
    }

    /**
        Close the input: wait for any outstanding read workers, then release
        every source. Idempotent; also runs on drop.
    */
    pub fn close(&mut self) {
        self.video_read.drain();
        self.audio_read.drain();
        if !self.sources.is_empty() {
            debug!(id = %self.id, "closed input");
        }
        self.sources.clear();
        self.catalog = Catalog::default();
        self.active_video = None;
        self.active_audio = None;
        self.video_template = None;
        self.audio_template = None;
    }
}

impl Drop for MediaInput {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for MediaInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaInput")
            .field("id", &self.id)
            .field("video_streams", &self.catalog.video_count())
            .field("audio_streams", &self.catalog.audio_count())
            .field("layout", &self.layout)
            .field("swap_eyes", &self.swap_eyes)
            .finish_non_exhaustive()
    }
}
