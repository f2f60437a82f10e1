/*!
    The media source trait.
*/

use std::time::Duration;

use media_types::{AudioBlob, AudioBlobInfo, Result, VideoFrame, VideoFrameInfo};

/**
    One independently decodable input, opened from a single URL.

    A source owns its own demuxer and decoders and exposes its local stream
    catalog. Stream indices in this interface are always the source's own
    numbering; the input layer maintains the global numbering.

    Reads are blocking and deliver decoded data for the currently selected
    stream of the given kind; `Ok(None)` signals end of stream. The input
    layer runs reads on background threads, so implementations must be
    `Send`; they are never shared between threads concurrently. Dropping a
    source closes it.

    Stream index arguments must be below the corresponding stream count;
    passing anything else is a programmer error and may panic.
*/
pub trait MediaSource: Send {
    /// The URL this source was opened from.
    fn url(&self) -> &str;

    /// Number of video streams in this source.
    fn video_stream_count(&self) -> usize;

    /// Number of audio streams in this source.
    fn audio_stream_count(&self) -> usize;

    /// Human-readable description of the given video stream.
    fn video_stream_name(&self, stream: usize) -> String;

    /// Human-readable description of the given audio stream.
    fn audio_stream_name(&self, stream: usize) -> String;

    /// Fresh descriptor for the given video stream.
    fn video_stream_info(&self, stream: usize) -> VideoFrameInfo;

    /// Fresh descriptor for the given audio stream.
    fn audio_stream_info(&self, stream: usize) -> AudioBlobInfo;

    /// Make the given video stream the one `read_video_frame` decodes.
    fn select_video_stream(&mut self, stream: usize);

    /// Make the given audio stream the one `read_audio_blob` decodes.
    fn select_audio_stream(&mut self, stream: usize);

    /**
        Decode the next frame of the selected video stream.

        Blocks until a frame is available; `Ok(None)` means the stream ended.
    */
    fn read_video_frame(&mut self) -> Result<Option<VideoFrame>>;

    /**
        Decode roughly `size` bytes of the selected audio stream.

        Blocks until the data is available. The returned blob may be shorter
        than requested at end of stream; `Ok(None)` means nothing is left.
    */
    fn read_audio_blob(&mut self, size: usize) -> Result<Option<AudioBlob>>;

    /**
        Seek all of this source's streams to the given position.

        The position actually reached depends on keyframe placement and is
        only observable through the next read's presentation time.
    */
    fn seek(&mut self, pos: Duration) -> Result<()>;

    /// Total duration, when the container knows it.
    fn duration(&self) -> Option<Duration>;

    /// Initial portion of the source that carries no presentable data.
    fn initial_skip(&self) -> Duration;

    /// Container-level metadata, in container order.
    fn tags(&self) -> &[(String, String)];
}
