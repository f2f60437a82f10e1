/*!
    The unified stream catalog and its index resolver.
*/

use media_source::MediaSource;

/**
    One catalog entry: where a global stream number points.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StreamEntry {
    /// Index of the owning source, in open order.
    pub source: usize,
    /// The owning source's local stream index.
    pub local: usize,
    /// Display name for the stream.
    pub name: String,
}

/**
    The precomputed global-to-local index tables, one per stream kind.

    Built once at open time by concatenating each source's stream list in
    open order; stable for the lifetime of the input. Every global index maps
    to exactly one (source, local) pair and vice versa.
*/
#[derive(Debug, Default)]
pub(crate) struct Catalog {
    video: Vec<StreamEntry>,
    audio: Vec<StreamEntry>,
}

impl Catalog {
    pub fn build(sources: &[Box<dyn MediaSource>]) -> Self {
        // With several sources the local names repeat, so prefix them with
        // the source ordinal to keep catalog names unique.
        let multi = sources.len() > 1;
        let mut video = Vec::new();
        let mut audio = Vec::new();

        for (source_index, source) in sources.iter().enumerate() {
            for local in 0..source.video_stream_count() {
                video.push(StreamEntry {
                    source: source_index,
                    local,
                    name: entry_name(multi, source_index, source.video_stream_name(local)),
                });
            }
            for local in 0..source.audio_stream_count() {
                audio.push(StreamEntry {
                    source: source_index,
                    local,
                    name: entry_name(multi, source_index, source.audio_stream_name(local)),
                });
            }
        }

        Self { video, audio }
    }

    pub fn video_count(&self) -> usize {
        self.video.len()
    }

    pub fn audio_count(&self) -> usize {
        self.audio.len()
    }

    /**
        Resolve a global video stream number. Out of range is a programmer
        error and panics.
    */
    pub fn locate_video(&self, stream: usize) -> &StreamEntry {
        assert!(
            stream < self.video.len(),
            "video stream {stream} out of range (input has {})",
            self.video.len()
        );
        &self.video[stream]
    }

    /**
        Resolve a global audio stream number. Out of range is a programmer
        error and panics.
    */
    pub fn locate_audio(&self, stream: usize) -> &StreamEntry {
        assert!(
            stream < self.audio.len(),
            "audio stream {stream} out of range (input has {})",
            self.audio.len()
        );
        &self.audio[stream]
    }

    pub fn video_name(&self, stream: usize) -> &str {
        &self.locate_video(stream).name
    }

    pub fn audio_name(&self, stream: usize) -> &str {
        &self.locate_audio(stream).name
    }
}

fn entry_name(multi: bool, source_index: usize, name: String) -> String {
    if multi {
        format!("input {}: {name}", source_index + 1)
    } else {
        name
    }
}
