/*!
    The input combiner.

    One or more independently decoded media sources presented as a single
    logical input: a unified stream catalog over all sources, one active
    video and audio stream, stereoscopic reinterpretation of the selection
    (including two mono files as left/right eyes), and an asynchronous
    start/finish read protocol so decode work overlaps with consumption.

    ```ignore
    let mut input = MediaInput::open(&["left.mp4", "right.mp4"], &InputConfig::default())?;
    input.set_stereo_layout(StereoLayout::Separate, false);
    loop {
        input.start_video_frame_read();
        // ... render the previous frame, mix audio, handle events ...
        match input.finish_video_frame_read()? {
            Some(frame) => present(frame),
            None => break, // end of stream
        }
    }
    ```
*/

mod catalog;
mod config;
mod error;
mod input;
mod read;

pub use self::config::InputConfig;
pub use self::error::OpenError;
pub use self::input::MediaInput;
