/*!
    Input configuration.
*/

use media_types::StereoLayout;

/**
    Configuration for opening an input.
*/
#[derive(Clone, Debug)]
pub struct InputConfig {
    /// Stereo layout to request at open time. Falls back to mono when the
    /// opened topology cannot satisfy it.
    pub layout: StereoLayout,
    /// Whether the eyes are reversed relative to the layout's nominal order.
    pub swap_eyes: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            layout: StereoLayout::Mono,
            swap_eyes: false,
        }
    }
}
