/*!
    Pixel and sample format vocabulary.
*/

/**
    Video pixel formats the input layer can carry without conversion.

    This is the subset produced by common software decoders; the input layer
    never converts between them (that belongs to the rendering side).
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp (the overwhelmingly common delivery format)
    Yuv420p,
    /// Planar YUV 4:2:2, 16bpp
    Yuv422p,
    /// Planar YUV 4:4:4, 24bpp
    Yuv444p,
    /// Semi-planar YUV 4:2:0, 12bpp (hardware decoder output)
    Nv12,
    /// Packed BGRA, 32bpp
    Bgra,
    /// Packed RGB, 24bpp
    Rgb24,
}

impl PixelFormat {
    /**
        Average bits per pixel for this format.
    */
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Yuv420p | Self::Nv12 => 12,
            Self::Yuv422p => 16,
            Self::Yuv444p | Self::Rgb24 => 24,
            Self::Bgra => 32,
        }
    }

    /**
        Number of data planes a frame of this format carries.
    */
    pub const fn plane_count(self) -> usize {
        match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => 3,
            Self::Nv12 => 2,
            Self::Bgra | Self::Rgb24 => 1,
        }
    }

    /**
        Size in bytes of one tightly packed frame at the given dimensions.

        Chroma-subsampled formats assume even dimensions, which every real
        encoder enforces.
    */
    pub const fn frame_size(self, width: u32, height: u32) -> usize {
        (width as usize * height as usize * self.bits_per_pixel() as usize) / 8
    }

    /**
        Row count and tightly packed row length in bytes of the given plane.

        `plane` must be below [`plane_count`](Self::plane_count).
    */
    pub const fn plane_dimensions(self, plane: usize, width: u32, height: u32) -> (usize, usize) {
        let w = width as usize;
        let h = height as usize;
        match (self, plane) {
            // Luma / packed planes cover the full raster.
            (Self::Yuv420p | Self::Yuv422p | Self::Yuv444p | Self::Nv12, 0) => (h, w),
            (Self::Bgra, 0) => (h, w * 4),
            (Self::Rgb24, 0) => (h, w * 3),
            // Chroma planes.
            (Self::Yuv420p, 1 | 2) => (h / 2, w / 2),
            (Self::Yuv422p, 1 | 2) => (h, w / 2),
            (Self::Yuv444p, 1 | 2) => (h, w),
            (Self::Nv12, 1) => (h / 2, w),
            _ => (0, 0),
        }
    }
}

/**
    Audio sample formats.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SampleFormat {
    /// Unsigned 8-bit integer
    U8,
    /// Signed 16-bit integer
    S16,
    /// Signed 32-bit integer
    S32,
    /// 32-bit floating point, range [-1.0, 1.0]
    F32,
    /// 64-bit floating point
    F64,
}

impl SampleFormat {
    /**
        Bytes per sample per channel.
    */
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 => 2,
            Self::S32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /**
        Returns true for floating-point formats.
    */
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

/**
    Audio channel layout.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ChannelLayout {
    /// Single channel
    Mono,
    /// Left and right
    Stereo,
    /// Quadraphonic (FL, FR, BL, BR)
    Quad,
    /// 5.1 surround (FL, FR, FC, LFE, BL, BR)
    Surround5_1,
    /// 7.1 surround (FL, FR, FC, LFE, BL, BR, SL, SR)
    Surround7_1,
}

impl ChannelLayout {
    /**
        Number of channels.
    */
    pub const fn channels(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Quad => 4,
            Self::Surround5_1 => 6,
            Self::Surround7_1 => 8,
        }
    }

    /**
        Closest layout for a raw channel count.
    */
    pub const fn from_count(count: u16) -> Self {
        match count {
            0 | 1 => Self::Mono,
            2 | 3 => Self::Stereo,
            4 | 5 => Self::Quad,
            6 | 7 => Self::Surround5_1,
            _ => Self::Surround7_1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_matches_bits_per_pixel() {
        assert_eq!(PixelFormat::Yuv420p.frame_size(1920, 1080), 1920 * 1080 * 3 / 2);
        assert_eq!(PixelFormat::Bgra.frame_size(64, 64), 64 * 64 * 4);
        assert_eq!(PixelFormat::Rgb24.frame_size(2, 2), 12);
    }

    #[test]
    fn plane_dimensions_cover_the_frame() {
        // Summing tightly packed planes reproduces frame_size.
        for format in [
            PixelFormat::Yuv420p,
            PixelFormat::Yuv422p,
            PixelFormat::Yuv444p,
            PixelFormat::Nv12,
            PixelFormat::Bgra,
            PixelFormat::Rgb24,
        ] {
            let total: usize = (0..format.plane_count())
                .map(|p| {
                    let (rows, row_bytes) = format.plane_dimensions(p, 640, 480);
                    rows * row_bytes
                })
                .sum();
            assert_eq!(total, format.frame_size(640, 480), "{format:?}");
        }
    }

    #[test]
    fn sample_format_sizes() {
        assert_eq!(SampleFormat::U8.bytes_per_sample(), 1);
        assert_eq!(SampleFormat::S16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::F64.bytes_per_sample(), 8);
        assert!(SampleFormat::F32.is_float());
        assert!(!SampleFormat::S32.is_float());
    }

    #[test]
    fn channel_layout_from_count_rounds_down() {
        assert_eq!(ChannelLayout::from_count(1).channels(), 1);
        assert_eq!(ChannelLayout::from_count(3), ChannelLayout::Stereo);
        assert_eq!(ChannelLayout::from_count(6), ChannelLayout::Surround5_1);
        assert_eq!(ChannelLayout::from_count(16), ChannelLayout::Surround7_1);
    }
}
