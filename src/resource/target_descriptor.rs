//! Size and format description of color targets.

/// Pixel format of a color target.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorFormat {
    /// 8-bit RGBA, linear.
    Rgba8Unorm,
    /// 8-bit RGBA, sRGB encoded.
    Rgba8UnormSrgb,
    /// 8-bit BGRA, linear.
    Bgra8Unorm,
    /// 8-bit BGRA, sRGB encoded.
    Bgra8UnormSrgb,
    /// 16-bit floating point RGBA.
    Rgba16Float,
}

impl ColorFormat {
    /// Number of bytes used by one pixel.
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            ColorFormat::Rgba16Float => 8,
            _ => 4,
        }
    }
}

impl From<ColorFormat> for wgpu::TextureFormat {
    #[inline]
    fn from(val: ColorFormat) -> Self {
        match val {
            ColorFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            ColorFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
            ColorFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
            ColorFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        }
    }
}

/// Sampling filter used when a target is read by a shader or a blit.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterMode {
    /// Nearest texel.
    #[default]
    Point,
    /// Linear interpolation between the four nearest texels.
    Bilinear,
}

impl From<FilterMode> for wgpu::FilterMode {
    #[inline]
    fn from(val: FilterMode) -> Self {
        match val {
            FilterMode::Point => wgpu::FilterMode::Nearest,
            FilterMode::Bilinear => wgpu::FilterMode::Linear,
        }
    }
}

/// Resolution and format of a color target.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetDescriptor {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: ColorFormat,
}

impl TargetDescriptor {
    /// Creates a new descriptor.
    pub fn new(width: u32, height: u32, format: ColorFormat) -> Self {
        TargetDescriptor {
            width,
            height,
            format,
        }
    }

    /// Whether either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
