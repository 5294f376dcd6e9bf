//! Color type used by software shaders.

pub use rgb::Rgba;

/// RGBA with f32 components in [0.0, 1.0].
pub type Color = Rgba<f32>;
