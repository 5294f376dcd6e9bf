//! Full-screen render features and the pass that executes them.

pub use self::camera_projector::{CameraProjectorFeature, ProjectorSettings};
pub use self::effect_descriptor::EffectDescriptor;
pub use self::full_screen_effect::FullScreenEffect;
pub(crate) use self::full_screen_effect::OptionalEffect;
pub use self::full_screen_pass::{CopyBack, FullScreenPass};
pub use self::kuwahara::{KuwaharaFeature, KuwaharaSettings};
pub use self::oil_paint::{OilPaintFeature, OilPaintSettings, PaintToggles};
pub use self::render_feature::{PassOutcome, RenderFeature, RenderPass};

pub mod camera_projector;
mod effect_descriptor;
mod full_screen_effect;
mod full_screen_pass;
pub mod kuwahara;
pub mod oil_paint;
mod render_feature;
