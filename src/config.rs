//! JSON settings files describing the render features of a renderer.
//!
//! ```json
//! {
//!     "features": [
//!         { "type": "camera_projector", "shader": 2, "texture": 0 },
//!         { "type": "kuwahara", "shader": 0, "radius": 4 },
//!         { "type": "oil_paint", "shader": 1, "toggles": "OIL_PAINT | CONTRAST" }
//!     ]
//! }
//! ```
//!
//! Shaders and textures are referred to by the handles the host registered them under.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;
use crate::post_processing::{
    CameraProjectorFeature, KuwaharaFeature, KuwaharaSettings, OilPaintFeature, OilPaintSettings,
    ProjectorSettings, RenderFeature,
};
use crate::renderer::FrameRenderer;
use crate::scheduler::PassScheduler;

/// Settings of one render feature, tagged with its kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureSettings {
    Kuwahara(KuwaharaSettings),
    OilPaint(OilPaintSettings),
    CameraProjector(ProjectorSettings),
}

impl FeatureSettings {
    /// Creates the feature these settings describe.
    pub fn into_feature(self) -> Box<dyn RenderFeature> {
        match self {
            FeatureSettings::Kuwahara(settings) => Box::new(KuwaharaFeature::new(settings)),
            FeatureSettings::OilPaint(settings) => Box::new(OilPaintFeature::new(settings)),
            FeatureSettings::CameraProjector(settings) => {
                Box::new(CameraProjectorFeature::new(settings))
            }
        }
    }
}

impl From<KuwaharaSettings> for FeatureSettings {
    fn from(settings: KuwaharaSettings) -> Self {
        FeatureSettings::Kuwahara(settings)
    }
}

impl From<OilPaintSettings> for FeatureSettings {
    fn from(settings: OilPaintSettings) -> Self {
        FeatureSettings::OilPaint(settings)
    }
}

impl From<ProjectorSettings> for FeatureSettings {
    fn from(settings: ProjectorSettings) -> Self {
        FeatureSettings::CameraProjector(settings)
    }
}

/// The render features of a renderer, in registration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub features: Vec<FeatureSettings>,
}

impl RendererConfig {
    /// Parses a JSON settings document.
    pub fn from_json_str(json: &str) -> Result<RendererConfig, FeatureError> {
        serde_json::from_str(json).map_err(|e| FeatureError::Config(e.to_string()))
    }

    /// Reads and parses a JSON settings file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RendererConfig, FeatureError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| FeatureError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Serializes these settings as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, FeatureError> {
        serde_json::to_string_pretty(self).map_err(|e| FeatureError::Config(e.to_string()))
    }

    /// Creates every feature and registers them in declaration order.
    pub fn build_scheduler(&self) -> PassScheduler {
        let mut scheduler = PassScheduler::new();
        for settings in &self.features {
            let _ = scheduler.register(settings.clone().into_feature());
        }
        scheduler
    }

    /// A frame renderer over [`RendererConfig::build_scheduler`].
    pub fn build_renderer(&self) -> FrameRenderer {
        FrameRenderer::with_scheduler(self.build_scheduler())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post_processing::PaintToggles;
    use crate::resource::{ShaderHandle, TextureHandle};
    use crate::scheduler::InsertionPoint;

    #[test]
    fn missing_fields_take_their_defaults() {
        let config = RendererConfig::from_json_str(
            r#"{ "features": [ { "type": "kuwahara", "shader": 3 } ] }"#,
        )
        .unwrap();

        assert_eq!(
            config.features,
            vec![FeatureSettings::Kuwahara(KuwaharaSettings {
                shader: Some(ShaderHandle(3)),
                radius: 3,
            })]
        );
    }

    #[test]
    fn toggles_and_insertion_points_are_parsed() {
        let config = RendererConfig::from_json_str(
            r#"{
                "features": [
                    { "type": "oil_paint", "shader": 1, "toggles": "OIL_PAINT | CONTRAST" },
                    {
                        "type": "camera_projector",
                        "shader": 2,
                        "texture": 5,
                        "insertion_point": "BeforeRenderingPostProcessing"
                    }
                ]
            }"#,
        )
        .unwrap();

        match &config.features[0] {
            FeatureSettings::OilPaint(settings) => {
                assert_eq!(settings.toggles, PaintToggles::OIL_PAINT | PaintToggles::CONTRAST);
                assert_eq!(settings.contrast, 1.0);
            }
            other => panic!("unexpected settings {:?}", other),
        }
        match &config.features[1] {
            FeatureSettings::CameraProjector(settings) => {
                assert_eq!(settings.texture, Some(TextureHandle(5)));
                assert_eq!(
                    settings.insertion_point,
                    InsertionPoint::BeforeRenderingPostProcessing
                );
            }
            other => panic!("unexpected settings {:?}", other),
        }
    }

    #[test]
    fn unknown_feature_kinds_are_rejected() {
        let err = RendererConfig::from_json_str(r#"{ "features": [ { "type": "bloom" } ] }"#)
            .unwrap_err();
        assert!(matches!(err, FeatureError::Config(_)));
    }

    #[test]
    fn features_are_registered_in_declaration_order() {
        let config = RendererConfig {
            features: vec![
                OilPaintSettings::new(Some(ShaderHandle(0))).into(),
                KuwaharaSettings::new(Some(ShaderHandle(1))).into(),
            ],
        };
        let scheduler = config.build_scheduler();

        let names: Vec<_> = (0..scheduler.len())
            .map(|i| scheduler.feature(crate::scheduler::PassId(i)).unwrap().name())
            .collect();
        assert_eq!(names, vec![OilPaintFeature::NAME, KuwaharaFeature::NAME]);
    }
}
