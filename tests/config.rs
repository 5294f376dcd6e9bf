#![cfg(feature = "serde")]

mod common;

use canvasfx::prelude::*;

const SETTINGS: &str = r#"{
    "features": [
        { "type": "oil_paint", "shader": 0, "toggles": "OIL_PAINT | CONTRAST", "brush_size": 4.0 },
        { "type": "kuwahara", "shader": 0, "radius": 2 },
        { "type": "camera_projector", "shader": 0 },
        { "type": "kuwahara" }
    ]
}"#;

#[test]
fn settings_files_build_a_working_renderer() {
    common::init_logger();
    let path = std::env::temp_dir().join(format!("canvasfx-settings-{}.json", std::process::id()));
    std::fs::write(&path, SETTINGS).unwrap();
    let config = RendererConfig::from_path(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(config.features.len(), 4);

    let mut device = SoftwareDevice::new();
    let shader = device.register_shader(common::kuwahara);
    assert_eq!(shader, ShaderHandle(0));
    let frame = common::frame_with(&mut device, &common::random_image(21, 8, 8));

    let mut renderer = config.build_renderer();
    assert_eq!(renderer.scheduler().len(), 4);

    // The projector has no texture and the last feature no shader.
    let report = renderer.render_camera(&frame, &mut device);
    assert_eq!(report.names(), vec![OilPaintFeature::NAME, KuwaharaFeature::NAME]);
    assert_eq!(report.completed(), 2);
    assert_eq!(device.outstanding_scratch(), 0);
}

#[test]
fn settings_survive_a_json_round_trip() {
    let mut oil = OilPaintSettings::new(Some(ShaderHandle(1)));
    oil.toggles = PaintToggles::REFLECTION;
    oil.bump_map = Some(TextureHandle(3));

    let config = RendererConfig {
        features: vec![
            KuwaharaSettings::new(Some(ShaderHandle(0))).into(),
            oil.into(),
            ProjectorSettings::new(Some(ShaderHandle(2)), Some(TextureHandle(4))).into(),
        ],
    };

    let json = config.to_json().unwrap();
    assert_eq!(RendererConfig::from_json_str(&json).unwrap(), config);
}

#[test]
fn unreadable_files_are_configuration_errors() {
    let err = RendererConfig::from_path("/nonexistent/canvasfx.json").unwrap_err();
    assert!(matches!(err, FeatureError::Config(_)));
}
