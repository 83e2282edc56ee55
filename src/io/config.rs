use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_title")]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// Drag sensitivity in degrees of rotation per pixel.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,

    // Initial pose.
    #[serde(default)]
    pub pitch: f32,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default = "default_distance")]
    pub distance: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    /// OBJ model path; the built-in quad is shown when absent or unloadable.
    #[serde(default)]
    pub model: Option<String>,
    /// Texture image path; a generated checkerboard is used when absent.
    #[serde(default)]
    pub texture: Option<String>,

    #[serde(default = "default_true")]
    pub show_axis: bool,
    #[serde(default)]
    pub show_bounds: bool,
    #[serde(default)]
    pub wireframe: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            fov_degrees: default_fov(),
            near: default_near(),
            far: default_far(),
            pitch: 0.0,
            yaw: 0.0,
            distance: default_distance(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            model: None,
            texture: None,
            show_axis: default_true(),
            show_bounds: false,
            wireframe: false,
        }
    }
}

fn default_width() -> u32 {
    1024
}
fn default_height() -> u32 {
    768
}
fn default_title() -> String {
    "orbitview".to_string()
}
fn default_sensitivity() -> f32 {
    1.0
}
fn default_fov() -> f32 {
    60.0
}
fn default_near() -> f32 {
    0.1
}
fn default_far() -> f32 {
    100.0
}
fn default_distance() -> f32 {
    5.0
}
fn default_true() -> bool {
    true
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config '{}': {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config '{}': {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 768);
        assert_eq!(config.camera.distance, 5.0);
        assert!(config.scene.show_axis);
        assert!(!config.scene.wireframe);
        assert!(config.scene.model.is_none());
    }

    #[test]
    fn partial_config_overrides_and_defaults_mix() {
        let config: Config = toml::from_str(
            r#"
            [window]
            width = 640

            [camera]
            sensitivity = 0.5
            distance = 12.0

            [scene]
            model = "res/teapot.obj"
            show_bounds = true
            "#,
        )
        .unwrap();
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 768);
        assert_eq!(config.camera.sensitivity, 0.5);
        assert_eq!(config.camera.distance, 12.0);
        assert_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.scene.model.as_deref(), Some("res/teapot.obj"));
        assert!(config.scene.show_bounds);
    }
}
