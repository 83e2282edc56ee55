use crate::core::math::transform::TransformFactory;
use crate::io::config::CameraConfig;
use nalgebra::{Matrix4, Vector3};
use std::f32::consts::{FRAC_PI_2, PI};

pub const MIN_DISTANCE: f32 = 0.0;
pub const MAX_DISTANCE: f32 = 100.0;

/// Wraps a yaw angle into (-pi, pi].
///
/// This must stay a wrap rather than a clamp so continuous rotation past the
/// seam remains possible.
pub fn wrap_yaw(mut yaw: f32) -> f32 {
    while yaw > PI {
        yaw -= 2.0 * PI;
    }
    while yaw <= -PI {
        yaw += 2.0 * PI;
    }
    yaw
}

/// Clamps a pitch angle to [-pi/2, pi/2].
pub fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-FRAC_PI_2, FRAC_PI_2)
}

/// A camera orbiting the origin, parameterized by yaw, pitch, and distance.
///
/// The pose fields are public so the debug overlay can bind sliders to them
/// directly; call [`OrbitCamera::clamp_state`] after writing them.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Rotation around the X axis, kept in [-pi/2, pi/2].
    pub pitch: f32,
    /// Rotation around the Y axis, kept in (-pi, pi].
    pub yaw: f32,
    /// Distance from the pivot, kept in [0, 100].
    pub distance: f32,

    fov_y_rad: f32,
    near: f32,
    far: f32,
}

impl OrbitCamera {
    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self {
            pitch: config.pitch,
            yaw: config.yaw,
            distance: config.distance,
            fov_y_rad: config.fov_degrees.to_radians(),
            near: config.near,
            far: config.far,
        };
        camera.clamp_state();
        camera
    }

    /// Re-establishes the pose invariants after direct field writes.
    pub fn clamp_state(&mut self) {
        self.pitch = clamp_pitch(self.pitch);
        self.yaw = wrap_yaw(self.yaw);
        self.distance = self.distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Applies a pointer-drag delta already converted to radians.
    pub fn apply_drag(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.pitch = clamp_pitch(self.pitch + pitch_delta);
        self.yaw = wrap_yaw(self.yaw + yaw_delta);
    }

    /// Applies a scroll delta through a logarithmic zoom response.
    ///
    /// A NaN or infinite result (glitchy scroll events happen) keeps the
    /// previous distance.
    pub fn apply_scroll(&mut self, scroll_delta: f32) {
        let next = MAX_DISTANCE
            * ((self.distance / MAX_DISTANCE).sqrt() - scroll_delta / 20.0).powi(2);
        if next.is_finite() {
            self.distance = next.clamp(MIN_DISTANCE, MAX_DISTANCE);
        }
    }

    /// View matrix: pull back along Z, then pitch, then yaw.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        TransformFactory::translation(&Vector3::new(0.0, 0.0, -self.distance))
            * TransformFactory::rotation_x(self.pitch)
            * TransformFactory::rotation_y(self.yaw)
    }

    /// Perspective projection for the current frame's viewport size.
    pub fn projection_matrix(&self, width: f32, height: f32) -> Matrix4<f32> {
        let aspect = if height > 0.0 { width / height } else { 1.0 };
        TransformFactory::perspective(aspect, self.fov_y_rad, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> OrbitCamera {
        OrbitCamera::from_config(&CameraConfig::default())
    }

    #[test]
    fn yaw_wrap_stays_in_range_and_is_periodic() {
        for raw in [-10.0f32, -PI, -1.0, 0.0, 1.0, PI, 3.5, 100.0] {
            let wrapped = wrap_yaw(raw);
            assert!(wrapped > -PI && wrapped <= PI, "wrap_yaw({raw}) = {wrapped}");

            let mut again = raw;
            for _ in 0..5 {
                again += 2.0 * PI;
            }
            assert!((wrap_yaw(again) - wrapped).abs() < 1e-4);
        }
    }

    #[test]
    fn pitch_stays_clamped_under_any_drag_sequence() {
        let mut cam = camera();
        for delta in [5.0f32, -12.0, 0.3, -0.7, 42.0, -0.1] {
            cam.apply_drag(0.0, delta);
            assert!(cam.pitch >= -FRAC_PI_2 && cam.pitch <= FRAC_PI_2);
        }
    }

    #[test]
    fn yaw_keeps_rotating_past_the_seam() {
        let mut cam = camera();
        cam.yaw = PI - 0.05;
        cam.apply_drag(0.2, 0.0);
        // Wrapped around rather than stuck at the boundary.
        assert!(cam.yaw < 0.0);
        assert!((cam.yaw - (PI - 0.05 + 0.2 - 2.0 * PI)).abs() < 1e-5);
    }

    #[test]
    fn scroll_zoom_stays_bounded() {
        let mut cam = camera();
        for _ in 0..100 {
            cam.apply_scroll(1.0);
            assert!((MIN_DISTANCE..=MAX_DISTANCE).contains(&cam.distance));
        }
        for _ in 0..200 {
            cam.apply_scroll(-1.0);
            assert!((MIN_DISTANCE..=MAX_DISTANCE).contains(&cam.distance));
        }
    }

    #[test]
    fn scroll_zoom_moves_in_the_right_direction() {
        let mut cam = camera();
        cam.distance = 25.0;
        cam.apply_scroll(1.0);
        assert!(cam.distance < 25.0);
        cam.apply_scroll(-1.0);
        let closer = cam.distance;
        cam.apply_scroll(-1.0);
        assert!(cam.distance > closer);
    }

    #[test]
    fn degenerate_scroll_keeps_previous_distance() {
        let mut cam = camera();
        cam.distance = 42.0;
        cam.apply_scroll(f32::NAN);
        assert_eq!(cam.distance, 42.0);
        cam.apply_scroll(f32::INFINITY);
        assert_eq!(cam.distance, 42.0);
    }

    #[test]
    fn view_matrix_pulls_back_by_distance() {
        let mut cam = camera();
        cam.pitch = 0.0;
        cam.yaw = 0.0;
        cam.distance = 7.0;
        let view = cam.view_matrix();
        let eye = view.transform_point(&nalgebra::Point3::origin());
        assert!((eye.z + 7.0).abs() < 1e-6);
    }
}
