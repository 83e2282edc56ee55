use crate::scene::camera::OrbitCamera;

/// Converts raw pointer/scroll events into orbit-camera updates.
///
/// The controller is windowing-agnostic: the frame driver forwards events
/// here, and only camera state is mutated (never GPU state, since input
/// handlers may run off the GL context's critical path).
pub struct CameraController {
    /// Drag sensitivity in degrees of rotation per pixel.
    pub sensitivity: f32,

    primary_down: bool,
    last_pointer: Option<(f32, f32)>,
}

impl CameraController {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            primary_down: false,
            last_pointer: None,
        }
    }

    /// Primary pointer button press/release. Other buttons are not
    /// meaningful to the viewer and should not be forwarded.
    pub fn pointer_button(&mut self, pressed: bool) {
        self.primary_down = pressed;
    }

    /// Pointer motion. While the primary button is held, the pixel delta
    /// from the previous position rotates the camera; the position is
    /// recorded as "last" regardless of button state.
    pub fn pointer_moved(&mut self, camera: &mut OrbitCamera, x: f32, y: f32) {
        if self.primary_down
            && let Some((last_x, last_y)) = self.last_pointer
        {
            let yaw_delta = ((x - last_x) * self.sensitivity).to_radians();
            let pitch_delta = ((y - last_y) * self.sensitivity).to_radians();
            camera.apply_drag(yaw_delta, pitch_delta);
        }
        self.last_pointer = Some((x, y));
    }

    /// Vertical scroll, in notches.
    pub fn scroll(&mut self, camera: &mut OrbitCamera, delta_y: f32) {
        camera.apply_scroll(delta_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::CameraConfig;
    use std::f32::consts::FRAC_PI_2;

    fn camera() -> OrbitCamera {
        OrbitCamera::from_config(&CameraConfig::default())
    }

    #[test]
    fn motion_without_button_does_not_rotate() {
        let mut cam = camera();
        let mut controller = CameraController::new(1.0);
        controller.pointer_moved(&mut cam, 10.0, 10.0);
        controller.pointer_moved(&mut cam, 200.0, 300.0);
        assert_eq!(cam.yaw, 0.0);
        assert_eq!(cam.pitch, 0.0);
    }

    #[test]
    fn drag_rotates_by_degrees_per_pixel() {
        let mut cam = camera();
        let mut controller = CameraController::new(1.0);
        controller.pointer_moved(&mut cam, 100.0, 100.0);
        controller.pointer_button(true);
        controller.pointer_moved(&mut cam, 130.0, 110.0);
        assert!((cam.yaw - 30.0f32.to_radians()).abs() < 1e-5);
        assert!((cam.pitch - 10.0f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn first_motion_after_press_produces_no_jump() {
        let mut cam = camera();
        let mut controller = CameraController::new(1.0);
        // Button pressed before any position is known: the first move only
        // seeds the delta origin.
        controller.pointer_button(true);
        controller.pointer_moved(&mut cam, 500.0, 500.0);
        assert_eq!(cam.yaw, 0.0);
        controller.pointer_moved(&mut cam, 501.0, 500.0);
        assert!(cam.yaw > 0.0);
    }

    #[test]
    fn long_drag_keeps_pitch_clamped() {
        let mut cam = camera();
        let mut controller = CameraController::new(1.0);
        controller.pointer_button(true);
        controller.pointer_moved(&mut cam, 0.0, 0.0);
        for step in 1..200 {
            controller.pointer_moved(&mut cam, 0.0, step as f32 * 10.0);
            assert!(cam.pitch >= -FRAC_PI_2 && cam.pitch <= FRAC_PI_2);
        }
        assert_eq!(cam.pitch, FRAC_PI_2);
    }
}
