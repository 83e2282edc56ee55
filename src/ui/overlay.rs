use crate::scene::camera::{MAX_DISTANCE, MIN_DISTANCE, OrbitCamera};
use std::f32::consts::{FRAC_PI_2, PI};

/// Toggle flags exposed through the debug overlay.
#[derive(Debug, Clone, Copy)]
pub struct OverlayState {
    pub show_axis: bool,
    pub show_bounds: bool,
    pub wireframe: bool,
}

/// Renders the debug window: frame stats, camera pose bindings, and scene
/// toggles. Returns true when a screenshot was requested this frame.
pub fn debug_window(
    ctx: &egui::Context,
    camera: &mut OrbitCamera,
    state: &mut OverlayState,
    frame_ms: f32,
) -> bool {
    let mut screenshot = false;

    egui::Window::new("Debug")
        .resizable(false)
        .default_width(240.0)
        .show(ctx, |ui| {
            let fps = if frame_ms > 0.0 { 1000.0 / frame_ms } else { 0.0 };
            ui.label(format!("{frame_ms:.3} ms/frame ({fps:.1} FPS)"));
            ui.separator();

            ui.add(egui::Slider::new(&mut camera.pitch, -FRAC_PI_2..=FRAC_PI_2).text("Pitch"));
            ui.add(egui::Slider::new(&mut camera.yaw, -PI..=PI).text("Yaw"));
            ui.add(
                egui::Slider::new(&mut camera.distance, MIN_DISTANCE..=MAX_DISTANCE)
                    .text("Distance"),
            );
            ui.separator();

            ui.checkbox(&mut state.show_axis, "Show axis");
            ui.checkbox(&mut state.show_bounds, "Show bounding box");
            ui.checkbox(&mut state.wireframe, "Wireframe");
            ui.separator();

            if ui.button("Save screenshot").clicked() {
                screenshot = true;
            }
        });

    // Slider edits write the pose fields directly; re-establish invariants.
    camera.clamp_state();
    screenshot
}
