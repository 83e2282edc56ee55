use crate::io::config::Config;
use crate::io::image::PixelBuffer;
use crate::scene::SceneError;
use crate::scene::axis::Axis;
use crate::scene::camera::OrbitCamera;
use crate::scene::quad::TestQuad;
use crate::scene::teapot::Teapot;
use crate::ui::input::CameraController;
use crate::ui::overlay::{self, OverlayState};
use glow::HasContext;
use log::{error, info, warn};
use nalgebra::{Matrix4, Vector4};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Per-frame draw parameters handed from the UI thread state into the paint
/// callback.
#[derive(Clone)]
struct FrameParams {
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    show_axis: bool,
    show_bounds: bool,
    wireframe: bool,
    screenshot: Option<PathBuf>,
}

/// Owns every GL-resident scene object and issues the frame's draws in a
/// fixed order: model first, gizmos on top.
struct SceneRenderer {
    axis: Option<Axis>,
    quad: Option<TestQuad>,
    teapot: Option<Teapot>,
}

impl SceneRenderer {
    fn create(gl: &glow::Context, config: &Config) -> Result<Self, SceneError> {
        let texture_image = match &config.scene.texture {
            Some(path) => match PixelBuffer::load(path) {
                Ok(image) => Some(image),
                Err(e) => {
                    warn!("{e}; falling back to a generated checkerboard");
                    None
                }
            },
            None => None,
        };

        let image = texture_image.unwrap_or_else(|| {
            PixelBuffer::checkerboard(
                8,
                8,
                Vector4::new(0.85, 0.85, 0.85, 1.0),
                Vector4::new(0.25, 0.25, 0.25, 1.0),
            )
        });

        // Only a model decode failure downgrades to the quad; shader or GL
        // failures stay fatal.
        let teapot = match &config.scene.model {
            Some(path) => match Teapot::create(gl, path, Some(&image)) {
                Ok(teapot) => Some(teapot),
                Err(SceneError::Obj(e)) => {
                    warn!("{e}; showing the test quad instead");
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        let quad = if teapot.is_none() {
            Some(TestQuad::create(gl, &image)?)
        } else {
            None
        };

        Ok(Self {
            axis: Some(Axis::create(gl)?),
            quad,
            teapot,
        })
    }

    fn draw_frame(
        &mut self,
        gl: &glow::Context,
        params: &FrameParams,
        viewport: (i32, i32, i32, i32),
    ) -> Result<(), SceneError> {
        unsafe {
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);
            gl.clear(glow::DEPTH_BUFFER_BIT);
        }

        if let Some(teapot) = &mut self.teapot {
            teapot.set_wireframe(params.wireframe);
            teapot.draw(gl, &params.view, &params.projection, params.show_bounds)?;
        } else if let Some(quad) = &mut self.quad {
            unsafe {
                gl.polygon_mode(
                    glow::FRONT_AND_BACK,
                    if params.wireframe { glow::LINE } else { glow::FILL },
                );
            }
            quad.draw(gl, &params.view, &params.projection)?;
        }

        if params.show_axis
            && let Some(axis) = &mut self.axis
        {
            axis.draw(gl, &params.view, &params.projection)?;
        }

        if let Some(path) = &params.screenshot {
            let (x, y, width, height) = viewport;
            let shot = PixelBuffer::read_framebuffer(gl, x, y, width as u32, height as u32);
            shot.save(path);
        }

        // Leave fill mode behind for the overlay pass.
        unsafe { gl.polygon_mode(glow::FRONT_AND_BACK, glow::FILL) };
        Ok(())
    }

    fn destroy(&mut self, gl: &glow::Context) {
        if let Some(axis) = self.axis.take() {
            axis.destroy(gl);
        }
        if let Some(quad) = self.quad.take() {
            quad.destroy(gl);
        }
        if let Some(teapot) = self.teapot.take() {
            teapot.destroy(gl);
        }
    }
}

/// The interactive viewer: owns the camera, input controller, overlay state,
/// and the GL scene, and drives one draw per UI frame.
pub struct ViewerApp {
    scene: Arc<Mutex<SceneRenderer>>,
    camera: OrbitCamera,
    controller: CameraController,
    overlay: OverlayState,
    config_path: Option<PathBuf>,
    last_frame: Instant,
    frame_ms: f32,
}

impl ViewerApp {
    pub fn create(
        cc: &eframe::CreationContext<'_>,
        config: Config,
        config_path: Option<PathBuf>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let gl = cc
            .gl
            .clone()
            .ok_or("eframe was started without a glow context")?;

        let scene = SceneRenderer::create(&gl, &config)?;

        Ok(Self {
            scene: Arc::new(Mutex::new(scene)),
            camera: OrbitCamera::from_config(&config.camera),
            controller: CameraController::new(config.camera.sensitivity),
            overlay: OverlayState {
                show_axis: config.scene.show_axis,
                show_bounds: config.scene.show_bounds,
                wireframe: config.scene.wireframe,
            },
            config_path,
            last_frame: Instant::now(),
            frame_ms: 0.0,
        })
    }

    /// Re-reads the config file and re-applies the parts that can change at
    /// runtime (camera sensitivity and overlay toggles).
    fn reload_config(&mut self) {
        let Some(path) = &self.config_path else {
            return;
        };
        info!("Reloading configuration...");
        match Config::load(path) {
            Ok(config) => {
                self.controller.sensitivity = config.camera.sensitivity;
                self.overlay.show_axis = config.scene.show_axis;
                self.overlay.show_bounds = config.scene.show_bounds;
                self.overlay.wireframe = config.scene.wireframe;
                info!("Hot reload successful!");
            }
            Err(e) => warn!("Failed to reload config: {e}"),
        }
    }

    fn screenshot_path() -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        PathBuf::from(format!("screenshot_{millis}.png"))
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.frame_ms = (now - self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;

        if ctx.input(|i| i.key_pressed(egui::Key::R)) {
            self.reload_config();
        }

        let screenshot =
            overlay::debug_window(ctx, &mut self.camera, &mut self.overlay, self.frame_ms);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let response = ui.interact(
                    rect,
                    ui.id().with("viewport"),
                    egui::Sense::click_and_drag(),
                );

                // Adapt egui's pointer state to the input controller's
                // event contract.
                self.controller
                    .pointer_button(response.dragged_by(egui::PointerButton::Primary));
                if let Some(pos) = response
                    .interact_pointer_pos()
                    .or_else(|| response.hover_pos())
                {
                    self.controller.pointer_moved(&mut self.camera, pos.x, pos.y);
                }
                if response.hovered() {
                    let scroll = ui.input(|i| i.raw_scroll_delta.y);
                    if scroll != 0.0 {
                        // Points to wheel notches.
                        self.controller.scroll(&mut self.camera, scroll / 50.0);
                    }
                }

                let params = FrameParams {
                    view: self.camera.view_matrix(),
                    projection: self.camera.projection_matrix(rect.width(), rect.height()),
                    show_axis: self.overlay.show_axis,
                    show_bounds: self.overlay.show_bounds,
                    wireframe: self.overlay.wireframe,
                    screenshot: screenshot.then(Self::screenshot_path),
                };

                let scene = self.scene.clone();
                let callback = egui::PaintCallback {
                    rect,
                    callback: Arc::new(egui_glow::CallbackFn::new(move |info, painter| {
                        let viewport = info.viewport_in_pixels();
                        let Ok(mut scene) = scene.lock() else {
                            return;
                        };
                        if let Err(e) = scene.draw_frame(
                            painter.gl(),
                            &params,
                            (
                                viewport.left_px,
                                viewport.from_bottom_px,
                                viewport.width_px,
                                viewport.height_px,
                            ),
                        ) {
                            error!("Frame draw failed: {e}");
                        }
                    })),
                };
                ui.painter().add(callback);
            });

        // Keep animating even without input events.
        ctx.request_repaint();
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        // Grey-blueish backdrop behind the scene.
        [0.3, 0.3, 0.4, 1.0]
    }

    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        if let Some(gl) = gl
            && let Ok(mut scene) = self.scene.lock()
        {
            scene.destroy(gl);
        }
    }
}
