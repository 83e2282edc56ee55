use clap::Parser;
use log::{info, warn};
use orbitview::app::ViewerApp;
use orbitview::io::config::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "orbitview", version, about = "Interactive textured-mesh viewer")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "orbitview.toml")]
    config: PathBuf,

    /// OBJ model to load (overrides the config).
    #[arg(long)]
    model: Option<String>,

    /// Texture image to apply (overrides the config).
    #[arg(long)]
    texture: Option<String>,

    /// Window width in logical pixels (overrides the config).
    #[arg(long)]
    width: Option<u32>,

    /// Window height in logical pixels (overrides the config).
    #[arg(long)]
    height: Option<u32>,
}

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();

    let mut config = if args.config.exists() {
        match Config::load(&args.config) {
            Ok(config) => config,
            Err(e) => {
                warn!("{e}; using default settings");
                Config::default()
            }
        }
    } else {
        info!(
            "No config file at '{}'; using default settings",
            args.config.display()
        );
        Config::default()
    };

    if let Some(model) = args.model {
        config.scene.model = Some(model);
    }
    if let Some(texture) = args.texture {
        config.scene.texture = Some(texture);
    }
    if let Some(width) = args.width {
        config.window.width = width;
    }
    if let Some(height) = args.height {
        config.window.height = height;
    }

    let title = config.window.title.clone();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(&title)
            .with_inner_size([config.window.width as f32, config.window.height as f32]),
        renderer: eframe::Renderer::Glow,
        depth_buffer: 24,
        multisampling: 4,
        ..Default::default()
    };

    let config_path = args.config.clone();
    eframe::run_native(
        &title,
        native_options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::create(cc, config, Some(config_path))?))),
    )
}
