mod core;
mod gui;
mod video;

use eframe::egui;
use crate::core::ExtractorConfig;
use gui::FrameExtractorApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ExtractorConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([680.0, 600.0])
            .with_resizable(false)
            .with_title("Video Frame Extractor"),
        ..Default::default()
    };

    eframe::run_native(
        "Video Frame Extractor",
        options,
        Box::new(move |cc| Ok(Box::new(FrameExtractorApp::new(cc, config)))),
    ).map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
