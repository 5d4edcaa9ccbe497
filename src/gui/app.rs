use eframe::egui;
use crate::core::ExtractorConfig;
use crate::gui::controller::{Notice, PlaybackController, PreviewUpdate, StatusTone};

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

pub struct FrameExtractorApp {
    pub controller: PlaybackController,
    preview_texture: Option<egui::TextureHandle>,
    preview_size: egui::Vec2,
}

impl FrameExtractorApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: ExtractorConfig) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        let preview_size = egui::vec2(config.preview_width as f32, config.preview_height as f32);
        Self {
            controller: PlaybackController::new(config).with_repaint(cc.egui_ctx.clone()),
            preview_texture: None,
            preview_size,
        }
    }

    fn pick_video_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_title("Select video file")
            .add_filter("Video files", &VIDEO_EXTENSIONS)
            .pick_file()
        else {
            return;
        };

        log::info!("Selected {}", path.display());
        self.controller.select_file(&path);
    }

    fn apply_preview_update(&mut self, ctx: &egui::Context) {
        match self.controller.take_preview_update() {
            Some(PreviewUpdate::Frame(frame)) => {
                let image = egui::ColorImage::from_rgba_unmultiplied(
                    [frame.width as usize, frame.height as usize],
                    &frame.rgba,
                );
                match &mut self.preview_texture {
                    Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                    None => {
                        self.preview_texture =
                            Some(ctx.load_texture("preview_frame", image, egui::TextureOptions::LINEAR));
                    }
                }
            }
            Some(PreviewUpdate::Cleared) => self.preview_texture = None,
            None => {}
        }
    }

    fn show_preview(&self, ui: &mut egui::Ui) {
        ui.label("Video preview");
        egui::Frame::group(ui.style()).show(ui, |ui| match &self.preview_texture {
            Some(texture) => {
                ui.add(egui::Image::new(texture).fit_to_exact_size(self.preview_size));
            }
            None => {
                let (rect, _) = ui.allocate_exact_size(self.preview_size, egui::Sense::hover());
                ui.painter().rect_filled(rect, 0.0, egui::Color32::WHITE);
            }
        });
    }

    fn show_notices(&mut self) {
        while let Some(notice) = self.controller.take_notice() {
            let dialog = match notice {
                Notice::Completed { frames, output_dir, stopped_early } => {
                    let headline = if stopped_early { "Extraction stopped." } else { "Frames extracted successfully!" };
                    rfd::MessageDialog::new()
                        .set_level(rfd::MessageLevel::Info)
                        .set_title("Done")
                        .set_description(format!(
                            "{}\n{} frames saved to {}",
                            headline,
                            frames,
                            output_dir.display()
                        ))
                }
                Notice::Error { title, message } => rfd::MessageDialog::new()
                    .set_level(rfd::MessageLevel::Error)
                    .set_title(title)
                    .set_description(message),
            };
            let _ = dialog.set_buttons(rfd::MessageButtons::Ok).show();
        }
    }
}

impl eframe::App for FrameExtractorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.controller.poll();
        self.apply_preview_update(ctx);

        let controls = self.controller.controls();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered_justified(|ui| {
                let select = egui::Button::new("Select video file").min_size(egui::vec2(0.0, 32.0));
                if ui.add_enabled(controls.select_enabled, select).clicked() {
                    self.pick_video_file();
                }
            });

            ui.add_space(10.0);
            ui.vertical_centered(|ui| self.show_preview(ui));
            ui.add_space(10.0);

            ui.columns(2, |columns| {
                let pause = egui::Button::new(controls.pause_label).min_size(egui::vec2(columns[0].available_width(), 28.0));
                if columns[0].add_enabled(controls.pause_enabled, pause).clicked() {
                    self.controller.toggle_pause();
                }
                let stop = egui::Button::new("Stop").min_size(egui::vec2(columns[1].available_width(), 28.0));
                if columns[1].add_enabled(controls.stop_enabled, stop).clicked() {
                    self.controller.stop();
                }
            });

            ui.add_space(10.0);
            let progress = self.controller.progress();
            ui.add(egui::ProgressBar::new(progress.fraction()).text(progress.text()));

            ui.add_space(5.0);
            let (status, tone) = self.controller.status();
            let color = match tone {
                StatusTone::Info => egui::Color32::from_rgb(30, 90, 200),
                StatusTone::Success => egui::Color32::from_rgb(40, 150, 60),
                StatusTone::Error => egui::Color32::from_rgb(200, 40, 40),
            };
            ui.vertical_centered(|ui| ui.colored_label(color, status));

            if let Some(summary) = self.controller.last_summary() {
                ui.vertical_centered(|ui| {
                    ui.small(format!(
                        "Last run: {} -> {}",
                        summary.video_path.file_name().unwrap_or_default().to_string_lossy(),
                        summary.output_dir.display()
                    ));
                });
            }
        });

        self.show_notices();

        if self.controller.state().is_active() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
