//! Documentation preview window

use eframe::egui::{self, FontId, RichText};

use crate::app::TempoApp;
use crate::core::config::{MAX_PREVIEW_SCALE, MIN_PREVIEW_SCALE};
use crate::ui::field_view::{self, FieldAction};

/// Preview of the selected project as it will read when exported
pub struct PreviewWindow;

impl PreviewWindow {
    /// Show the preview window when open
    pub fn show(ctx: &egui::Context, app: &mut TempoApp) {
        if !app.preview_visible {
            return;
        }

        let mut open = true;
        let mut zoom = 0;
        let mut export = false;
        let mut action = None;

        egui::Window::new("Documentation Preview")
            .open(&mut open)
            .default_size([900.0, 700.0])
            .vscroll(false)
            .show(ctx, |ui| {
                let scale = app.config.ui.preview_scale;

                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(scale > MIN_PREVIEW_SCALE, egui::Button::new("-"))
                        .clicked()
                    {
                        zoom = -1;
                    }
                    ui.label(format!("{}%", (scale * 100.0).round()));
                    if ui
                        .add_enabled(scale < MAX_PREVIEW_SCALE, egui::Button::new("+"))
                        .clicked()
                    {
                        zoom = 1;
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        export = ui.button("\u{2B07} Export HTML").clicked();
                    });
                });
                ui.separator();

                egui::ScrollArea::both()
                    .id_salt("preview_scroll")
                    .show(ui, |ui| match app.workspace.selected_project() {
                        Some(project) => {
                            ui.label(
                                RichText::new(&project.name)
                                    .font(FontId::proportional(30.0 * scale))
                                    .strong(),
                            );
                            ui.add_space(24.0 * scale);

                            for (index, step) in project.steps.iter().enumerate() {
                                ui.push_id(&step.id, |ui| {
                                    for field in &step.fields {
                                        ui.push_id(&field.id, |ui| {
                                            if let Some(a) = field_view::render_field(
                                                ui,
                                                &field.kind,
                                                scale,
                                                &mut app.media,
                                            ) {
                                                action = Some(a);
                                            }
                                        });
                                    }
                                });
                                if index + 1 < project.steps.len() {
                                    ui.add_space(24.0 * scale);
                                }
                            }
                        }
                        None => Self::show_empty(ui),
                    });
            });

        if !open {
            app.preview_visible = false;
        }
        if zoom != 0 {
            app.config.ui.zoom_preview(zoom);
        }
        if export {
            app.export_preview();
        }
        if let Some(FieldAction::OpenUrl(url)) = action {
            app.open_url(&url);
        }
    }

    /// Show empty state
    fn show_empty(ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(50.0);
            ui.label("No project selected");
            ui.label("Select a project to see the preview");
        });
    }
}
