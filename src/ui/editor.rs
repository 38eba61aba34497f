//! Slide editor panel

use eframe::egui::{self, Color32, FontId, RichText};

use crate::app::TempoApp;
use crate::core::config::AppConfig;
use crate::core::model::{FieldKind, Project, Size, Step, StepField};
use crate::ui::field_view::{self, FieldAction, MediaCache};

/// Edit requested while the editor was drawn, applied afterwards
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    RenameProject(String),
    AddStep,
    DeleteStep(usize),
    MoveStep { from: usize, to: usize },
    AddText(usize),
    SetContent {
        step: usize,
        field: usize,
        content: String,
    },
    SetSize {
        step: usize,
        field: usize,
        size: Size,
    },
    DeleteField {
        step: usize,
        field_id: String,
    },
    ToggleEmbed {
        step: usize,
        field: usize,
    },
    /// Pick a local file for the step
    EncodeMedia(usize),
    /// Prompt for a link for the step
    EmbedMedia(usize),
    OpenUrl(String),
}

/// Drag payload carrying the index of the slide being moved
struct DraggedStep(usize);

/// Slide editor panel
pub struct EditorPanel;

impl EditorPanel {
    /// Show the editor panel
    pub fn show(ui: &mut egui::Ui, app: &mut TempoApp) {
        let Some(project) = app.workspace.selected_project() else {
            Self::show_welcome(ui);
            return;
        };

        let project_id = project.id.clone();
        let scroll_to = app.scroll_to_step.take();
        let mut actions = Vec::new();
        let mut open_preview = false;

        egui::ScrollArea::vertical()
            .id_salt("editor_scroll")
            .show(ui, |ui| {
                open_preview = Self::show_header(ui, project, &mut actions);
                ui.add_space(12.0);

                for (index, step) in project.steps.iter().enumerate() {
                    ui.push_id(&step.id, |ui| {
                        Self::show_step(
                            ui,
                            StepContext {
                                index,
                                count: project.steps.len(),
                                config: &app.config,
                                scroll_to: scroll_to.as_deref(),
                            },
                            step,
                            &mut app.media,
                            &mut actions,
                        );
                    });
                    ui.add_space(12.0);
                }

                if ui.button("+ Add Slide").clicked() {
                    actions.push(EditorAction::AddStep);
                }
                ui.add_space(24.0);
            });

        if open_preview {
            app.preview_visible = true;
        }
        for action in actions {
            app.apply_edit(&project_id, action);
        }
    }

    /// Project name and toolbar; returns true when the preview was requested
    fn show_header(ui: &mut egui::Ui, project: &Project, actions: &mut Vec<EditorAction>) -> bool {
        let mut open_preview = false;
        ui.horizontal(|ui| {
            let mut name = project.name.clone();
            let response = ui.add(
                egui::TextEdit::singleline(&mut name)
                    .id_salt(("project_name", &project.id))
                    .font(FontId::proportional(24.0))
                    .hint_text("Project name")
                    .desired_width(ui.available_width() - 100.0),
            );
            if response.changed() {
                actions.push(EditorAction::RenameProject(name));
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                open_preview = ui.button("\u{1F441} Preview").clicked();
            });
        });
        open_preview
    }

    /// Show one slide as a card
    fn show_step(
        ui: &mut egui::Ui,
        slide: StepContext<'_>,
        step: &Step,
        media: &mut MediaCache,
        actions: &mut Vec<EditorAction>,
    ) {
        let index = slide.index;
        let frame = egui::Frame::group(ui.style()).inner_margin(egui::Margin::same(12));

        let (inner, dropped) = ui.dnd_drop_zone::<DraggedStep, _>(frame, |ui| {
            ui.set_width(ui.available_width());

            ui.horizontal(|ui| {
                ui.dnd_drag_source(egui::Id::new(("step_drag", &step.id)), DraggedStep(index), |ui| {
                    ui.label(RichText::new("\u{2630}").font(FontId::proportional(16.0)))
                        .on_hover_text("Drag to reorder");
                });
                ui.strong(format!("Slide {}", index + 1));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("\u{1F5D1}").on_hover_text("Delete slide").clicked() {
                        actions.push(EditorAction::DeleteStep(index));
                    }
                    if ui
                        .add_enabled(index + 1 < slide.count, egui::Button::new("\u{2B07}").small())
                        .on_hover_text("Move down")
                        .clicked()
                    {
                        actions.push(EditorAction::MoveStep {
                            from: index,
                            to: index + 1,
                        });
                    }
                    if ui
                        .add_enabled(index > 0, egui::Button::new("\u{2B06}").small())
                        .on_hover_text("Move up")
                        .clicked()
                    {
                        actions.push(EditorAction::MoveStep {
                            from: index,
                            to: index - 1,
                        });
                    }
                });
            });
            ui.separator();

            for (field_index, field) in step.fields.iter().enumerate() {
                ui.push_id(&field.id, |ui| {
                    Self::show_field(ui, index, field_index, field, slide.config, media, actions);
                });
                ui.add_space(6.0);
            }

            ui.horizontal(|ui| {
                if ui.button("+ Add Text").clicked() {
                    actions.push(EditorAction::AddText(index));
                }
                if ui.button("\u{1F4CE} Encode Media").on_hover_text("Embed a local file").clicked() {
                    actions.push(EditorAction::EncodeMedia(index));
                }
                if ui.button("\u{1F517} Embed Media").on_hover_text("Embed a link").clicked() {
                    actions.push(EditorAction::EmbedMedia(index));
                }
            });
        });

        if let Some(dragged) = dropped {
            if dragged.0 != index {
                actions.push(EditorAction::MoveStep {
                    from: dragged.0,
                    to: index,
                });
            }
        }

        if slide.scroll_to == Some(step.id.as_str()) {
            inner.response.scroll_to_me(Some(egui::Align::TOP));
        }
    }

    /// Show the editor for one field
    fn show_field(
        ui: &mut egui::Ui,
        step: usize,
        field_index: usize,
        field: &StepField,
        config: &AppConfig,
        media: &mut MediaCache,
        actions: &mut Vec<EditorAction>,
    ) {
        ui.horizontal(|ui| {
            ui.label(
                RichText::new(field.kind.type_name())
                    .small()
                    .color(Color32::GRAY),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("\u{2715}").on_hover_text("Remove").clicked() {
                    actions.push(EditorAction::DeleteField {
                        step,
                        field_id: field.id.clone(),
                    });
                }
                let toggle = match field.kind {
                    FieldKind::Iframe { .. } => Some("Show as link"),
                    FieldKind::LinkPreview { .. } => Some("Show embedded"),
                    _ => None,
                };
                if let Some(label) = toggle {
                    if ui.small_button(label).clicked() {
                        actions.push(EditorAction::ToggleEmbed {
                            step,
                            field: field_index,
                        });
                    }
                }
            });
        });

        let set_content = |content: String| EditorAction::SetContent {
            step,
            field: field_index,
            content,
        };

        match &field.kind {
            FieldKind::Title { content } => {
                let mut text = content.clone();
                let response = ui.add(
                    egui::TextEdit::singleline(&mut text)
                        .font(FontId::proportional(20.0))
                        .hint_text("Slide title")
                        .desired_width(f32::INFINITY),
                );
                if response.changed() {
                    actions.push(set_content(text));
                }
            }
            FieldKind::Text { content } => {
                let mut text = content.clone();
                let response = ui.add(
                    egui::TextEdit::multiline(&mut text)
                        .hint_text("Write something...")
                        .desired_rows(3)
                        .desired_width(f32::INFINITY),
                );
                if response.changed() {
                    actions.push(set_content(text));
                }
            }
            kind => {
                if let Some(FieldAction::OpenUrl(url)) =
                    field_view::render_field(ui, kind, 1.0, media)
                {
                    actions.push(EditorAction::OpenUrl(url));
                }

                let content = kind.content();
                if !content.starts_with("data:") {
                    let mut url = content.to_string();
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut url)
                            .hint_text("https://")
                            .desired_width(f32::INFINITY),
                    );
                    if response.changed() {
                        actions.push(set_content(url));
                    }
                }

                if config.editor.show_size_controls {
                    if let Some(size) = kind.size() {
                        if let Some(size) = Self::size_controls(ui, size) {
                            actions.push(EditorAction::SetSize {
                                step,
                                field: field_index,
                                size,
                            });
                        }
                    }
                }
            }
        }
    }

    /// Width/height inputs; returns the new size when either changed
    fn size_controls(ui: &mut egui::Ui, size: Size) -> Option<Size> {
        let mut width = size.width;
        let mut height = size.height;
        let changed = ui
            .horizontal(|ui| {
                ui.label("Width");
                let w = ui.add(
                    egui::DragValue::new(&mut width)
                        .range(1.0..=4000.0)
                        .suffix(" px"),
                );
                ui.label("Height");
                let h = ui.add(
                    egui::DragValue::new(&mut height)
                        .range(1.0..=4000.0)
                        .suffix(" px"),
                );
                w.changed() || h.changed()
            })
            .inner;
        changed.then(|| Size::new(width, height))
    }

    /// Prompt for a link to embed
    pub fn show_embed_dialog(ctx: &egui::Context, app: &mut TempoApp) {
        let Some(dialog) = app.embed_dialog.as_mut() else {
            return;
        };

        let mut submit = false;
        let mut cancel = false;
        egui::Window::new("Embed Media")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label("Paste a link to an image, video, audio file, PDF or web page.");
                ui.add_space(4.0);
                let response = ui.add(
                    egui::TextEdit::singleline(&mut dialog.url)
                        .hint_text("https://")
                        .desired_width(360.0),
                );
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                }
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    cancel = ui.button("Cancel").clicked();
                    if ui.button("Embed").clicked() {
                        submit = true;
                    }
                });
            });

        if submit {
            if let Some(dialog) = app.embed_dialog.take() {
                app.embed_url(dialog);
            }
        } else if cancel {
            app.embed_dialog = None;
        }
    }

    /// Show welcome screen when no project is selected
    fn show_welcome(ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(100.0);

            ui.heading("Welcome to Tempo Docs");
            ui.add_space(20.0);

            ui.label("Create a new project or import an exported one to get started.");
            ui.add_space(10.0);

            ui.label("Keyboard shortcuts:");
            ui.label("  Ctrl+N - New project");
            ui.label("  Ctrl+E - Export project");
            ui.label("  Ctrl+B - Toggle sidebar");
        });
    }
}

/// Per-slide rendering context
struct StepContext<'a> {
    index: usize,
    count: usize,
    config: &'a AppConfig,
    scroll_to: Option<&'a str>,
}
