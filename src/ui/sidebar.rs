//! Project list sidebar

use eframe::egui::{self, Color32, RichText};

use crate::app::TempoApp;

/// What the user asked for while the list was drawn
enum SidebarAction {
    New,
    Import,
    Select(String),
    ShowStep { project: String, step: String },
    Export(String),
    Delete(String),
}

/// Sidebar with search and the project list
pub struct ProjectSidebar;

impl ProjectSidebar {
    /// Show the sidebar
    pub fn show(ui: &mut egui::Ui, app: &mut TempoApp) {
        let mut action = None;

        ui.vertical(|ui| {
            // Header
            ui.horizontal(|ui| {
                ui.heading("Projects");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Import").on_hover_text("Import an exported HTML file").clicked() {
                        action = Some(SidebarAction::Import);
                    }
                    if ui.button("+ New").on_hover_text("New project (Ctrl+N)").clicked() {
                        action = Some(SidebarAction::New);
                    }
                });
            });

            ui.add(
                egui::TextEdit::singleline(&mut app.search)
                    .hint_text("Search projects...")
                    .desired_width(f32::INFINITY),
            );
            ui.separator();

            egui::ScrollArea::vertical()
                .id_salt("project_list_scroll")
                .show(ui, |ui| {
                    let projects = app.workspace.filter(&app.search);
                    if projects.is_empty() {
                        ui.label(RichText::new("No projects found").italics());
                    }

                    let selected = app.workspace.selected_id();
                    for project in projects {
                        let is_selected = selected == Some(project.id.as_str());
                        let id = ui.make_persistent_id(("project", &project.id));

                        egui::collapsing_header::CollapsingState::load_with_default_open(
                            ui.ctx(),
                            id,
                            false,
                        )
                        .show_header(ui, |ui| {
                            let slides = project.steps.len();
                            let label = format!(
                                "{}  ({} {})",
                                project.name,
                                slides,
                                if slides == 1 { "slide" } else { "slides" }
                            );
                            if ui.selectable_label(is_selected, label).clicked() {
                                action = Some(SidebarAction::Select(project.id.clone()));
                            }
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.small_button("\u{1F5D1}").on_hover_text("Delete").clicked() {
                                        action = Some(SidebarAction::Delete(project.id.clone()));
                                    }
                                    if ui.small_button("\u{2B07}").on_hover_text("Export").clicked() {
                                        action = Some(SidebarAction::Export(project.id.clone()));
                                    }
                                },
                            );
                        })
                        .body(|ui| {
                            for (index, step) in project.steps.iter().enumerate() {
                                let text = format!("{}. {}", index + 1, step.label());
                                if ui
                                    .selectable_label(false, RichText::new(text).color(Color32::GRAY))
                                    .clicked()
                                {
                                    action = Some(SidebarAction::ShowStep {
                                        project: project.id.clone(),
                                        step: step.id.clone(),
                                    });
                                }
                            }
                        });
                    }
                });
        });

        match action {
            Some(SidebarAction::New) => app.new_project(),
            Some(SidebarAction::Import) => app.import_dialog(),
            Some(SidebarAction::Select(id)) => app.select_project(&id),
            Some(SidebarAction::ShowStep { project, step }) => {
                app.select_project(&project);
                app.scroll_to_step = Some(step);
            }
            Some(SidebarAction::Export(id)) => app.export_project(&id),
            Some(SidebarAction::Delete(id)) => app.request_delete(&id),
            None => {}
        }
    }

    /// Confirmation window for a pending delete
    pub fn show_delete_dialog(ctx: &egui::Context, app: &mut TempoApp) {
        let Some(id) = app.pending_delete.clone() else {
            return;
        };
        let name = match app.workspace.project(&id) {
            Some(project) => project.name.clone(),
            None => {
                app.pending_delete = None;
                return;
            }
        };

        let mut confirmed = false;
        let mut cancelled = false;
        egui::Window::new("Delete Project")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!(
                    "Delete \"{name}\"? This removes the project and all of its slides."
                ));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    cancelled = ui.button("Cancel").clicked();
                    confirmed = ui
                        .button(RichText::new("Delete").color(Color32::from_rgb(220, 80, 80)))
                        .clicked();
                });
            });

        if confirmed {
            app.pending_delete = None;
            app.delete_project(&id);
        } else if cancelled {
            app.pending_delete = None;
        }
    }
}
