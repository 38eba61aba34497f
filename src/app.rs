//! Main application state and UI coordination

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use eframe::egui;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::core::config::AppConfig;
use crate::core::media::{field_from_file, field_from_url};
use crate::core::model::{export_filename, FieldKind, Project};
use crate::core::serialization::{self, ImportedProject};
use crate::core::workspace::Workspace;
use crate::storage::{PersistenceEvent, PersistenceWriter, ProjectStore, StoreError};
use crate::ui::editor::{EditorAction, EditorPanel};
use crate::ui::field_view::MediaCache;
use crate::ui::notifications::Notifications;
use crate::ui::preview::PreviewWindow;
use crate::ui::sidebar::ProjectSidebar;

/// Everything `main` prepares before the window opens
pub struct Startup {
    pub config: AppConfig,
    pub runtime: Runtime,
    pub store: Arc<dyn ProjectStore>,
    pub stored: Result<Vec<Project>, StoreError>,
}

/// Pending "Embed Media" prompt
#[derive(Debug, Clone)]
pub struct EmbedDialog {
    pub project_id: String,
    pub step: usize,
    pub url: String,
}

/// Main application state
pub struct TempoApp {
    /// Application configuration
    pub config: AppConfig,
    /// Runtime the persistence queues run on
    runtime: Runtime,
    writer: PersistenceWriter,
    events: mpsc::UnboundedReceiver<PersistenceEvent>,
    /// Loaded projects and selection
    pub workspace: Workspace,
    pub notifications: Notifications,
    /// Decoded images registered with egui
    pub media: MediaCache,
    /// Whether sidebar is visible
    pub sidebar_visible: bool,
    /// Whether the preview window is open
    pub preview_visible: bool,
    /// Sidebar search text
    pub search: String,
    /// Project awaiting delete confirmation
    pub pending_delete: Option<String>,
    /// Whether the reset confirmation is showing
    pub confirm_reset: bool,
    pub embed_dialog: Option<EmbedDialog>,
    /// Step the editor should scroll into view next frame
    pub scroll_to_step: Option<String>,
}

impl TempoApp {
    /// Create a new application instance
    pub fn new(cc: &eframe::CreationContext<'_>, startup: Startup) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        Self::configure_theme(&cc.egui_ctx, &startup.config);

        let Startup {
            config,
            runtime,
            store,
            stored,
        } = startup;

        let mut notifications =
            Notifications::new(Duration::from_secs(config.ui.notification_secs));
        let (mut writer, events) = PersistenceWriter::new(runtime.handle().clone(), store);

        let stored = stored.unwrap_or_else(|e| {
            tracing::error!("Failed to load projects: {}", e);
            notifications.error(format!("Could not load saved projects: {e}"));
            Vec::new()
        });
        tracing::info!("Loaded {} stored projects", stored.len());

        let loaded = Workspace::from_stored(stored);
        if let Some(seed) = &loaded.seeded {
            tracing::info!("Seeding guide project");
            writer.save(seed);
        }

        Self {
            config,
            runtime,
            writer,
            events,
            workspace: loaded.workspace,
            notifications,
            media: MediaCache::default(),
            sidebar_visible: true,
            preview_visible: false,
            search: String::new(),
            pending_delete: None,
            confirm_reset: false,
            embed_dialog: None,
            scroll_to_step: None,
        }
    }

    fn configure_theme(ctx: &egui::Context, config: &AppConfig) {
        if config.ui.theme == "dark" {
            ctx.set_visuals(egui::Visuals::dark());
        } else {
            ctx.set_visuals(egui::Visuals::light());
        }
    }

    /// Create a blank project and select it
    pub fn new_project(&mut self) {
        let project = self.workspace.create_project();
        tracing::info!("Created project {}", project.id);
        self.writer.save(project);
    }

    pub fn select_project(&mut self, id: &str) {
        self.workspace.select(id);
    }

    /// Pick an exported HTML file and import it as a new project
    pub fn import_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("HTML", &["html", "htm"])
            .pick_file()
        else {
            return;
        };

        match Self::read_import(&path) {
            Ok(imported) => {
                let project = self.workspace.import_project(imported);
                tracing::info!("Imported {} as project {}", path.display(), project.id);
                self.notifications
                    .info(format!("Imported \"{}\"", project.name));
                self.writer.save(project);
            }
            Err(e) => {
                tracing::error!("Import of {} failed: {:#}", path.display(), e);
                self.notifications.error(format!("Import failed: {e:#}"));
            }
        }
    }

    fn read_import(path: &Path) -> Result<ImportedProject> {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let imported = serialization::deserialize(&html).context("Not a Tempo Docs export")?;
        Ok(imported)
    }

    /// Export a project as a self-contained HTML document
    pub fn export_project(&mut self, id: &str) {
        let Some(project) = self.workspace.project(id) else {
            return;
        };
        let html = serialization::serialize(project);
        let name = project.name.clone();
        self.save_export(&name, html);
    }

    /// Export the selected project's preview document
    pub fn export_preview(&mut self) {
        let Some(project) = self.workspace.selected_project() else {
            return;
        };
        let html = serialization::wrap_preview(&serialization::serialize_preview(project));
        let name = project.name.clone();
        self.save_export(&name, html);
    }

    fn save_export(&mut self, name: &str, html: String) {
        let mut dialog = rfd::FileDialog::new()
            .add_filter("HTML", &["html"])
            .set_file_name(export_filename(name));
        if let Some(dir) = &self.config.last_export_dir {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };

        match std::fs::write(&path, html) {
            Ok(()) => {
                tracing::info!("Exported {} to {}", name, path.display());
                self.notifications
                    .info(format!("Exported to {}", path.display()));
                self.config.add_recent_export(path);
                if let Err(e) = self.config.save() {
                    tracing::warn!("Failed to save config: {}", e);
                }
            }
            Err(e) => {
                tracing::error!("Export to {} failed: {}", path.display(), e);
                self.notifications.error(format!("Export failed: {e}"));
            }
        }
    }

    /// Delete now, or ask first when configured to
    pub fn request_delete(&mut self, id: &str) {
        if self.config.editor.confirm_deletes {
            self.pending_delete = Some(id.to_string());
        } else {
            self.delete_project(id);
        }
    }

    pub fn delete_project(&mut self, id: &str) {
        if let Some(removed) = self.workspace.delete_project(id) {
            tracing::info!("Deleted project {}", removed.id);
            self.writer.delete(&removed.id);
            self.notifications
                .info(format!("Deleted \"{}\"", removed.name));
        }
    }

    /// Wipe storage and restore the guide project
    pub fn reset(&mut self) {
        if let Err(e) = self.runtime.block_on(self.writer.clear()) {
            self.notifications.error(format!("Reset failed: {e}"));
            return;
        }
        let seed = self.workspace.reset();
        self.writer.save(seed);
        self.notifications.info("Application reset");
    }

    /// Apply an editor action to the project it came from
    pub fn apply_edit(&mut self, id: &str, action: EditorAction) {
        let changed = match action {
            EditorAction::RenameProject(name) => self.workspace.rename_project(id, &name),
            EditorAction::AddStep => self.workspace.add_step(id),
            EditorAction::DeleteStep(step) => self.workspace.delete_step(id, step),
            EditorAction::MoveStep { from, to } => self.workspace.move_step(id, from, to),
            EditorAction::AddText(step) => self.workspace.add_field(id, step, FieldKind::text("")),
            EditorAction::SetContent {
                step,
                field,
                content,
            } => self.workspace.set_field_content(id, step, field, content),
            EditorAction::SetSize { step, field, size } => {
                self.workspace.set_field_size(id, step, field, size)
            }
            EditorAction::DeleteField { step, field_id } => {
                self.workspace.delete_field(id, step, &field_id)
            }
            EditorAction::ToggleEmbed { step, field } => {
                self.workspace.toggle_embed_mode(id, step, field)
            }
            EditorAction::EncodeMedia(step) => {
                self.encode_media(id, step);
                return;
            }
            EditorAction::EmbedMedia(step) => {
                self.embed_dialog = Some(EmbedDialog {
                    project_id: id.to_string(),
                    step,
                    url: String::new(),
                });
                return;
            }
            EditorAction::OpenUrl(url) => {
                self.open_url(&url);
                return;
            }
        };

        if let Some(project) = changed {
            self.writer.save(project);
        }
    }

    /// Pick a local file and embed it into a step
    fn encode_media(&mut self, id: &str, step: usize) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter(
                "Media",
                &[
                    "png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "avif", "mp4", "m4v",
                    "webm", "ogv", "mov", "mp3", "wav", "ogg", "oga", "m4a", "flac", "pdf",
                ],
            )
            .pick_file()
        else {
            return;
        };

        match field_from_file(&path) {
            Ok(kind) => {
                if let Some(project) = self.workspace.add_field(id, step, kind) {
                    self.writer.save(project);
                }
            }
            Err(e) => {
                tracing::error!("Failed to encode {}: {}", path.display(), e);
                self.notifications.error(format!("Could not add media: {e}"));
            }
        }
    }

    /// Finish the "Embed Media" prompt
    pub fn embed_url(&mut self, dialog: EmbedDialog) {
        match field_from_url(&dialog.url) {
            Ok(kind) => {
                if let Some(project) = self.workspace.add_field(&dialog.project_id, dialog.step, kind) {
                    self.writer.save(project);
                }
            }
            Err(e) => self.notifications.error(format!("Could not embed link: {e}")),
        }
    }

    pub fn open_url(&mut self, url: &str) {
        if let Err(e) = open::that(url) {
            tracing::error!("Failed to open {}: {}", url, e);
            self.notifications.error(format!("Could not open link: {e}"));
        }
    }

    /// Surface background write outcomes
    fn poll_persistence(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                PersistenceEvent::Failed { id, error } => {
                    let project = self
                        .workspace
                        .project(&id)
                        .map(|p| p.name.clone())
                        .unwrap_or(id);
                    self.notifications
                        .error(format!("Could not save \"{project}\": {error}"));
                }
                other => tracing::debug!("Persistence: {:?}", other),
            }
        }
    }

    /// Render the top menu bar
    fn render_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New Project").clicked() {
                        self.new_project();
                        ui.close();
                    }
                    if ui.button("Import...").clicked() {
                        ui.close();
                        self.import_dialog();
                    }
                    let has_selection = self.workspace.selected_id().is_some();
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Export..."))
                        .clicked()
                    {
                        ui.close();
                        if let Some(id) = self.workspace.selected_id().map(str::to_string) {
                            self.export_project(&id);
                        }
                    }
                    ui.separator();
                    if ui.button("Reset Application...").clicked() {
                        self.confirm_reset = true;
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Toggle Sidebar").clicked() {
                        self.sidebar_visible = !self.sidebar_visible;
                        ui.close();
                    }
                    if ui.button("Preview").clicked() {
                        self.preview_visible = true;
                        ui.close();
                    }
                    ui.separator();
                    let dark = self.config.ui.theme == "dark";
                    if ui.selectable_label(dark, "Dark Theme").clicked() {
                        self.config.ui.theme = if dark { "light" } else { "dark" }.to_string();
                        Self::configure_theme(ctx, &self.config);
                        if let Err(e) = self.config.save() {
                            tracing::warn!("Failed to save config: {}", e);
                        }
                        ui.close();
                    }
                });
            });
        });
    }

    fn render_reset_dialog(&mut self, ctx: &egui::Context) {
        if !self.confirm_reset {
            return;
        }
        egui::Window::new("Reset Application")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label("This deletes every project and restores the Getting Started guide.");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        self.confirm_reset = false;
                    }
                    if ui.button("Reset").clicked() {
                        self.confirm_reset = false;
                        self.reset();
                    }
                });
            });
    }
}

impl eframe::App for TempoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_persistence();

        // Handle keyboard shortcuts
        let (new_project, export, toggle_sidebar) = ctx.input(|i| {
            (
                i.modifiers.command && i.key_pressed(egui::Key::N),
                i.modifiers.command && i.key_pressed(egui::Key::E),
                i.modifiers.command && i.key_pressed(egui::Key::B),
            )
        });
        if new_project {
            self.new_project();
        }
        if export {
            if let Some(id) = self.workspace.selected_id().map(str::to_string) {
                self.export_project(&id);
            }
        }
        if toggle_sidebar {
            self.sidebar_visible = !self.sidebar_visible;
        }

        // Render menu bar
        self.render_menu_bar(ctx);

        // Render sidebar with project list
        if self.sidebar_visible {
            egui::SidePanel::left("sidebar")
                .resizable(true)
                .default_width(self.config.ui.sidebar_width)
                .min_width(220.0)
                .show(ctx, |ui| {
                    ProjectSidebar::show(ui, self);
                });
        }

        // Render main content area
        egui::CentralPanel::default().show(ctx, |ui| {
            EditorPanel::show(ui, self);
        });

        PreviewWindow::show(ctx, self);
        ProjectSidebar::show_delete_dialog(ctx, self);
        EditorPanel::show_embed_dialog(ctx, self);
        self.render_reset_dialog(ctx);
        self.notifications.show(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        tracing::info!("Flushing pending saves");
        self.runtime.block_on(self.writer.flush());
        if let Err(e) = self.config.save() {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
}
