//! Field rendering shared by the editor cards and the preview window
//!
//! egui cannot play video or host web frames, so those fields render as
//! cards that open the link in the system browser.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use eframe::egui::{self, Color32, FontId, RichText, Ui};

use crate::core::media::{classify_data_uri, decode_data_uri, DataUriKind};
use crate::core::model::{FieldKind, Size};
use crate::core::render::{text_spans, TextSpan};

/// Action triggered by interacting with a rendered field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldAction {
    /// Open external URL
    OpenUrl(String),
}

/// Registers decoded data-URI images with egui's byte loader once each
#[derive(Debug, Default)]
pub struct MediaCache {
    registered: HashSet<String>,
}

impl MediaCache {
    /// URI egui's image loaders can resolve for `content`
    pub fn image_uri(&mut self, ctx: &egui::Context, content: &str) -> Option<String> {
        if is_web_url(content) {
            return Some(content.to_string());
        }
        if !content.starts_with("data:") {
            return None;
        }

        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        let mime = content[5..].split([';', ',']).next().unwrap_or_default();
        let ext = mime
            .rsplit('/')
            .next()
            .and_then(|sub| sub.split('+').next())
            .unwrap_or("png");
        let uri = format!("bytes://media/{:016x}.{}", hasher.finish(), ext);

        if !self.registered.contains(&uri) {
            let (_, bytes) = decode_data_uri(content)?;
            ctx.include_bytes(uri.clone(), bytes);
            self.registered.insert(uri.clone());
        }
        Some(uri)
    }
}

pub fn is_web_url(content: &str) -> bool {
    content.starts_with("http://") || content.starts_with("https://")
}

/// Scale a stored size and shrink it to fit the available width
fn display_size(ui: &Ui, size: Size, scale: f32) -> egui::Vec2 {
    let mut out = egui::vec2(size.width as f32 * scale, size.height as f32 * scale);
    let available = ui.available_width();
    if out.x > available && out.x > 0.0 {
        out *= available / out.x;
    }
    out
}

/// Render a field to the UI
pub fn render_field(
    ui: &mut Ui,
    kind: &FieldKind,
    scale: f32,
    cache: &mut MediaCache,
) -> Option<FieldAction> {
    let size = kind.size().map(|s| display_size(ui, s, scale));
    match kind {
        FieldKind::Title { content } => {
            render_title(ui, content, scale);
            None
        }
        FieldKind::Text { content } => render_text(ui, content, scale),
        FieldKind::Image { content, .. } => {
            render_image(ui, content, size.unwrap_or_default(), cache);
            None
        }
        FieldKind::Video {
            content, embed_url, ..
        } => {
            let target = embed_url.as_deref().unwrap_or(content);
            render_media_card(ui, "\u{25B6}", "Video", target, size.unwrap_or_default())
        }
        FieldKind::Iframe { content, .. } => {
            let label = match classify_data_uri(content) {
                DataUriKind::Pdf => "PDF document",
                DataUriKind::Audio => "Audio clip",
                DataUriKind::Other => "Embedded page",
            };
            render_media_card(ui, "\u{1F5D4}", label, content, size.unwrap_or_default())
        }
        FieldKind::LinkPreview { content, .. } => {
            render_link_card(ui, content, size.unwrap_or_default())
        }
    }
}

pub fn render_title(ui: &mut Ui, text: &str, scale: f32) {
    ui.label(
        RichText::new(text)
            .font(FontId::proportional(20.0 * scale))
            .strong(),
    );
    ui.add_space(6.0 * scale);
}

/// Render a paragraph, turning bare URLs into links
pub fn render_text(ui: &mut Ui, text: &str, scale: f32) -> Option<FieldAction> {
    let mut action = None;
    let font = FontId::proportional(14.0 * scale);

    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        for span in text_spans(text) {
            match span {
                TextSpan::Text(t) => {
                    ui.label(RichText::new(t).font(font.clone()));
                }
                TextSpan::Link(url) => {
                    let response = ui.link(RichText::new(url).font(font.clone()));
                    if response.clicked() {
                        action = Some(FieldAction::OpenUrl(url.to_string()));
                    }
                }
            }
        }
    });

    ui.add_space(8.0 * scale);
    action
}

fn placeholder_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(Color32::from_rgb(45, 45, 50))
        .stroke(egui::Stroke::new(1.0, Color32::from_rgb(70, 70, 70)))
        .inner_margin(egui::Margin::same(8))
        .corner_radius(egui::CornerRadius::same(8))
}

pub fn render_image(ui: &mut Ui, content: &str, size: egui::Vec2, cache: &mut MediaCache) {
    match cache.image_uri(ui.ctx(), content) {
        Some(uri) => {
            ui.add(
                egui::Image::new(uri)
                    .fit_to_exact_size(size)
                    .corner_radius(egui::CornerRadius::same(8)),
            );
        }
        None => {
            placeholder_frame().show(ui, |ui| {
                ui.set_min_size(size);
                ui.label(RichText::new("Image unavailable").italics());
            });
        }
    }
    ui.add_space(8.0);
}

fn render_media_card(
    ui: &mut Ui,
    icon: &str,
    label: &str,
    target: &str,
    size: egui::Vec2,
) -> Option<FieldAction> {
    let mut action = None;

    placeholder_frame().show(ui, |ui| {
        ui.set_min_size((size - egui::vec2(16.0, 16.0)).max(egui::Vec2::ZERO));
        ui.horizontal(|ui| {
            ui.label(RichText::new(icon).font(FontId::proportional(24.0)));
            ui.vertical(|ui| {
                ui.label(RichText::new(label).strong());
                if is_web_url(target) {
                    if ui.link(target).clicked() {
                        action = Some(FieldAction::OpenUrl(target.to_string()));
                    }
                } else {
                    ui.label(
                        RichText::new("Embedded file")
                            .font(FontId::monospace(12.0))
                            .color(Color32::from_rgb(128, 128, 128)),
                    );
                }
            });
        });
    });

    ui.add_space(8.0);
    action
}

fn render_link_card(ui: &mut Ui, url: &str, size: egui::Vec2) -> Option<FieldAction> {
    let response = placeholder_frame()
        .show(ui, |ui| {
            ui.set_min_size((size - egui::vec2(16.0, 16.0)).max(egui::Vec2::ZERO));
            ui.horizontal(|ui| {
                ui.label(RichText::new("\u{1F310}").font(FontId::proportional(24.0)));
                ui.vertical(|ui| {
                    ui.label(RichText::new(url).strong());
                    ui.label(
                        RichText::new("Click to open link")
                            .color(Color32::from_rgb(128, 128, 128)),
                    );
                });
            });
        })
        .response
        .interact(egui::Sense::click())
        .on_hover_cursor(egui::CursorIcon::PointingHand);

    ui.add_space(8.0);
    response
        .clicked()
        .then(|| FieldAction::OpenUrl(url.to_string()))
}
