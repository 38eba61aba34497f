//! Timed notification banners

use std::time::{Duration, Instant};

use eframe::egui::{self, Color32, RichText};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub expires: Instant,
}

/// Stack of notices shown in the bottom-right corner
#[derive(Debug)]
pub struct Notifications {
    notices: Vec<Notice>,
    lifetime: Duration,
}

impl Notifications {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            notices: Vec::new(),
            lifetime,
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message.into());
    }

    fn push(&mut self, level: NoticeLevel, message: String) {
        // Repeated failures of the same write collapse into one banner.
        if let Some(existing) = self
            .notices
            .iter_mut()
            .find(|n| n.level == level && n.message == message)
        {
            existing.expires = Instant::now() + self.lifetime;
            return;
        }
        self.notices.push(Notice {
            level,
            message,
            expires: Instant::now() + self.lifetime,
        });
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drop notices that have run out
    pub fn prune(&mut self, now: Instant) {
        self.notices.retain(|n| n.expires > now);
    }

    /// Show the current notices
    pub fn show(&mut self, ctx: &egui::Context) {
        self.prune(Instant::now());
        if self.notices.is_empty() {
            return;
        }

        let mut dismissed = None;
        egui::Area::new(egui::Id::new("notifications"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for (index, notice) in self.notices.iter().enumerate() {
                    let (fill, text) = match notice.level {
                        NoticeLevel::Info => (Color32::from_rgb(40, 60, 45), Color32::WHITE),
                        NoticeLevel::Error => (Color32::from_rgb(90, 35, 35), Color32::WHITE),
                    };
                    egui::Frame::new()
                        .fill(fill)
                        .inner_margin(egui::Margin::same(8))
                        .corner_radius(egui::CornerRadius::same(6))
                        .show(ui, |ui| {
                            ui.set_max_width(360.0);
                            ui.horizontal(|ui| {
                                ui.label(RichText::new(&notice.message).color(text));
                                if ui.small_button("\u{2715}").clicked() {
                                    dismissed = Some(index);
                                }
                            });
                        });
                    ui.add_space(4.0);
                }
            });

        if let Some(index) = dismissed {
            self.notices.remove(index);
        }

        // Keep repainting so expired notices disappear on time.
        ctx.request_repaint_after(Duration::from_millis(500));
    }
}
