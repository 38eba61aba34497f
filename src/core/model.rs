//! Project, step and field data structures
//!
//! A project is an ordered list of steps (slides), and each step is an
//! ordered list of typed fields. Field types are a closed set, so every
//! place that branches on the type matches exhaustively on [`FieldKind`].

use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

use super::media::{classify_data_uri, DataUriKind};

/// Label shown for a step without a (non-empty) title field
pub const UNTITLED_STEP: &str = "Untitled Step";

/// Name given to projects created with "New Project"
pub const NEW_PROJECT_NAME: &str = "New Project";

/// Rendered width and height of a media field, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

pub const IMAGE_SIZE: Size = Size::new(800.0, 400.0);
pub const VIDEO_SIZE: Size = Size::new(800.0, 450.0);
pub const IFRAME_SIZE: Size = Size::new(800.0, 450.0);
pub const AUDIO_SIZE: Size = Size::new(400.0, 50.0);
pub const PDF_SIZE: Size = Size::new(800.0, 600.0);
pub const LINK_PREVIEW_SIZE: Size = Size::new(800.0, 200.0);

/// Typed content of a step field.
///
/// Serialized with an inline `type` tag (`title`, `text`, `image`, `video`,
/// `iframe`, `link-preview`) so the JSON shape is
/// `{ "id", "type", "content", "width"?, "height"?, "embedUrl"? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    Title {
        content: String,
    },
    Text {
        content: String,
    },
    Image {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
    },
    Video {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
        #[serde(
            rename = "embedUrl",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        embed_url: Option<String>,
    },
    Iframe {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
    },
    LinkPreview {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
    },
}

impl FieldKind {
    pub fn title(content: impl Into<String>) -> Self {
        Self::Title {
            content: content.into(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Image with the default size filled in explicitly
    pub fn image(content: impl Into<String>) -> Self {
        Self::Image {
            content: content.into(),
            width: Some(IMAGE_SIZE.width),
            height: Some(IMAGE_SIZE.height),
        }
    }

    /// Video with the default size filled in explicitly
    pub fn video(content: impl Into<String>) -> Self {
        Self::Video {
            content: content.into(),
            width: Some(VIDEO_SIZE.width),
            height: Some(VIDEO_SIZE.height),
            embed_url: None,
        }
    }

    /// Embedded frame sized for its content (audio player, PDF viewer or page)
    pub fn iframe(content: impl Into<String>) -> Self {
        let content = content.into();
        let size = Self::iframe_default_size(&content);
        Self::Iframe {
            content,
            width: Some(size.width),
            height: Some(size.height),
        }
    }

    pub fn link_preview(content: impl Into<String>) -> Self {
        Self::LinkPreview {
            content: content.into(),
            width: Some(LINK_PREVIEW_SIZE.width),
            height: Some(LINK_PREVIEW_SIZE.height),
        }
    }

    /// The `type` tag used in JSON and HTML class names
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Title { .. } => "title",
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Video { .. } => "video",
            Self::Iframe { .. } => "iframe",
            Self::LinkPreview { .. } => "link-preview",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Title { content }
            | Self::Text { content }
            | Self::Image { content, .. }
            | Self::Video { content, .. }
            | Self::Iframe { content, .. }
            | Self::LinkPreview { content, .. } => content,
        }
    }

    pub fn set_content(&mut self, value: String) {
        match self {
            Self::Title { content }
            | Self::Text { content }
            | Self::Image { content, .. }
            | Self::Video { content, .. }
            | Self::Iframe { content, .. }
            | Self::LinkPreview { content, .. } => *content = value,
        }
    }

    /// Width and height as stored, without defaults. `None` for text fields.
    pub fn explicit_size(&self) -> Option<(Option<f64>, Option<f64>)> {
        match self {
            Self::Title { .. } | Self::Text { .. } => None,
            Self::Image { width, height, .. }
            | Self::Video { width, height, .. }
            | Self::Iframe { width, height, .. }
            | Self::LinkPreview { width, height, .. } => Some((*width, *height)),
        }
    }

    /// Size used when the field carries no explicit width/height
    pub fn default_size(&self) -> Option<Size> {
        match self {
            Self::Title { .. } | Self::Text { .. } => None,
            Self::Image { .. } => Some(IMAGE_SIZE),
            Self::Video { .. } => Some(VIDEO_SIZE),
            Self::Iframe { content, .. } => Some(Self::iframe_default_size(content)),
            Self::LinkPreview { .. } => Some(LINK_PREVIEW_SIZE),
        }
    }

    /// Effective size: explicit dimensions, each falling back to the default
    pub fn size(&self) -> Option<Size> {
        let (width, height) = self.explicit_size()?;
        let fallback = self.default_size()?;
        Some(Size {
            width: width.unwrap_or(fallback.width),
            height: height.unwrap_or(fallback.height),
        })
    }

    /// Set explicit dimensions. Ignored for text fields.
    pub fn set_size(&mut self, size: Size) {
        match self {
            Self::Title { .. } | Self::Text { .. } => {}
            Self::Image { width, height, .. }
            | Self::Video { width, height, .. }
            | Self::Iframe { width, height, .. }
            | Self::LinkPreview { width, height, .. } => {
                *width = Some(size.width);
                *height = Some(size.height);
            }
        }
    }

    /// Swap an embedded frame for a link card and back.
    ///
    /// Height resets to the new type's default, width is kept.
    pub fn toggle_embed_mode(&self) -> Option<Self> {
        match self {
            Self::Iframe {
                content, width, ..
            } => Some(Self::LinkPreview {
                content: content.clone(),
                width: *width,
                height: Some(LINK_PREVIEW_SIZE.height),
            }),
            Self::LinkPreview {
                content, width, ..
            } => Some(Self::Iframe {
                content: content.clone(),
                width: *width,
                height: Some(IFRAME_SIZE.height),
            }),
            _ => None,
        }
    }

    fn iframe_default_size(content: &str) -> Size {
        match classify_data_uri(content) {
            DataUriKind::Pdf => PDF_SIZE,
            DataUriKind::Audio => AUDIO_SIZE,
            DataUriKind::Other => IFRAME_SIZE,
        }
    }
}

/// A single content unit within a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepField {
    pub id: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl StepField {
    /// Create a field with a freshly minted id
    pub fn new(kind: FieldKind) -> Self {
        Self {
            id: new_field_id(),
            kind,
        }
    }

    pub fn with_id(id: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// One slide of documentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub fields: Vec<StepField>,
}

impl Step {
    /// A new slide with an empty title and an empty text field
    pub fn blank() -> Self {
        Self {
            id: new_id(),
            fields: vec![
                StepField::new(FieldKind::title("")),
                StepField::new(FieldKind::text("")),
            ],
        }
    }

    /// Display label: content of the first title field
    pub fn label(&self) -> &str {
        self.fields
            .iter()
            .find_map(|f| match &f.kind {
                FieldKind::Title { content } => Some(content.as_str()),
                _ => None,
            })
            .filter(|c| !c.is_empty())
            .unwrap_or(UNTITLED_STEP)
    }

    pub fn field_index(&self, field_id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id == field_id)
    }
}

/// A named, ordered collection of steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub steps: Vec<Step>,
}

impl Project {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            steps,
        }
    }

    /// Project created by "New Project"
    pub fn new_blank() -> Self {
        Self::new(
            NEW_PROJECT_NAME,
            vec![Step {
                id: new_id(),
                fields: vec![
                    StepField::new(FieldKind::title("Getting Started")),
                    StepField::new(FieldKind::text("Begin documenting your project...")),
                ],
            }],
        )
    }

    /// The guide seeded into an empty store and restored on reset
    pub fn getting_started() -> Self {
        fn slide(id: &str, fields: Vec<StepField>) -> Step {
            Step {
                id: id.to_string(),
                fields,
            }
        }

        Self {
            id: "1".to_string(),
            name: "Getting Started Guide".to_string(),
            steps: vec![
                slide(
                    "1",
                    vec![
                        StepField::with_id("f1", FieldKind::title("Welcome to Project Documentation")),
                        StepField::with_id(
                            "f2",
                            FieldKind::text(
                                "This guide will help you create detailed project documentation with step-by-step instructions.",
                            ),
                        ),
                        StepField::with_id(
                            "f3",
                            FieldKind::image(
                                "https://images.unsplash.com/photo-1517694712202-14dd9538aa97",
                            ),
                        ),
                    ],
                ),
                slide(
                    "2",
                    vec![
                        StepField::with_id("f4", FieldKind::title("Creating Your First Slide")),
                        StepField::with_id(
                            "f5",
                            FieldKind::text(
                                "Click the 'Add Slide' button to create a new slide. Each slide can include text and images.",
                            ),
                        ),
                    ],
                ),
                slide(
                    "3",
                    vec![
                        StepField::with_id("f6", FieldKind::title("Organizing Slides")),
                        StepField::with_id(
                            "f7",
                            FieldKind::text(
                                "Drag and drop slides to reorder them. Use the grip handle on the left to move slides around.",
                            ),
                        ),
                    ],
                ),
                slide(
                    "4",
                    vec![
                        StepField::with_id("f8", FieldKind::title("Adding Media")),
                        StepField::with_id(
                            "f9",
                            FieldKind::text(
                                "Enhance your documentation by adding images to each slide using the 'Encode Media' or 'Embed Media' buttons.",
                            ),
                        ),
                    ],
                ),
                slide(
                    "5",
                    vec![
                        StepField::with_id("f10", FieldKind::title("Previewing and Exporting")),
                        StepField::with_id(
                            "f11",
                            FieldKind::text(
                                "Use the 'Preview' button to see how your documentation will look, and export it when you're ready.",
                            ),
                        ),
                    ],
                ),
            ],
        }
    }
}

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Mint a timestamp-based id (milliseconds since the Unix epoch).
///
/// Strictly increasing within the process, so ids minted in the same
/// millisecond still differ.
pub fn new_id() -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next.to_string(),
            Err(actual) => last = actual,
        }
    }
}

/// Field ids carry an `f` prefix
pub fn new_field_id() -> String {
    format!("f{}", new_id())
}

/// Lowercase the name and collapse each whitespace run into one hyphen
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
                in_space = true;
            }
        } else {
            slug.push(c);
            in_space = false;
        }
    }
    slug
}

/// File name offered when exporting a project
pub fn export_filename(name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        "untitled-project.html".to_string()
    } else {
        format!("{slug}.html")
    }
}
