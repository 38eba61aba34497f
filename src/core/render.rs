//! Human-readable HTML rendering of a project
//!
//! This is the lossy half of an export: headings, paragraphs and media tags
//! a browser can show directly. The lossless copy travels in the embedded
//! JSON payload (see [`super::serialization`]).

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex_lite::Regex;

use super::media::{classify_data_uri, DataUriKind};
use super::model::{FieldKind, Size, Step};

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?://[^\s]+)").expect("valid URL pattern"));

/// Stylesheet shared by exported documents
pub const EXPORT_CSS: &str = "\
body { margin: 0; padding: 20px; font-family: system-ui, sans-serif; color: #111827; }
.prose { max-width: 8.5in; margin: auto; }
.prose h1 { font-size: 1.875rem; font-weight: 700; margin-bottom: 2rem; }
.prose h2 { font-size: 1.25rem; font-weight: 600; margin-bottom: 1rem; }
.step { margin-bottom: 2rem; }
.step p { margin-bottom: 1rem; white-space: pre-wrap; }
.step a.autolink { color: #0066cc; text-decoration: underline; }
img, video, iframe, object, audio { max-width: 100%; border-radius: 0.5rem; margin-bottom: 1rem; display: block; }
img { object-fit: cover; }
.link-card { display: block; border: 1px solid #e5e7eb; border-radius: 0.5rem; background: #fff; margin-bottom: 1rem; text-decoration: none; box-sizing: border-box; overflow: hidden; }
.link-card:hover { background: #f9fafb; }
.link-card .inner { display: flex; align-items: center; gap: 0.75rem; padding: 1rem; height: 100%; box-sizing: border-box; }
.link-card .url { font-weight: 500; color: #111827; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.link-card .hint { font-size: 0.875rem; color: #6b7280; }
";

const FRAME_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture; serial";

const GLOBE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="#9ca3af" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><circle cx="12" cy="12" r="10"/><line x1="2" y1="12" x2="22" y2="12"/><path d="M12 2a15.3 15.3 0 0 1 4 10 15.3 15.3 0 0 1-4 10 15.3 15.3 0 0 1-4-10 15.3 15.3 0 0 1 4-10z"/></svg>"##;

/// Escape text for use in HTML content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`escape_html`] for the entities it produces
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// A run of plain text or a bare URL inside a text field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSpan<'a> {
    Text(&'a str),
    Link(&'a str),
}

/// Split text into plain runs and `http(s)://` links
pub fn text_spans(text: &str) -> Vec<TextSpan<'_>> {
    let mut spans = Vec::new();
    let mut last = 0;
    for m in URL_RE.find_iter(text) {
        if m.start() > last {
            spans.push(TextSpan::Text(&text[last..m.start()]));
        }
        spans.push(TextSpan::Link(m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        spans.push(TextSpan::Text(&text[last..]));
    }
    spans
}

/// Escape plain text and wrap bare `http(s)://` URLs in links
pub fn autolink(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for span in text_spans(text) {
        match span {
            TextSpan::Text(plain) => out.push_str(&escape_html(plain)),
            TextSpan::Link(url) => {
                let url = escape_html(url);
                let _ = write!(
                    out,
                    r#"<a class="autolink" href="{url}" target="_blank" rel="noopener noreferrer">{url}</a>"#
                );
            }
        }
    }
    out
}

fn size_style(size: Size) -> String {
    format!("width: {}px; height: {}px;", size.width, size.height)
}

/// Render one field as an HTML fragment. `step_number` is 1-based.
pub fn render_field(kind: &FieldKind, step_number: usize) -> String {
    let size = kind.size().map(size_style).unwrap_or_default();
    match kind {
        FieldKind::Title { content } => format!("<h2>{}</h2>", escape_html(content)),
        FieldKind::Text { content } => format!("<p>{}</p>", autolink(content)),
        FieldKind::Image { content, .. } => format!(
            r#"<img src="{}" alt="Step {}" style="{}">"#,
            escape_html(content),
            step_number,
            size
        ),
        FieldKind::Video {
            content, embed_url, ..
        } => match embed_url {
            Some(embed) => format!(
                r#"<iframe src="{}" frameborder="0" allow="{}" allowfullscreen style="{}"></iframe>"#,
                escape_html(embed),
                FRAME_ALLOW,
                size
            ),
            None => format!(
                r#"<video src="{}" controls style="{}"></video>"#,
                escape_html(content),
                size
            ),
        },
        FieldKind::Iframe { content, .. } => match classify_data_uri(content) {
            DataUriKind::Pdf => format!(
                r#"<object data="{}" type="application/pdf" style="{}"><p>PDF cannot be displayed</p></object>"#,
                escape_html(content),
                size
            ),
            DataUriKind::Audio => format!(
                r#"<audio controls src="{}" style="{}"></audio>"#,
                escape_html(content),
                size
            ),
            DataUriKind::Other => format!(
                r#"<iframe src="{}" frameborder="0" allow="{}" allowfullscreen style="{}"></iframe>"#,
                escape_html(content),
                FRAME_ALLOW,
                size
            ),
        },
        FieldKind::LinkPreview { content, .. } => {
            let url = escape_html(content);
            format!(
                r#"<a class="link-card" href="{url}" target="_blank" rel="noopener noreferrer" style="{size}"><div class="inner">{GLOBE_SVG}<div><div class="url">{url}</div><div class="hint">Click to open link</div></div></div></a>"#
            )
        }
    }
}

/// Render the visible body: project heading followed by every step in order
pub fn render_body(name: &str, steps: &[Step]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<h1>{}</h1>", escape_html(name));
    for (index, step) in steps.iter().enumerate() {
        let _ = writeln!(
            out,
            r#"<section class="step" id="slide-{}">"#,
            escape_html(&step.id)
        );
        for field in &step.fields {
            out.push_str(&render_field(&field.kind, index + 1));
            out.push('\n');
        }
        out.push_str("</section>\n");
    }
    out
}
