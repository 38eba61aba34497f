//! Media classification and encoding
//!
//! Local files are embedded as base64 data URIs so an exported project stays
//! self-contained. Pasted links are classified by their shape: known video
//! platforms become embeds, direct media links become media fields and
//! everything else becomes a link card.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

use super::model::{FieldKind, AUDIO_SIZE, PDF_SIZE};

/// Errors raised while turning a file or link into a field
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("unsupported media type: {0}")]
    Unsupported(String),

    #[error("link is empty")]
    EmptyUrl,
}

/// What a data URI holds, as far as frame sizing and rendering care
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataUriKind {
    Pdf,
    Audio,
    Other,
}

pub fn classify_data_uri(content: &str) -> DataUriKind {
    if content.starts_with("data:application/pdf") {
        DataUriKind::Pdf
    } else if content.starts_with("data:audio/") {
        DataUriKind::Audio
    } else {
        DataUriKind::Other
    }
}

/// Broad media family derived from a MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaFamily {
    Image,
    Video,
    Audio,
    Pdf,
}

fn family_of(mime: &str) -> Option<MediaFamily> {
    if mime.starts_with("image/") {
        Some(MediaFamily::Image)
    } else if mime.starts_with("video/") {
        Some(MediaFamily::Video)
    } else if mime.starts_with("audio/") {
        Some(MediaFamily::Audio)
    } else if mime == "application/pdf" {
        Some(MediaFamily::Pdf)
    } else {
        None
    }
}

/// Guess a MIME type from a file extension
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "avif" => "image/avif",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime)
}

fn field_for_family(family: MediaFamily, content: String) -> FieldKind {
    match family {
        MediaFamily::Image => FieldKind::image(content),
        MediaFamily::Video => FieldKind::video(content),
        MediaFamily::Audio => {
            let mut field = FieldKind::iframe(content);
            field.set_size(AUDIO_SIZE);
            field
        }
        MediaFamily::Pdf => {
            let mut field = FieldKind::iframe(content);
            field.set_size(PDF_SIZE);
            field
        }
    }
}

/// Encode bytes as a `data:` URI
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Decode a base64 `data:` URI into its MIME type and payload
pub fn decode_data_uri(uri: &str) -> Option<(&str, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some((mime, bytes))
}

/// Build a field from raw file bytes, using the extension to pick the type
pub fn field_from_bytes(file_name: &str, bytes: &[u8]) -> Result<FieldKind, MediaError> {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    let mime =
        mime_for_extension(&ext).ok_or_else(|| MediaError::Unsupported(file_name.to_string()))?;
    let family = family_of(mime).ok_or_else(|| MediaError::Unsupported(mime.to_string()))?;
    Ok(field_for_family(family, encode_data_uri(mime, bytes)))
}

/// Read a local file and embed it as a data-URI field
pub fn field_from_file(path: &Path) -> Result<FieldKind, MediaError> {
    let bytes = std::fs::read(path).map_err(|source| MediaError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let field = field_from_bytes(&name, &bytes)?;
    tracing::info!(
        "Encoded {} ({} bytes) as {} field",
        path.display(),
        bytes.len(),
        field.type_name()
    );
    Ok(field)
}

/// Embed URL for YouTube and Vimeo links
pub fn platform_embed_url(url: &str) -> Option<String> {
    if let Some((_, rest)) = url.split_once("youtube.com/watch?v=") {
        let id = rest.split('&').next().unwrap_or_default();
        return Some(format!("https://www.youtube.com/embed/{id}"));
    }
    if let Some((_, rest)) = url.split_once("youtu.be/") {
        let id = rest.split('?').next().unwrap_or_default();
        return Some(format!("https://www.youtube.com/embed/{id}"));
    }
    if let Some((_, rest)) = url.split_once("vimeo.com/") {
        let id = rest.split('?').next().unwrap_or_default();
        return Some(format!("https://player.vimeo.com/video/{id}"));
    }
    None
}

/// Extension of the last path segment of a URL, ignoring query and fragment
fn url_extension(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    let after_scheme = path.split_once("://").map_or(path, |(_, rest)| rest);
    let segment = after_scheme.split_once('/')?.1.rsplit('/').next()?;
    segment.rsplit_once('.').map(|(_, ext)| ext)
}

/// Classify a pasted link
pub fn field_from_url(url: &str) -> Result<FieldKind, MediaError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(MediaError::EmptyUrl);
    }

    if let Some(embed) = platform_embed_url(url) {
        return Ok(FieldKind::iframe(embed));
    }

    let family = url_extension(url)
        .and_then(mime_for_extension)
        .and_then(family_of);

    Ok(match family {
        Some(family) => field_for_family(family, url.to_string()),
        None => FieldKind::link_preview(url),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Size;

    #[test]
    fn test_classify_data_uri() {
        assert_eq!(classify_data_uri("data:application/pdf;base64,JVBE"), DataUriKind::Pdf);
        assert_eq!(classify_data_uri("data:audio/mpeg;base64,SUQz"), DataUriKind::Audio);
        assert_eq!(classify_data_uri("data:image/png;base64,iVBO"), DataUriKind::Other);
        assert_eq!(classify_data_uri("https://example.com/a.pdf"), DataUriKind::Other);
    }

    #[test]
    fn test_data_uri_round_trip() {
        let uri = encode_data_uri("image/png", b"\x89PNG");
        assert!(uri.starts_with("data:image/png;base64,"));
        let (mime, bytes) = decode_data_uri(&uri).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"\x89PNG");
        assert!(decode_data_uri("https://example.com").is_none());
    }

    #[test]
    fn test_field_from_bytes_by_family() {
        let image = field_from_bytes("shot.PNG", b"x").unwrap();
        assert_eq!(image.type_name(), "image");
        assert_eq!(image.size(), Some(Size::new(800.0, 400.0)));

        let audio = field_from_bytes("intro.mp3", b"x").unwrap();
        assert_eq!(audio.type_name(), "iframe");
        assert_eq!(audio.size(), Some(AUDIO_SIZE));

        let pdf = field_from_bytes("manual.pdf", b"x").unwrap();
        assert_eq!(pdf.size(), Some(PDF_SIZE));

        assert!(matches!(
            field_from_bytes("notes.txt", b"x"),
            Err(MediaError::Unsupported(_))
        ));
    }

    #[test]
    fn test_field_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.webm");
        std::fs::write(&path, b"webm").unwrap();
        let field = field_from_file(&path).unwrap();
        assert_eq!(field.type_name(), "video");
        assert!(field.content().starts_with("data:video/webm;base64,"));

        let missing = field_from_file(&dir.path().join("nope.png"));
        assert!(matches!(missing, Err(MediaError::Read { .. })));
    }

    #[test]
    fn test_platform_embeds() {
        assert_eq!(
            platform_embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            platform_embed_url("https://youtu.be/dQw4w9WgXcQ?si=abc"),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            platform_embed_url("https://vimeo.com/76979871?share=copy"),
            Some("https://player.vimeo.com/video/76979871".to_string())
        );
        assert_eq!(platform_embed_url("https://example.com/watch"), None);
    }

    #[test]
    fn test_field_from_url() {
        let embed = field_from_url("https://youtu.be/abc").unwrap();
        assert_eq!(embed, FieldKind::iframe("https://www.youtube.com/embed/abc"));

        let image = field_from_url("https://cdn.example.com/img/photo.jpg?w=200").unwrap();
        assert_eq!(image.type_name(), "image");

        let pdf = field_from_url("https://example.com/docs/guide.pdf").unwrap();
        assert_eq!(pdf.type_name(), "iframe");
        assert_eq!(pdf.size(), Some(PDF_SIZE));

        let audio = field_from_url("https://example.com/ep1.mp3").unwrap();
        assert_eq!(audio.size(), Some(AUDIO_SIZE));

        let card = field_from_url("  https://example.com/about  ").unwrap();
        assert_eq!(card, FieldKind::link_preview("https://example.com/about"));

        let host_only = field_from_url("https://example.com").unwrap();
        assert_eq!(host_only.type_name(), "link-preview");

        assert!(matches!(field_from_url("   "), Err(MediaError::EmptyUrl)));
    }
}
