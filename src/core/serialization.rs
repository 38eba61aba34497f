//! Project export to, and import from, self-contained HTML
//!
//! An exported document carries two copies of the project: the visible
//! rendering from [`super::render`] and a JSON payload
//!
//! ```json
//! { "version": "1.0", "metadata": { "name": "...", "updatedAt": "..." }, "content": { "steps": [...] } }
//! ```
//!
//! The payload is the authoritative copy. It lives either in a
//! `<script type="application/json" id="tempo-project-data">` element or,
//! in preview fragments, between `<!-- TEMPO_PROJECT_DATA -->` and
//! `<!-- END_TEMPO_PROJECT_DATA -->`. Import accepts both, element first.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex_lite::Regex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::model::{Project, Step, StepField};
use super::render::{escape_html, render_body, unescape_html, EXPORT_CSS};

/// Payload format version written on export
pub const FORMAT_VERSION: &str = "1.0";

/// Element id of the embedded payload
pub const PAYLOAD_ELEMENT_ID: &str = "tempo-project-data";

pub const SENTINEL_START: &str = "<!-- TEMPO_PROJECT_DATA -->";
pub const SENTINEL_END: &str = "<!-- END_TEMPO_PROJECT_DATA -->";

/// Name used in previews of a project that has none
pub const UNTITLED_PROJECT: &str = "Untitled Project";

static PAYLOAD_OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<([a-z][a-z0-9-]*)[^>]*?\sid\s*=\s*(?:"tempo-project-data"|'tempo-project-data'|tempo-project-data\b)[^>]*>"#,
    )
    .expect("valid payload tag pattern")
});

/// Why an HTML document could not be imported
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("no embedded project data found")]
    MissingPayload,

    #[error("embedded project data is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("project data has no name")]
    MissingName,

    #[error("project data has no steps list")]
    MissingSteps,

    #[error("step {index}: {reason}")]
    InvalidStep { index: usize, reason: String },

    #[error("step {step}, field {field}: {reason}")]
    InvalidField {
        step: usize,
        field: usize,
        reason: String,
    },
}

/// Name and steps recovered from an exported document
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedProject {
    pub name: String,
    pub steps: Vec<Step>,
}

impl ImportedProject {
    /// Turn into a project with a freshly minted id
    pub fn into_project(self) -> Project {
        Project::new(self.name, self.steps)
    }
}

#[derive(Serialize)]
struct Payload<'a> {
    version: &'a str,
    metadata: Metadata<'a>,
    content: Content<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Metadata<'a> {
    name: &'a str,
    updated_at: String,
}

#[derive(Serialize)]
struct Content<'a> {
    steps: &'a [Step],
}

/// Encode the payload so it cannot close the element or comment around it.
///
/// `<`, `>` and `&` only occur inside JSON strings, where their `\u` escapes
/// decode to the same text.
fn payload_json(name: &str, steps: &[Step], at: DateTime<Utc>) -> String {
    let payload = Payload {
        version: FORMAT_VERSION,
        metadata: Metadata {
            name,
            updated_at: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        },
        content: Content { steps },
    };
    // Serializing plain strings, numbers and derived structs cannot fail.
    let json = serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string());
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

fn document(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n<style>\n{}</style>\n{}</head>\n<body>\n<div class=\"prose\">\n{}</div>\n</body>\n</html>\n",
        escape_html(title),
        EXPORT_CSS,
        head_extra,
        body
    )
}

fn payload_script(json: &str) -> String {
    format!(
        "<script type=\"application/json\" id=\"{}\">{}</script>\n",
        PAYLOAD_ELEMENT_ID, json
    )
}

/// Export a project as a complete HTML document stamped with the current time
pub fn serialize(project: &Project) -> String {
    serialize_at(project, Utc::now())
}

/// Export a project as a complete HTML document stamped with `at`
pub fn serialize_at(project: &Project, at: DateTime<Utc>) -> String {
    let json = payload_json(&project.name, &project.steps, at);
    let body = render_body(&project.name, &project.steps);
    document(&project.name, &payload_script(&json), &body)
}

/// Preview fragment: visible body followed by the sentinel-wrapped payload
pub fn serialize_preview(project: &Project) -> String {
    serialize_preview_at(project, Utc::now())
}

pub fn serialize_preview_at(project: &Project, at: DateTime<Utc>) -> String {
    let name = if project.name.is_empty() {
        UNTITLED_PROJECT
    } else {
        project.name.as_str()
    };
    let json = payload_json(name, &project.steps, at);
    format!(
        "{}{}{}{}",
        render_body(name, &project.steps),
        SENTINEL_START,
        json,
        SENTINEL_END
    )
}

/// Split a preview fragment into its visible part and its payload
pub fn split_preview(fragment: &str) -> (&str, Option<&str>) {
    match fragment.split_once(SENTINEL_START) {
        Some((visible, rest)) => {
            let json = rest.split_once(SENTINEL_END).map_or(rest, |(json, _)| json);
            (visible, Some(json))
        }
        None => (fragment, None),
    }
}

/// Turn a preview fragment into a standalone document with the payload
/// moved into the identified script element
pub fn wrap_preview(fragment: &str) -> String {
    let (visible, json) = split_preview(fragment);
    let title = json
        .and_then(|j| serde_json::from_str::<Value>(j).ok())
        .and_then(|v| v["metadata"]["name"].as_str().map(str::to_string))
        .unwrap_or_else(|| "Project Documentation".to_string());
    document(&title, &payload_script(json.unwrap_or("{}")), visible)
}

/// Find the payload text in an HTML document
///
/// Only an identified element whose content parses as JSON counts; the
/// sentinel pair is the fallback.
pub fn extract_payload(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    for caps in PAYLOAD_OPEN_TAG.captures_iter(html) {
        let (Some(open), Some(tag)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let tag = tag.as_str().to_ascii_lowercase();
        let rest = &html[open.end()..];
        let end = lower[open.end()..]
            .find(&format!("</{tag}"))
            .unwrap_or(rest.len());
        let raw = rest[..end].trim();
        if raw.is_empty() {
            continue;
        }
        // Only raw-text elements keep their content unescaped.
        let json = if tag == "script" {
            raw.to_string()
        } else {
            unescape_html(raw)
        };
        if serde_json::from_str::<Value>(&json).is_ok() {
            return Some(json);
        }
        tracing::debug!("Ignoring <{}> with unparsable payload", tag);
    }

    let (_, json) = split_preview(html);
    json.map(|j| j.trim().to_string()).filter(|j| !j.is_empty())
}

fn validate_field(value: &Value, step: usize, field: usize) -> Result<StepField, ImportError> {
    let invalid = |reason: String| ImportError::InvalidField {
        step,
        field,
        reason,
    };

    let obj = value
        .as_object()
        .ok_or_else(|| invalid("not an object".to_string()))?;
    if !obj.get("id").is_some_and(Value::is_string) {
        return Err(invalid("missing string id".to_string()));
    }
    if !obj.get("content").is_some_and(Value::is_string) {
        return Err(invalid("missing string content".to_string()));
    }
    for key in ["width", "height"] {
        match obj.get(key) {
            None | Some(Value::Null) => {}
            Some(v) => match v.as_f64() {
                Some(n) if n.is_finite() && n >= 0.0 => {}
                _ => return Err(invalid(format!("{key} must be a non-negative number"))),
            },
        }
    }

    serde_json::from_value(value.clone()).map_err(|e| invalid(e.to_string()))
}

fn validate_steps(values: &[Value]) -> Result<Vec<Step>, ImportError> {
    let mut step_ids = HashSet::new();
    let mut steps = Vec::with_capacity(values.len());

    for (index, value) in values.iter().enumerate() {
        let invalid = |reason: &str| ImportError::InvalidStep {
            index,
            reason: reason.to_string(),
        };
        let id = value["id"]
            .as_str()
            .ok_or_else(|| invalid("missing string id"))?;
        if !step_ids.insert(id) {
            return Err(invalid("duplicate step id"));
        }
        let field_values = value["fields"]
            .as_array()
            .ok_or_else(|| invalid("missing fields list"))?;

        let mut field_ids = HashSet::new();
        let mut fields = Vec::with_capacity(field_values.len());
        for (field_index, field_value) in field_values.iter().enumerate() {
            let field = validate_field(field_value, index, field_index)?;
            if !field_ids.insert(field.id.clone()) {
                return Err(ImportError::InvalidField {
                    step: index,
                    field: field_index,
                    reason: "duplicate field id".to_string(),
                });
            }
            fields.push(field);
        }

        steps.push(Step {
            id: id.to_string(),
            fields,
        });
    }

    Ok(steps)
}

/// Recover a project's name and steps from an exported HTML document
pub fn deserialize(html: &str) -> Result<ImportedProject, ImportError> {
    let json = extract_payload(html).ok_or(ImportError::MissingPayload)?;
    let data: Value = serde_json::from_str(&json)?;

    let name = data["metadata"]["name"]
        .as_str()
        .filter(|n| !n.is_empty())
        .ok_or(ImportError::MissingName)?
        .to_string();
    let steps = data["content"]["steps"]
        .as_array()
        .ok_or(ImportError::MissingSteps)?;
    let steps = validate_steps(steps)?;

    tracing::debug!("Parsed project data '{}' with {} steps", name, steps.len());
    Ok(ImportedProject { name, steps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{FieldKind, Size};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn sample() -> Project {
        Project {
            id: "42".into(),
            name: "Wiring the Shop Lights".into(),
            steps: vec![
                Step {
                    id: "s1".into(),
                    fields: vec![
                        StepField::with_id("f1", FieldKind::title("Turn off the breaker")),
                        StepField::with_id(
                            "f2",
                            FieldKind::text("Manual: https://example.com/manual.pdf\nthen </script> & -->"),
                        ),
                        StepField::with_id(
                            "f3",
                            FieldKind::Image {
                                content: "data:image/png;base64,iVBORw0KGgo=".into(),
                                width: None,
                                height: Some(320.0),
                            },
                        ),
                    ],
                },
                Step {
                    id: "s2".into(),
                    fields: vec![
                        StepField::with_id(
                            "f4",
                            FieldKind::Video {
                                content: "https://youtu.be/abc".into(),
                                width: Some(640.0),
                                height: Some(360.0),
                                embed_url: Some("https://www.youtube.com/embed/abc".into()),
                            },
                        ),
                        StepField::with_id("f5", FieldKind::iframe("data:audio/mpeg;base64,SUQz")),
                        StepField::with_id("f6", FieldKind::link_preview("https://example.com")),
                    ],
                },
            ],
        }
    }

    #[test]
    fn test_round_trip() {
        let project = sample();
        let html = serialize(&project);
        let imported = deserialize(&html).unwrap();
        assert_eq!(imported.name, project.name);
        assert_eq!(imported.steps, project.steps);
    }

    #[test]
    fn test_import_mints_fresh_id() {
        let project = sample();
        let imported = deserialize(&serialize(&project)).unwrap().into_project();
        assert_ne!(imported.id, project.id);
        assert_eq!(imported.steps, project.steps);
    }

    #[test]
    fn test_payload_cannot_escape_its_element() {
        let html = serialize(&sample());
        let script_start = html.find(r#"id="tempo-project-data">"#).unwrap();
        let script_end = html[script_start..].find("</script>").unwrap() + script_start;
        let json = &html[script_start..script_end];
        assert!(!json.contains("-->"));
        assert!(!json.contains("</"));
    }

    #[test]
    fn test_export_metadata() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        let html = serialize_at(&sample(), at);
        let json = extract_payload(&html).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["metadata"]["name"], "Wiring the Shop Lights");
        assert_eq!(value["metadata"]["updatedAt"], "2026-10-18T09:30:00.000Z");
        assert_eq!(value["content"]["steps"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_visible_rendering_present() {
        let html = serialize(&sample());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Wiring the Shop Lights</title>"));
        assert!(html.contains("<h2>Turn off the breaker</h2>"));
        assert!(html.contains(r#"href="https://example.com/manual.pdf""#));
        assert!(html.contains("width: 800px; height: 320px;"));
    }

    #[test]
    fn test_sentinel_fallback() {
        let project = sample();
        let fragment = serialize_preview(&project);
        assert!(fragment.contains(SENTINEL_START));
        let imported = deserialize(&fragment).unwrap();
        assert_eq!(imported.steps, project.steps);
        assert_eq!(imported.name, project.name);
    }

    #[test]
    fn test_wrap_preview_moves_payload_into_script() {
        let project = sample();
        let wrapped = wrap_preview(&serialize_preview(&project));
        assert!(!wrapped.contains(SENTINEL_START));
        assert!(wrapped.contains(r#"<script type="application/json" id="tempo-project-data">"#));
        assert!(wrapped.contains("<title>Wiring the Shop Lights</title>"));
        assert_eq!(deserialize(&wrapped).unwrap().steps, project.steps);
    }

    #[test]
    fn test_preview_of_unnamed_project() {
        let mut project = sample();
        project.name.clear();
        let imported = deserialize(&serialize_preview(&project)).unwrap();
        assert_eq!(imported.name, UNTITLED_PROJECT);
    }

    #[test]
    fn test_imports_legacy_export_layout() {
        let html = r#"
        <!DOCTYPE html>
        <html>
          <head>
            <script type="application/json" id="tempo-project-data">
              {"version":"1.0","metadata":{"name":"Legacy","updatedAt":"2024-01-01T00:00:00.000Z"},"content":{"steps":[{"id":"1","fields":[{"id":"f1","type":"title","content":"Hi"},{"id":"f3","type":"image","content":"https://x/y.png","width":800,"height":400,"source":"url"}]}]}}
            </script>
          </head>
          <body></body>
        </html>"#;
        let imported = deserialize(html).unwrap();
        assert_eq!(imported.name, "Legacy");
        assert_eq!(imported.steps[0].fields[1].kind.size(), Some(Size::new(800.0, 400.0)));
    }

    #[test]
    fn test_identified_element_is_attribute_order_agnostic() {
        let html = r#"<div data-x="1" ID='tempo-project-data' hidden>{&quot;metadata&quot;:{&quot;name&quot;:&quot;A&quot;},&quot;content&quot;:{&quot;steps&quot;:[]}}</DIV>"#;
        let imported = deserialize(html).unwrap();
        assert_eq!(imported.name, "A");
        assert!(imported.steps.is_empty());
    }

    #[test]
    fn test_element_preferred_over_sentinel() {
        let html = format!(
            "{}{{\"metadata\":{{\"name\":\"Sentinel\"}},\"content\":{{\"steps\":[]}}}}{}<script id=\"tempo-project-data\" type=\"application/json\">{{\"metadata\":{{\"name\":\"Element\"}},\"content\":{{\"steps\":[]}}}}</script>",
            SENTINEL_START, SENTINEL_END
        );
        assert_eq!(deserialize(&html).unwrap().name, "Element");
    }

    #[test]
    fn test_id_in_visible_urls_does_not_shadow_sentinel() {
        let project = Project {
            id: "7".into(),
            name: "Query Strings".into(),
            steps: vec![Step {
                id: "s1".into(),
                fields: vec![
                    StepField::with_id(
                        "f1",
                        FieldKind::image("https://cdn.example.com/img?id=tempo-project-data"),
                    ),
                    StepField::with_id("f2", FieldKind::text("see https://x.io/?id=tempo-project-data")),
                ],
            }],
        };
        let imported = deserialize(&serialize_preview(&project)).unwrap();
        assert_eq!(imported.name, "Query Strings");
        assert_eq!(imported.steps, project.steps);
    }

    #[test]
    fn test_unparsable_element_falls_back_to_sentinel() {
        let html = format!(
            "<div id=\"tempo-project-data\">not json</div>{}{{\"metadata\":{{\"name\":\"Sentinel\"}},\"content\":{{\"steps\":[]}}}}{}",
            SENTINEL_START, SENTINEL_END
        );
        assert_eq!(deserialize(&html).unwrap().name, "Sentinel");
    }

    #[test]
    fn test_missing_payload() {
        let result = deserialize("<html><body><h1>Just a page</h1></body></html>");
        assert!(matches!(result, Err(ImportError::MissingPayload)));
    }

    #[test]
    fn test_malformed_json() {
        let html = r#"<script id="tempo-project-data">{"metadata": </script>"#;
        assert!(matches!(deserialize(html), Err(ImportError::MalformedJson(_))));
    }

    #[test]
    fn test_missing_required_fields() {
        let no_name = r#"<script id="tempo-project-data">{"metadata":{"name":""},"content":{"steps":[]}}</script>"#;
        assert!(matches!(deserialize(no_name), Err(ImportError::MissingName)));

        let no_steps = r#"<script id="tempo-project-data">{"metadata":{"name":"X"},"content":{}}</script>"#;
        assert!(matches!(deserialize(no_steps), Err(ImportError::MissingSteps)));

        let empty_object = r#"<script id="tempo-project-data">{}</script>"#;
        assert!(matches!(deserialize(empty_object), Err(ImportError::MissingName)));
    }

    #[test]
    fn test_rejects_malformed_fields() {
        let wrap = |steps: &str| {
            format!(
                r#"<script id="tempo-project-data">{{"metadata":{{"name":"X"}},"content":{{"steps":{steps}}}}}</script>"#
            )
        };

        let unknown_type = wrap(r#"[{"id":"1","fields":[{"id":"f","type":"marquee","content":"x"}]}]"#);
        match deserialize(&unknown_type) {
            Err(ImportError::InvalidField { step: 0, field: 0, reason }) => {
                assert!(reason.contains("marquee"), "{reason}")
            }
            other => panic!("unexpected: {other:?}"),
        }

        let negative = wrap(r#"[{"id":"1","fields":[{"id":"f","type":"image","content":"x","width":-5}]}]"#);
        assert!(matches!(
            deserialize(&negative),
            Err(ImportError::InvalidField { step: 0, field: 0, .. })
        ));

        let no_content = wrap(r#"[{"id":"1","fields":[{"id":"a","type":"text","content":"ok"},{"id":"b","type":"text"}]}]"#);
        assert!(matches!(
            deserialize(&no_content),
            Err(ImportError::InvalidField { step: 0, field: 1, .. })
        ));

        let dup_field = wrap(r#"[{"id":"1","fields":[{"id":"a","type":"text","content":""},{"id":"a","type":"title","content":""}]}]"#);
        assert!(matches!(
            deserialize(&dup_field),
            Err(ImportError::InvalidField { field: 1, .. })
        ));

        let dup_step = wrap(r#"[{"id":"1","fields":[]},{"id":"1","fields":[]}]"#);
        assert!(matches!(
            deserialize(&dup_step),
            Err(ImportError::InvalidStep { index: 1, .. })
        ));

        let no_fields = wrap(r#"[{"id":"1"}]"#);
        assert!(matches!(
            deserialize(&no_fields),
            Err(ImportError::InvalidStep { index: 0, .. })
        ));
    }

    fn field_strategy() -> impl Strategy<Value = FieldKind> {
        let text = "\\PC{0,24}";
        let dim = prop::option::of((0u32..2000).prop_map(f64::from));
        prop_oneof![
            text.prop_map(FieldKind::title),
            text.prop_map(FieldKind::text),
            (text, dim.clone(), dim.clone()).prop_map(|(content, width, height)| FieldKind::Image {
                content,
                width,
                height
            }),
            (text, dim.clone(), dim.clone(), prop::option::of(text)).prop_map(
                |(content, width, height, embed_url)| FieldKind::Video {
                    content,
                    width,
                    height,
                    embed_url
                }
            ),
            (text, dim.clone(), dim.clone()).prop_map(|(content, width, height)| FieldKind::Iframe {
                content,
                width,
                height
            }),
            (text, dim.clone(), dim).prop_map(|(content, width, height)| FieldKind::LinkPreview {
                content,
                width,
                height
            }),
        ]
    }

    fn steps_strategy() -> impl Strategy<Value = Vec<Step>> {
        prop::collection::vec(prop::collection::vec(field_strategy(), 0..5), 1..5).prop_map(
            |steps| {
                steps
                    .into_iter()
                    .enumerate()
                    .map(|(i, kinds)| Step {
                        id: format!("s{i}"),
                        fields: kinds
                            .into_iter()
                            .enumerate()
                            .map(|(j, kind)| StepField::with_id(format!("f{i}-{j}"), kind))
                            .collect(),
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn round_trip_preserves_steps_and_name(name in "\\PC{1,30}", steps in steps_strategy()) {
            let project = Project { id: "p".into(), name, steps };
            let imported = deserialize(&serialize(&project)).unwrap();
            prop_assert_eq!(&imported.name, &project.name);
            prop_assert_eq!(&imported.steps, &project.steps);

            let from_preview = deserialize(&serialize_preview(&project)).unwrap();
            prop_assert_eq!(&from_preview.steps, &project.steps);
        }
    }
}
