//! Node Details Renderer
//!
//! Turns a node's plain record into the HTML fragment shown in the details
//! panel. Rendering is a pure function of the record: a fixed table maps each
//! `type` to its section renderer, and unknown types get the generic
//! name/description panel.
//!
//! All record text is HTML-escaped. Freeform `implementation_details` and
//! `integration_approach` strings are rendered as Markdown with raw HTML shown
//! as text. Link and image targets outside `http`, `https`, `mailto` and
//! relative URLs are replaced with `#`.
//!
//! # Examples
//!
//! ```rust
//! use alignviz_core::render::render_node_details;
//! use serde_json::json;
//!
//! let html = render_node_details(&json!({
//!     "type": "capability",
//!     "name": "Reward <Modeling>",
//!     "functions": [{"name": "Collect preferences"}]
//! }));
//!
//! assert!(html.contains("Reward &lt;Modeling&gt;"));
//! assert!(html.contains("Collect preferences"));
//! ```

use crate::utils::{escape_html, humanize_key, is_safe_url};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use serde_json::{Map, Value};
use std::fmt::Write as _;

type SectionRenderer = fn(&Value, &mut String);

/// Section renderer per node type
const RENDERERS: &[(&str, SectionRenderer)] = &[
    ("component_group", render_component_group),
    ("component", render_component),
    ("subcomponent", render_subcomponent),
    ("capability", render_capability),
    ("function", render_function),
    ("specification", render_specification),
    ("integration", render_integration),
    ("technique", render_technique),
    ("application", render_application),
    ("input", render_io),
    ("output", render_io),
];

/// Render the details panel for one node record
pub fn render_node_details(node: &Value) -> String {
    let node_type = str_field(node, "type");
    let renderer = RENDERERS
        .iter()
        .find(|(name, _)| Some(*name) == node_type)
        .map(|(_, renderer)| *renderer);

    let mut out = String::new();
    let class = node_type.unwrap_or("unknown");
    let _ = write!(
        out,
        "<div class=\"node-details node-{}\">",
        escape_html(class)
    );
    render_header(node, &mut out);
    match renderer {
        Some(render) => render(node, &mut out),
        None => tracing::debug!("No details renderer for type {:?}", node_type),
    }
    out.push_str("</div>");
    out
}

fn str_field<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Items of a collection field: list, `{items: [...]}` or a single object
fn items<'a>(record: &'a Value, key: &str) -> Vec<&'a Value> {
    match record.get(key) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single @ Value::Object(map)) => match map.get("items") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![single],
        },
        _ => Vec::new(),
    }
}

fn render_header(node: &Value, out: &mut String) {
    let name = str_field(node, "name").unwrap_or("Unnamed Node");
    let _ = write!(out, "<h2 class=\"node-name\">{}</h2>", escape_html(name));
    if let Some(node_type) = str_field(node, "type") {
        let _ = write!(
            out,
            "<span class=\"node-type\">{}</span>",
            escape_html(&humanize_key(node_type))
        );
    }
    let description = str_field(node, "description")
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("No description available.");
    let _ = write!(
        out,
        "<p class=\"node-description\">{}</p>",
        escape_html(description)
    );
}

fn open_section(out: &mut String, title: &str) {
    let _ = write!(
        out,
        "<div class=\"details-section\"><h3>{}</h3>",
        escape_html(title)
    );
}

fn close_section(out: &mut String) {
    out.push_str("</div>");
}

/// Bulleted list of named items (`name` and optional `description`), or of
/// plain strings
fn named_list(out: &mut String, title: &str, entries: &[&Value]) {
    if entries.is_empty() {
        return;
    }
    open_section(out, title);
    out.push_str("<ul>");
    for entry in entries {
        match entry {
            Value::String(text) => {
                let _ = write!(out, "<li>{}</li>", escape_html(text));
            }
            Value::Object(_) => {
                let name = str_field(entry, "name")
                    .or_else(|| str_field(entry, "id"))
                    .unwrap_or("Unnamed");
                let _ = write!(out, "<li><strong>{}</strong>", escape_html(name));
                if let Some(description) = str_field(entry, "description") {
                    let _ = write!(out, ": {}", escape_html(description));
                }
                out.push_str("</li>");
            }
            other => {
                let _ = write!(out, "<li>{}</li>", escape_html(&other.to_string()));
            }
        }
    }
    out.push_str("</ul>");
    close_section(out);
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Two-column table of a map's entries
fn property_table(out: &mut String, title: &str, map: &Map<String, Value>) {
    if map.is_empty() {
        return;
    }
    open_section(out, title);
    out.push_str("<table class=\"property-table\">");
    for (key, value) in map {
        let _ = write!(
            out,
            "<tr><th>{}</th><td>{}</td></tr>",
            escape_html(&humanize_key(key)),
            escape_html(&value_text(value))
        );
    }
    out.push_str("</table>");
    close_section(out);
}

/// Table with one row per object and the given columns
fn object_table(out: &mut String, title: &str, rows: &[&Value], columns: &[&str]) {
    if rows.is_empty() {
        return;
    }
    open_section(out, title);
    out.push_str("<table class=\"details-table\"><tr>");
    for column in columns {
        let _ = write!(out, "<th>{}</th>", escape_html(&humanize_key(column)));
    }
    out.push_str("</tr>");
    for row in rows {
        out.push_str("<tr>");
        for column in columns {
            let cell = row.get(*column).map(value_text).unwrap_or_default();
            let _ = write!(out, "<td>{}</td>", escape_html(&cell));
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
    close_section(out);
}

fn scalar_row(out: &mut String, label: &str, value: Option<&Value>) {
    if let Some(value) = value.filter(|v| !v.is_null()) {
        let _ = write!(
            out,
            "<p class=\"detail-row\"><strong>{}:</strong> {}</p>",
            escape_html(label),
            escape_html(&value_text(value))
        );
    }
}

/// Target used in place of a rejected link or image URL
const BLOCKED_URL: &str = "#";

fn checked_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        tracing::warn!("Blocked unsafe link target: {}", url);
        CowStr::Borrowed(BLOCKED_URL)
    }
}

/// Markdown to HTML with raw HTML downgraded to text and unsafe URLs blocked
pub fn render_markdown(text: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: checked_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: checked_url(dest_url),
            title,
            id,
        }),
        other => other,
    });
    let mut rendered = String::new();
    html::push_html(&mut rendered, parser);
    rendered
}

/// Freeform blob: Markdown for strings, preformatted JSON otherwise
fn freeform(out: &mut String, title: &str, value: Option<&Value>) {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return;
    };
    open_section(out, title);
    match value {
        Value::String(text) => {
            out.push_str("<div class=\"markdown\">");
            out.push_str(&render_markdown(text));
            out.push_str("</div>");
        }
        other => {
            let pretty = serde_json::to_string_pretty(other).unwrap_or_default();
            let _ = write!(out, "<pre>{}</pre>", escape_html(&pretty));
        }
    }
    close_section(out);
}

fn render_component_group(node: &Value, out: &mut String) {
    named_list(out, "Components", &items(node, "components"));
}

fn render_component(node: &Value, out: &mut String) {
    named_list(out, "Subcomponents", &items(node, "subcomponents"));
    named_list(out, "Key Challenges", &items(node, "key_challenges"));
}

fn render_subcomponent(node: &Value, out: &mut String) {
    scalar_row(
        out,
        "Security Level",
        node.get("implementationSecurityLevel"),
    );
    named_list(out, "Capabilities", &items(node, "capabilities"));
    named_list(out, "Implements", &items(node, "implements"));
}

fn render_capability(node: &Value, out: &mut String) {
    named_list(out, "Functions", &items(node, "functions"));
    if let Some(Value::Object(metrics)) = node.get("capability_metrics") {
        property_table(out, "Metrics", metrics);
    }
}

fn render_function(node: &Value, out: &mut String) {
    if let Some(signature) = str_field(node, "function_signature") {
        open_section(out, "Signature");
        let _ = write!(out, "<pre><code>{}</code></pre>", escape_html(signature));
        close_section(out);
    }
    object_table(
        out,
        "Parameters",
        &items(node, "parameters"),
        &["name", "type", "description"],
    );
    freeform(out, "Return Value", node.get("return_value"));
    named_list(out, "Specifications", &items(node, "specifications"));
    object_table(
        out,
        "Integration Points",
        &items(node, "integration_points"),
        &["targetId", "integrationType"],
    );
}

fn render_specification(node: &Value, out: &mut String) {
    object_table(
        out,
        "Requirements",
        &items(node, "requirements"),
        &["id", "description", "priority"],
    );

    let standards = items(node, "standards");
    if !standards.is_empty() {
        open_section(out, "Standards");
        out.push_str("<ul>");
        for standard in standards {
            let name = str_field(standard, "name").unwrap_or("Unnamed standard");
            match str_field(standard, "url").filter(|url| is_safe_url(url)) {
                Some(url) => {
                    let _ = write!(
                        out,
                        "<li><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a></li>",
                        escape_html(url),
                        escape_html(name)
                    );
                }
                None => {
                    let _ = write!(out, "<li>{}</li>", escape_html(name));
                }
            }
        }
        out.push_str("</ul>");
        close_section(out);
    }

    freeform(
        out,
        "Implementation Details",
        node.get("implementation_details"),
    );
    let integrations = match node.get("integration") {
        Some(single @ Value::Object(_)) => vec![single],
        _ => items(node, "integrations"),
    };
    named_list(out, "Integrations", &integrations);
}

fn render_integration(node: &Value, out: &mut String) {
    freeform(out, "Integration Approach", node.get("integration_approach"));
    object_table(
        out,
        "Constraints",
        &items(node, "constraints"),
        &["id", "description", "type", "impact"],
    );
    object_table(
        out,
        "Dependencies",
        &items(node, "dependencies"),
        &["id", "name", "version", "type"],
    );
    named_list(out, "Techniques", &items(node, "techniques"));
}

fn render_technique(node: &Value, out: &mut String) {
    named_list(out, "Applications", &items(node, "applications"));
}

fn render_application(node: &Value, out: &mut String) {
    named_list(out, "Inputs", &items(node, "inputs"));
    named_list(out, "Outputs", &items(node, "outputs"));
}

fn render_io(node: &Value, out: &mut String) {
    scalar_row(out, "IO Type", node.get("io_type"));
    scalar_row(out, "Format", node.get("format"));
    scalar_row(out, "Frequency", node.get("frequency"));
    scalar_row(out, "Sensitive", node.get("is_sensitive"));
    scalar_row(out, "Required", node.get("required"));
    freeform(out, "Data Schema", node.get("data_schema"));
    object_table(
        out,
        "Validation Rules",
        &items(node, "validation_rules"),
        &["id", "description"],
    );
    named_list(out, "Outputs", &items(node, "outputs"));
}
