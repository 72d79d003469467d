//! Lowers a `CoreDocument` to a complete HTML page.
//!
//! Output is a pure function of the document and the adapter: attribute and
//! prop order come from insertion-ordered maps, so compiling twice yields the
//! same bytes. The runtime script is only embedded when some node carries
//! events or motion.

use crate::adapter::{Adapter, Attributes};
use crate::value::{escape_attr, escape_html, js_string, js_truthy};
use crate::RUNTIME_JS;
use pageir_core::model::{CoreDocument, Effect, MotionPreset, Node, NodeType};
use serde_json::{Map, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

pub const VOID_ELEMENTS: &[&str] = &["img", "input", "br", "hr", "meta", "link"];

pub const ATTR_ID: &str = "data-ir-id";
pub const ATTR_EVENTS: &str = "data-ir-events";
pub const ATTR_MOTION: &str = "data-ir-motion";
pub const ATTR_BIND: &str = "data-ir-bind";
pub const ATTR_SHOW: &str = "data-ir-show";
pub const ATTR_TOAST_REGION: &str = "data-ir-toast-region";
pub const STATE_SCRIPT_ID: &str = "ir-state-init";

const TOAST_CSS: &str = "[data-ir-toast-region]{position:fixed;bottom:1rem;right:1rem;z-index:10000;display:flex;flex-direction:column;gap:0.5rem}
.ir-toast{padding:0.75rem 1rem;border-radius:6px;color:#fff;opacity:0;transition:opacity 0.3s;font-size:0.9rem;max-width:360px;box-shadow:0 4px 12px rgba(0,0,0,0.15)}
.ir-toast--show{opacity:1}
.ir-toast--info{background:#0078d4}
.ir-toast--success{background:#28a745}
.ir-toast--warning{background:#ffc107;color:#212529}
.ir-toast--danger{background:#dc3545}";

/// (keyframe body, animation shorthand after the name)
fn preset_parts(preset: MotionPreset) -> (&'static str, &'static str) {
    match preset {
        MotionPreset::FadeIn => ("from{opacity:0}to{opacity:1}", "0.3s ease forwards"),
        MotionPreset::FadeOut => ("from{opacity:1}to{opacity:0}", "0.3s ease forwards"),
        MotionPreset::SlideUp => (
            "from{transform:translateY(20px);opacity:0}to{transform:translateY(0);opacity:1}",
            "0.3s ease forwards",
        ),
        MotionPreset::SlideDown => (
            "from{transform:translateY(-20px);opacity:0}to{transform:translateY(0);opacity:1}",
            "0.3s ease forwards",
        ),
        MotionPreset::SlideLeft => (
            "from{transform:translateX(20px);opacity:0}to{transform:translateX(0);opacity:1}",
            "0.3s ease forwards",
        ),
        MotionPreset::SlideRight => (
            "from{transform:translateX(-20px);opacity:0}to{transform:translateX(0);opacity:1}",
            "0.3s ease forwards",
        ),
        MotionPreset::ScaleIn => (
            "from{transform:scale(0.9);opacity:0}to{transform:scale(1);opacity:1}",
            "0.3s ease forwards",
        ),
        MotionPreset::ScaleOut => (
            "from{transform:scale(1);opacity:1}to{transform:scale(0.9);opacity:0}",
            "0.3s ease forwards",
        ),
        MotionPreset::Bounce => (
            "0%,100%{transform:translateY(0)}50%{transform:translateY(-10px)}",
            "0.5s ease",
        ),
        MotionPreset::Shake => (
            "0%,100%{transform:translateX(0)}25%{transform:translateX(-5px)}75%{transform:translateX(5px)}",
            "0.4s ease",
        ),
        MotionPreset::Pulse => ("0%,100%{opacity:1}50%{opacity:0.5}", "1s ease infinite"),
        MotionPreset::Spin => (
            "from{transform:rotate(0deg)}to{transform:rotate(360deg)}",
            "1s linear infinite",
        ),
    }
}

/// Keyframes plus the classes that play them: `ir-motion-*` for motion specs
/// and `ir-animate-*` for `runAnimation` effects.
pub fn preset_css(preset: MotionPreset) -> String {
    let name = preset.as_str();
    let (frames, timing) = preset_parts(preset);
    format!(
        "@keyframes ir-motion-{name}{{{frames}}} .ir-motion-{name},.ir-animate-{name}{{animation:ir-motion-{name} {timing}}}"
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub default_title: String,
    pub default_lang: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            default_title: "Untitled Page".to_string(),
            default_lang: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPage {
    pub html: String,
    /// Hex digest of `html`, for cache keys and change detection.
    pub fingerprint: String,
    pub uses_runtime: bool,
    /// Presets with emitted keyframes, in first-use order.
    pub motion_presets: Vec<MotionPreset>,
}

pub fn compile(document: &CoreDocument, adapter: &dyn Adapter) -> String {
    compile_page(document, adapter, &CompileOptions::default()).html
}

pub fn compile_page(
    document: &CoreDocument,
    adapter: &dyn Adapter,
    options: &CompileOptions,
) -> CompiledPage {
    let app = &document.app;
    let motion_presets = collect_presets(app);
    let has_toast_region = app.any(&|n| n.node_type == NodeType::ToastRegion);
    let uses_runtime = app.any(&|n| !n.events.is_empty() || n.motion.is_some());
    let assets = adapter.assets();
    let doc_assets = document.assets.clone().unwrap_or_default();

    let mut head: Vec<String> = vec![
        "<meta charset=\"UTF-8\">".to_string(),
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">".to_string(),
    ];
    let title = app
        .props
        .get("title")
        .filter(|v| !v.is_null())
        .map(js_string)
        .unwrap_or_else(|| options.default_title.clone());
    head.push(format!("<title>{}</title>", escape_html(&title)));
    for href in assets.styles.iter().chain(doc_assets.styles.iter()) {
        head.push(format!("<link rel=\"stylesheet\" href=\"{}\">", escape_attr(href)));
    }
    if !motion_presets.is_empty() {
        let css: Vec<String> = motion_presets.iter().map(|p| preset_css(*p)).collect();
        head.push(format!("<style id=\"ir-motion-presets\">\n{}\n</style>", css.join("\n")));
    }
    if has_toast_region {
        head.push(format!("<style id=\"ir-toast-styles\">\n{TOAST_CSS}\n</style>"));
    }

    let mut body = String::new();
    compile_node(app, adapter, &mut body);

    let mut scripts: Vec<String> = Vec::new();
    for src in assets.scripts.iter().chain(doc_assets.scripts.iter()) {
        scripts.push(format!("<script src=\"{}\"></script>", escape_attr(src)));
    }
    if let Some(state) = document.initial_state().filter(|s| !s.is_empty()) {
        scripts.push(format!(
            "<script id=\"{STATE_SCRIPT_ID}\">window.__irState = {};</script>",
            script_json(&Value::Object(state.clone()))
        ));
    }
    if uses_runtime {
        scripts.push(format!("<script id=\"ir-runtime\">\n{RUNTIME_JS}\n</script>"));
    }
    for module in &document.modules {
        scripts.push(format!(
            "<script type=\"module\" id=\"ir-module-{}\">\n{}\n</script>",
            escape_attr(&module.id),
            module.source
        ));
    }

    let lang = app
        .props
        .get("lang")
        .filter(|v| !v.is_null())
        .map(js_string)
        .unwrap_or_else(|| options.default_lang.clone());

    let html = [
        "<!DOCTYPE html>".to_string(),
        format!("<html lang=\"{}\">", escape_attr(&lang)),
        "<head>".to_string(),
        head.join("\n"),
        "</head>".to_string(),
        "<body>".to_string(),
        body,
        scripts.join("\n"),
        "</body>".to_string(),
        "</html>".to_string(),
    ]
    .join("\n");

    debug!(
        adapter = adapter.name(),
        bytes = html.len(),
        uses_runtime,
        presets = motion_presets.len(),
        "compiled page"
    );

    CompiledPage {
        fingerprint: fingerprint(&html),
        html,
        uses_runtime,
        motion_presets,
    }
}

fn fingerprint(html: &str) -> String {
    let mut hasher = DefaultHasher::new();
    html.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// JSON safe to place inside a `<script>` element.
fn script_json(value: &Value) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/")
}

fn collect_presets(app: &Node) -> Vec<MotionPreset> {
    let mut presets: Vec<MotionPreset> = Vec::new();
    let mut add = |preset: MotionPreset| {
        if !presets.contains(&preset) {
            presets.push(preset);
        }
    };
    app.walk(&mut |node| {
        if let Some(preset) = node.motion.as_ref().and_then(|m| m.preset_name()) {
            add(preset);
        }
        for binding in &node.events {
            for effect in &binding.effects {
                if let Effect::RunAnimation { animation: Some(name), .. } = effect {
                    let found = MotionPreset::ALL.iter().find(|p| p.as_str() == name.as_str());
                    if let Some(preset) = found {
                        add(*preset);
                    }
                }
            }
        }
    });
    presets
}

fn render_attrs(attrs: &Attributes) -> String {
    attrs
        .iter()
        .map(|(name, value)| {
            if value.is_empty() {
                name.clone()
            } else {
                format!("{name}=\"{}\"", escape_attr(value))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn compile_node(node: &Node, adapter: &dyn Adapter, out: &mut String) {
    let props = &node.props;
    let resolved = adapter.resolve_tag(&node.node_type, props);
    let tag = resolved.tag;
    let mut attrs = resolved.attrs;

    let token_style = adapter
        .resolve_style(&node.style)
        .iter()
        .map(|(property, value)| format!("{property}:{value}"))
        .collect::<Vec<_>>()
        .join(";");
    let combined = [attrs.get("style").cloned().unwrap_or_default(), token_style]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(";");
    if !combined.is_empty() {
        attrs.insert("style".into(), combined);
    }

    attrs.insert(ATTR_ID.into(), node.id.clone());
    if !node.events.is_empty() {
        let events = serde_json::to_string(&node.events).unwrap_or_else(|_| "[]".to_string());
        attrs.insert(ATTR_EVENTS.into(), events);
    }
    if let Some(motion) = &node.motion {
        let motion = serde_json::to_string(motion).unwrap_or_else(|_| "{}".to_string());
        attrs.insert(ATTR_MOTION.into(), motion);
    }
    for (prop, attr) in [("bind", ATTR_BIND), ("show", ATTR_SHOW)] {
        if let Some(key) = props.get(prop).filter(|v| js_truthy(Some(v))) {
            attrs.insert(attr.into(), js_string(key));
        }
    }
    if node.node_type == NodeType::ToastRegion {
        attrs.insert(ATTR_TOAST_REGION.into(), String::new());
    }
    for (prop, attr) in [
        ("ariaLabel", "aria-label"),
        ("ariaDescribedBy", "aria-describedby"),
        ("role", "role"),
        ("id", "id"),
    ] {
        if let Some(value) = props.get(prop).filter(|v| js_truthy(Some(v))) {
            attrs.insert(attr.into(), js_string(value));
        }
    }

    let rendered = render_attrs(&attrs);
    if rendered.is_empty() {
        out.push_str(&format!("<{tag}>"));
    } else {
        out.push_str(&format!("<{tag} {rendered}>"));
    }
    if VOID_ELEMENTS.contains(&tag.as_str()) {
        return;
    }

    let prefix = adapter.part_prefix();
    let mut dialog_body_open = false;
    match &node.node_type {
        NodeType::Checkbox => {
            let checked = if js_truthy(props.get("checked")) { " checked" } else { "" };
            let name = props
                .get("name")
                .filter(|v| js_truthy(Some(v)))
                .map(|v| format!(" name=\"{}\"", escape_attr(&js_string(v))))
                .unwrap_or_default();
            out.push_str(&format!(
                "<input type=\"checkbox\" class=\"{prefix}-checkbox-input\"{checked}{name}>"
            ));
            if let Some(text) = node.text.as_deref().filter(|t| !t.is_empty()) {
                out.push_str(&format!(
                    "<span class=\"{prefix}-checkbox-label\">{}</span>",
                    escape_html(text)
                ));
            }
        }
        NodeType::Select => render_options(props, out),
        NodeType::Table => render_table(props, out),
        NodeType::Tabs => render_tab_strip(props, prefix, out),
        NodeType::Disclosure => {
            if let Some(summary) = props.get("summary").filter(|v| js_truthy(Some(v))) {
                out.push_str(&format!("<summary>{}</summary>", escape_html(&js_string(summary))));
            }
        }
        NodeType::Dialog => {
            if let Some(title) = props.get("title").filter(|v| js_truthy(Some(v))) {
                out.push_str(&format!(
                    "<div class=\"{prefix}-dialog-header\"><h2 class=\"{prefix}-dialog-title\">{}</h2></div>",
                    escape_html(&js_string(title))
                ));
                out.push_str(&format!("<div class=\"{prefix}-dialog-body\">"));
                dialog_body_open = true;
            }
        }
        NodeType::RichText => {
            // Trusted markup, emitted as-is.
            if let Some(text) = &node.text {
                out.push_str(text);
            }
        }
        _ => {
            if let Some(text) = &node.text {
                out.push_str(&escape_html(text));
            }
        }
    }

    for child in &node.children {
        compile_node(child, adapter, out);
    }
    if dialog_body_open {
        out.push_str("</div>");
    }
    out.push_str(&format!("</{tag}>"));
}

fn field<'a>(item: &'a Value, key: &str) -> Option<&'a Value> {
    item.as_object().and_then(|o| o.get(key))
}

fn render_options(props: &Map<String, Value>, out: &mut String) {
    let Some(options) = props.get("options").and_then(Value::as_array) else { return };
    for option in options {
        let (value, label) = match option {
            Value::Object(_) => (
                field(option, "value").map(js_string).unwrap_or_default(),
                field(option, "label").map(js_string).unwrap_or_default(),
            ),
            other => (js_string(other), js_string(other)),
        };
        let selected = if js_truthy(field(option, "selected")) { " selected" } else { "" };
        out.push_str(&format!(
            "<option value=\"{}\"{selected}>{}</option>",
            escape_attr(&value),
            escape_html(&label)
        ));
    }
}

fn render_table(props: &Map<String, Value>, out: &mut String) {
    let Some(headers) = props.get("headers").and_then(Value::as_array) else { return };
    out.push_str("<thead><tr>");
    for header in headers {
        out.push_str(&format!("<th>{}</th>", escape_html(&js_string(header))));
    }
    out.push_str("</tr></thead>");
    if let Some(rows) = props.get("rows").and_then(Value::as_array) {
        out.push_str("<tbody>");
        for row in rows {
            out.push_str("<tr>");
            for cell in row.as_array().into_iter().flatten() {
                out.push_str(&format!("<td>{}</td>", escape_html(&js_string(cell))));
            }
            out.push_str("</tr>");
        }
        out.push_str("</tbody>");
    }
}

fn render_tab_strip(props: &Map<String, Value>, prefix: &str, out: &mut String) {
    let Some(tabs) = props.get("tabs").and_then(Value::as_array) else { return };
    out.push_str(&format!("<div class=\"{prefix}-pivot-tabs\" role=\"tablist\">"));
    for tab in tabs {
        let active = if js_truthy(field(tab, "active")) {
            format!(" {prefix}-pivot-tab--active")
        } else {
            String::new()
        };
        let panel = field(tab, "id").map(js_string).unwrap_or_default();
        let label = field(tab, "label").map(js_string).unwrap_or_default();
        out.push_str(&format!(
            "<button class=\"{prefix}-pivot-tab{active}\" role=\"tab\" data-panel=\"{}\">{}</button>",
            escape_attr(&panel),
            escape_html(&label)
        ));
    }
    out.push_str("</div>");
}
