use crate::adapters::{MinimalAdapter, ThemedAdapter};
use crate::value::js_string;
use indexmap::IndexMap;
use pageir_core::model::{
    AlignToken, ColorRole, FontWeight, NodeType, RadiusToken, ShadowToken, SpaceToken, Spacing,
    StyleTokens, TypographyToken,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Ordered CSS declarations, property to value.
pub type Declarations = IndexMap<String, String>;

/// Ordered element attributes. An empty value renders as a bare attribute.
pub type Attributes = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTag {
    pub tag: String,
    pub attrs: Attributes,
}

impl ResolvedTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), attrs: Attributes::new() }
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterAssets {
    pub styles: Vec<String>,
    pub scripts: Vec<String>,
}

/// Maps IR node types and style tokens onto a concrete presentation system.
pub trait Adapter {
    fn name(&self) -> &str;

    fn resolve_style(&self, tokens: &StyleTokens) -> Declarations;

    fn resolve_tag(&self, node_type: &NodeType, props: &Map<String, Value>) -> ResolvedTag;

    fn assets(&self) -> AdapterAssets;

    /// Class prefix for the parts the compiler synthesizes inside a node
    /// (checkbox input, tab strip, dialog header).
    fn part_prefix(&self) -> &str {
        "ir"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    #[default]
    Themed,
    Minimal,
}

impl AdapterKind {
    pub fn build(self, asset_base: &str) -> Box<dyn Adapter> {
        match self {
            AdapterKind::Themed => Box::new(ThemedAdapter::with_asset_base(asset_base)),
            AdapterKind::Minimal => Box::new(MinimalAdapter),
        }
    }
}

impl FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "themed" | "fluent" => Ok(AdapterKind::Themed),
            "minimal" | "none" => Ok(AdapterKind::Minimal),
            other => Err(format!("unknown adapter '{other}' (expected themed or minimal)")),
        }
    }
}

/// Concrete values for each token scale. Both adapters share the rest of the
/// token resolution through [`resolve_tokens`].
pub(crate) trait TokenScale {
    fn space(&self, token: SpaceToken) -> &'static str;
    fn radius(&self, token: RadiusToken) -> &'static str;
    fn shadow(&self, token: ShadowToken) -> &'static str;
    fn color(&self, role: ColorRole) -> &'static str;
    fn background(&self, role: ColorRole) -> &'static str {
        self.color(role)
    }
    fn border_color(&self) -> &'static str;
    /// (font-size, font-weight, line-height)
    fn typography(&self, token: TypographyToken) -> (&'static str, &'static str, &'static str);
    fn monospace(&self) -> &'static str;
}

fn font_weight(weight: FontWeight) -> &'static str {
    match weight {
        FontWeight::Normal => "400",
        FontWeight::Medium => "500",
        FontWeight::Semibold => "600",
        FontWeight::Bold => "700",
    }
}

fn flex_align(align: AlignToken) -> &'static str {
    match align {
        AlignToken::Start => "flex-start",
        AlignToken::Center => "center",
        AlignToken::End => "flex-end",
        AlignToken::Stretch => "stretch",
        AlignToken::Between => "space-between",
        AlignToken::Around => "space-around",
        AlignToken::Evenly => "space-evenly",
    }
}

pub(crate) fn resolve_tokens(scale: &impl TokenScale, tokens: &StyleTokens) -> Declarations {
    let mut css = Declarations::new();
    let mut set = |property: &str, value: String| {
        css.insert(property.to_string(), value);
    };

    match &tokens.space {
        Some(Spacing::Uniform(step)) => set("padding", scale.space(*step).to_string()),
        Some(Spacing::Edges(edges)) => {
            if let Some(x) = edges.x {
                set("padding-left", scale.space(x).to_string());
                set("padding-right", scale.space(x).to_string());
            }
            if let Some(y) = edges.y {
                set("padding-top", scale.space(y).to_string());
                set("padding-bottom", scale.space(y).to_string());
            }
            for (property, step) in [
                ("padding-top", edges.top),
                ("padding-right", edges.right),
                ("padding-bottom", edges.bottom),
                ("padding-left", edges.left),
            ] {
                if let Some(step) = step {
                    set(property, scale.space(step).to_string());
                }
            }
        }
        None => {}
    }
    if let Some(radius) = tokens.radius {
        set("border-radius", scale.radius(radius).to_string());
    }
    if let Some(border) = &tokens.border {
        let width = border.width.unwrap_or(1.0);
        let style = border.style.map(|s| s.as_str()).unwrap_or("solid");
        let color = border.color.map(|c| scale.color(c)).unwrap_or(scale.border_color());
        set("border", format!("{width}px {style} {color}"));
    }
    if let Some(shadow) = tokens.shadow {
        set("box-shadow", scale.shadow(shadow).to_string());
    }
    if let Some(color) = tokens.color {
        set("color", scale.color(color).to_string());
    }
    if let Some(bg) = tokens.bg {
        set("background-color", scale.background(bg).to_string());
    }
    if let Some(typography) = tokens.typography {
        let (size, weight, line_height) = scale.typography(typography);
        set("font-size", size.to_string());
        set("font-weight", weight.to_string());
        set("line-height", line_height.to_string());
        match typography {
            TypographyToken::Code => set("font-family", scale.monospace().to_string()),
            TypographyToken::Overline => set("text-transform", "uppercase".to_string()),
            _ => {}
        }
    }
    if let Some(layout) = tokens.layout {
        let display = match layout.as_str() {
            "hidden" => "none",
            other => other,
        };
        set("display", display.to_string());
    }
    if let Some(align) = tokens.align {
        set("align-items", flex_align(align).to_string());
    }
    if let Some(justify) = tokens.justify {
        set("justify-content", flex_align(justify).to_string());
    }
    if let Some(gap) = tokens.gap {
        set("gap", scale.space(gap).to_string());
    }
    for (property, value) in [
        ("width", &tokens.width),
        ("height", &tokens.height),
        ("min-width", &tokens.min_width),
        ("max-width", &tokens.max_width),
        ("min-height", &tokens.min_height),
        ("max-height", &tokens.max_height),
    ] {
        if let Some(value) = value {
            set(property, value.clone());
        }
    }
    if let Some(overflow) = tokens.overflow {
        set("overflow", overflow.as_str().to_string());
    }
    if let Some(opacity) = tokens.opacity {
        set("opacity", opacity.to_string());
    }
    if let Some(weight) = tokens.font_weight {
        set("font-weight", font_weight(weight).to_string());
    }
    if let Some(size) = &tokens.font_size {
        set("font-size", size.clone());
    }
    if let Some(align) = tokens.text_align {
        set("text-align", align.as_str().to_string());
    }
    if let Some(cursor) = &tokens.cursor {
        set("cursor", cursor.clone());
    }
    if let Some(position) = tokens.position {
        set("position", position.as_str().to_string());
    }
    css
}

/// `h1`..`h6` from `props.level`, default 2. Fractional levels truncate
/// toward zero before clamping, so `2.7` is `h2` and `0.5` is `h1`.
pub(crate) fn heading_tag(props: &Map<String, Value>) -> String {
    let level = props
        .get("level")
        .and_then(Value::as_f64)
        .map(|level| level.trunc().clamp(1.0, 6.0) as u8)
        .unwrap_or(2);
    format!("h{level}")
}

pub(crate) fn grid_template(props: &Map<String, Value>) -> String {
    match props.get("columns") {
        Some(Value::Number(n)) => format!("repeat({}, 1fr)", js_string(&Value::Number(n.clone()))),
        Some(other) => js_string(other),
        None => "auto".to_string(),
    }
}

pub(crate) fn spacer_style(props: &Map<String, Value>) -> String {
    let size = props.get("size").map(js_string).unwrap_or_else(|| "1rem".to_string());
    format!("height:{size};flex-shrink:0")
}

pub(crate) fn truthy_prop(props: &Map<String, Value>, key: &str) -> bool {
    crate::value::js_truthy(props.get(key))
}

/// Copies `props[key]` into `attrs[attr]` when the prop is truthy.
pub(crate) fn copy_prop(props: &Map<String, Value>, key: &str, attrs: &mut Attributes, attr: &str) {
    if truthy_prop(props, key) {
        if let Some(value) = props.get(key) {
            attrs.insert(attr.to_string(), js_string(value));
        }
    }
}

/// Attributes common to form inputs in both adapters.
pub(crate) fn input_attrs(props: &Map<String, Value>, attrs: &mut Attributes) {
    let input_type = props
        .get("inputType")
        .or_else(|| props.get("type"))
        .filter(|v| !v.is_null())
        .map(js_string)
        .unwrap_or_else(|| "text".to_string());
    attrs.insert("type".into(), input_type);
    copy_prop(props, "placeholder", attrs, "placeholder");
    copy_prop(props, "name", attrs, "name");
    if let Some(value) = props.get("value") {
        attrs.insert("value".into(), js_string(value));
    }
    if truthy_prop(props, "required") {
        attrs.insert("required".into(), String::new());
    }
    if truthy_prop(props, "disabled") {
        attrs.insert("disabled".into(), String::new());
    }
}
