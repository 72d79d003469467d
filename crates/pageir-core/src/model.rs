use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const FORMAT_VERSION: &str = "1.0";

/// Declares a closed string vocabulary: serde renames, `as_str`, and the full
/// member list used by the schema encoder.
macro_rules! token_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            pub fn names() -> Vec<&'static str> {
                Self::ALL.iter().map(|t| t.as_str()).collect()
            }
        }
    };
}

token_enum!(SpaceToken {
    None => "none", Xs => "xs", Sm => "sm", Md => "md", Lg => "lg", Xl => "xl",
    Xl2 => "2xl", Xl3 => "3xl",
});

token_enum!(RadiusToken {
    None => "none", Sm => "sm", Md => "md", Lg => "lg", Xl => "xl", Full => "full",
});

token_enum!(ShadowToken {
    None => "none", Sm => "sm", Md => "md", Lg => "lg", Xl => "xl",
});

token_enum!(
    /// Semantic color roles. Adapters map these to concrete colors.
    ColorRole {
        Primary => "primary", Secondary => "secondary", Success => "success",
        Warning => "warning", Danger => "danger", Info => "info", Neutral => "neutral",
        Surface => "surface", Background => "background", Text => "text",
        TextSecondary => "textSecondary", Border => "border", Muted => "muted",
    }
);

token_enum!(TypographyToken {
    Display => "display", Headline => "headline", Title => "title", Subtitle => "subtitle",
    Body => "body", Caption => "caption", Overline => "overline", Code => "code",
});

token_enum!(LayoutToken {
    Block => "block", Inline => "inline", Flex => "flex", Grid => "grid", Hidden => "hidden",
});

token_enum!(AlignToken {
    Start => "start", Center => "center", End => "end", Stretch => "stretch",
    Between => "between", Around => "around", Evenly => "evenly",
});

token_enum!(BorderStyle {
    Solid => "solid", Dashed => "dashed", Dotted => "dotted", None => "none",
});

token_enum!(Overflow {
    Auto => "auto", Hidden => "hidden", Scroll => "scroll", Visible => "visible",
});

token_enum!(FontWeight {
    Normal => "normal", Medium => "medium", Semibold => "semibold", Bold => "bold",
});

token_enum!(TextAlign {
    Left => "left", Center => "center", Right => "right", Justify => "justify",
});

token_enum!(Position {
    Static => "static", Relative => "relative", Absolute => "absolute", Fixed => "fixed",
    Sticky => "sticky",
});

token_enum!(ConditionOp {
    Eq => "eq", Neq => "neq", Gt => "gt", Lt => "lt", Gte => "gte", Lte => "lte",
    Truthy => "truthy", Falsy => "falsy", Contains => "contains",
});

token_enum!(HttpMethod {
    Get => "GET", Post => "POST", Put => "PUT", Delete => "DELETE",
});

token_enum!(ToastVariant {
    Info => "info", Success => "success", Warning => "warning", Danger => "danger",
});

token_enum!(MotionPreset {
    FadeIn => "fadeIn", FadeOut => "fadeOut", SlideUp => "slideUp", SlideDown => "slideDown",
    SlideLeft => "slideLeft", SlideRight => "slideRight", ScaleIn => "scaleIn",
    ScaleOut => "scaleOut", Bounce => "bounce", Shake => "shake", Pulse => "pulse",
    Spin => "spin",
});

token_enum!(MotionTrigger {
    OnMount => "onMount", OnVisible => "onVisible", OnHover => "onHover",
    OnPress => "onPress", OnState => "onState",
});

token_enum!(FillMode {
    Forwards => "forwards", Backwards => "backwards", Both => "both", None => "none",
});

/// The UI primitives a node can take. Names outside the known set are kept
/// verbatim in `Unknown` so the validator can report them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    App,
    Page,
    Section,
    Box,
    Stack,
    Grid,
    Cluster,
    Spacer,
    Divider,
    Heading,
    Text,
    RichText,
    Image,
    Icon,
    Button,
    Link,
    Form,
    Input,
    Select,
    Checkbox,
    Card,
    List,
    Table,
    Badge,
    Animate,
    Disclosure,
    Tabs,
    Dialog,
    ToastRegion,
    Unknown(String),
}

impl NodeType {
    pub const KNOWN: &'static [NodeType] = &[
        NodeType::App,
        NodeType::Page,
        NodeType::Section,
        NodeType::Box,
        NodeType::Stack,
        NodeType::Grid,
        NodeType::Cluster,
        NodeType::Spacer,
        NodeType::Divider,
        NodeType::Heading,
        NodeType::Text,
        NodeType::RichText,
        NodeType::Image,
        NodeType::Icon,
        NodeType::Button,
        NodeType::Link,
        NodeType::Form,
        NodeType::Input,
        NodeType::Select,
        NodeType::Checkbox,
        NodeType::Card,
        NodeType::List,
        NodeType::Table,
        NodeType::Badge,
        NodeType::Animate,
        NodeType::Disclosure,
        NodeType::Tabs,
        NodeType::Dialog,
        NodeType::ToastRegion,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            NodeType::App => "App",
            NodeType::Page => "Page",
            NodeType::Section => "Section",
            NodeType::Box => "Box",
            NodeType::Stack => "Stack",
            NodeType::Grid => "Grid",
            NodeType::Cluster => "Cluster",
            NodeType::Spacer => "Spacer",
            NodeType::Divider => "Divider",
            NodeType::Heading => "Heading",
            NodeType::Text => "Text",
            NodeType::RichText => "RichText",
            NodeType::Image => "Image",
            NodeType::Icon => "Icon",
            NodeType::Button => "Button",
            NodeType::Link => "Link",
            NodeType::Form => "Form",
            NodeType::Input => "Input",
            NodeType::Select => "Select",
            NodeType::Checkbox => "Checkbox",
            NodeType::Card => "Card",
            NodeType::List => "List",
            NodeType::Table => "Table",
            NodeType::Badge => "Badge",
            NodeType::Animate => "Animate",
            NodeType::Disclosure => "Disclosure",
            NodeType::Tabs => "Tabs",
            NodeType::Dialog => "Dialog",
            NodeType::ToastRegion => "ToastRegion",
            NodeType::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, NodeType::Unknown(_))
    }

    pub fn names() -> Vec<&'static str> {
        Self::KNOWN_NAMES.to_vec()
    }

    pub const KNOWN_NAMES: &'static [&'static str] = &[
        "App", "Page", "Section", "Box", "Stack", "Grid", "Cluster", "Spacer", "Divider",
        "Heading", "Text", "RichText", "Image", "Icon", "Button", "Link", "Form", "Input",
        "Select", "Checkbox", "Card", "List", "Table", "Badge", "Animate", "Disclosure", "Tabs",
        "Dialog", "ToastRegion",
    ];
}

impl From<String> for NodeType {
    fn from(name: String) -> Self {
        NodeType::KNOWN
            .iter()
            .find(|t| t.as_str() == name)
            .cloned()
            .unwrap_or(NodeType::Unknown(name))
    }
}

impl From<NodeType> for String {
    fn from(t: NodeType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpacing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<SpaceToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<SpaceToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<SpaceToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<SpaceToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<SpaceToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<SpaceToken>,
}

/// Padding, either one step for every edge or split per axis/edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Spacing {
    Uniform(SpaceToken),
    Edges(EdgeSpacing),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BorderTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<BorderStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorRole>,
}

/// Semantic style vocabulary. The string fields are the only places where a
/// raw CSS value may appear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<Spacing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<RadiusToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<BorderTokens>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<ColorRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typography: Option<TypographyToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<AlignToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justify: Option<AlignToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<SpaceToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overflow: Option<Overflow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl StyleTokens {
    pub fn is_empty(&self) -> bool {
        *self == StyleTokens::default()
    }

    /// Shallow merge: every field set in `patch` overwrites the current one.
    pub fn merge(&mut self, patch: &StyleTokens) {
        macro_rules! overlay {
            ($($field:ident),+) => {
                $(
                    if patch.$field.is_some() {
                        self.$field = patch.$field.clone();
                    }
                )+
            };
        }
        overlay!(
            space, radius, border, shadow, color, bg, typography, layout, align, justify, gap,
            width, height, min_width, max_width, min_height, max_height, overflow, opacity,
            font_weight, font_size, text_align, cursor, position
        );
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    pub op: ConditionOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// One side effect of an event binding, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Effect {
    ToggleTarget {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },
    SetState {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        #[serde(default)]
        value: Value,
    },
    AppendStateArray {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        #[serde(default)]
        value: Value,
    },
    FetchJson {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<HttpMethod>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result_key: Option<String>,
    },
    Emit {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event: Option<String>,
    },
    RunAnimation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        animation: Option<String>,
    },
    Focus {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
    },
    Toast {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant: Option<ToastVariant>,
    },
}

impl Effect {
    pub const KINDS: &'static [&'static str] = &[
        "toggleTarget",
        "setState",
        "appendStateArray",
        "fetchJson",
        "emit",
        "runAnimation",
        "focus",
        "toast",
    ];

    pub fn kind(&self) -> &'static str {
        match self {
            Effect::ToggleTarget { .. } => "toggleTarget",
            Effect::SetState { .. } => "setState",
            Effect::AppendStateArray { .. } => "appendStateArray",
            Effect::FetchJson { .. } => "fetchJson",
            Effect::Emit { .. } => "emit",
            Effect::RunAnimation { .. } => "runAnimation",
            Effect::Focus { .. } => "focus",
            Effect::Toast { .. } => "toast",
        }
    }

    /// The node id this effect points at, for the effects that address nodes.
    pub fn target_ref(&self) -> Option<&str> {
        match self {
            Effect::ToggleTarget { target }
            | Effect::RunAnimation { target, .. }
            | Effect::Focus { target, .. } => target.as_deref(),
            _ => None,
        }
    }
}

/// "On `event`, if every `when` holds, run `do` in order."
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBinding {
    #[serde(default)]
    pub event: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub when: Vec<Condition>,
    #[serde(rename = "do", default)]
    pub effects: Vec<Effect>,
}

impl EventBinding {
    pub fn on(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            when: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.when.push(condition);
        self
    }

    pub fn then(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Iterations {
    Count(u32),
    Keyword(IterationKeyword),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IterationKeyword {
    #[serde(rename = "infinite")]
    Infinite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetMotion {
    pub preset: MotionPreset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<MotionTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyframeMotion {
    pub keyframes: Vec<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<Iterations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<MotionTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum MotionSpec {
    Preset(PresetMotion),
    Keyframes(KeyframeMotion),
}

impl MotionSpec {
    pub fn preset(preset: MotionPreset) -> Self {
        MotionSpec::Preset(PresetMotion {
            preset,
            duration: None,
            delay: None,
            easing: None,
            trigger: None,
            state_key: None,
        })
    }

    /// Unspecified triggers mean "on mount".
    pub fn trigger(&self) -> MotionTrigger {
        let trigger = match self {
            MotionSpec::Preset(p) => p.trigger,
            MotionSpec::Keyframes(k) => k.trigger,
        };
        trigger.unwrap_or(MotionTrigger::OnMount)
    }

    pub fn preset_name(&self) -> Option<MotionPreset> {
        match self {
            MotionSpec::Preset(p) => Some(p.preset),
            MotionSpec::Keyframes(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,
    #[serde(default, skip_serializing_if = "StyleTokens::is_empty")]
    pub style: StyleTokens,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<MotionSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            props: Map::new(),
            style: StyleTokens::default(),
            events: Vec::new(),
            motion: None,
            children: Vec::new(),
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    pub fn with_style(mut self, style: StyleTokens) -> Self {
        self.style = style;
        self
    }

    pub fn with_event(mut self, binding: EventBinding) -> Self {
        self.events.push(binding);
        self
    }

    pub fn with_motion(mut self, motion: MotionSpec) -> Self {
        self.motion = Some(motion);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    /// First node with `id` in pre-order, including `self`.
    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Pre-order visit of this node and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub fn any(&self, predicate: &impl Fn(&Node) -> bool) -> bool {
        predicate(self) || self.children.iter().any(|child| child.any(predicate))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAssets {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<String>,
}

/// Escape-hatch script for behavior the IR cannot express. Rendered verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptModule {
    pub id: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreDocument {
    pub version: String,
    pub app: Node,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<DocumentAssets>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<ScriptModule>,
}

impl CoreDocument {
    /// An App with no children: the starting point of a new build.
    pub fn new_build(title: impl Into<String>) -> Self {
        let app = Node::new("app", NodeType::App).with_prop("title", Value::String(title.into()));
        Self {
            version: FORMAT_VERSION.to_string(),
            app,
            assets: None,
            modules: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn is_new_build(&self) -> bool {
        self.app.children.is_empty()
    }

    pub fn title(&self) -> Option<&str> {
        self.app.prop_str("title")
    }

    pub fn lang(&self) -> Option<&str> {
        self.app.prop_str("lang")
    }

    pub fn initial_state(&self) -> Option<&Map<String, Value>> {
        self.app.props.get("state").and_then(Value::as_object)
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        self.app.find(id)
    }

    /// Every node id in pre-order, duplicates included.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.app.walk(&mut |node| ids.push(node.id.as_str()));
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_type_round_trip_keeps_unknown_names() {
        let known: NodeType = serde_json::from_value(json!("Button")).unwrap();
        assert_eq!(known, NodeType::Button);
        let unknown: NodeType = serde_json::from_value(json!("Carousel")).unwrap();
        assert_eq!(unknown, NodeType::Unknown("Carousel".to_string()));
        assert_eq!(serde_json::to_value(&unknown).unwrap(), json!("Carousel"));
        assert_eq!(NodeType::names().len(), 29);
        assert!(!NodeType::names().contains(&""));
    }

    #[test]
    fn document_parses_full_node_shape() {
        let doc: CoreDocument = serde_json::from_value(json!({
            "version": "1.0",
            "app": {
                "id": "app",
                "type": "App",
                "props": {"title": "Demo", "lang": "de", "state": {"count": 0}},
                "children": [{
                    "id": "b1",
                    "type": "Button",
                    "text": "Go",
                    "style": {"space": {"x": "md", "y": "sm"}, "radius": "full", "bg": "primary"},
                    "events": [{
                        "event": "click",
                        "when": [{"key": "count", "op": "lt", "value": 3}],
                        "do": [
                            {"type": "setState", "key": "count", "value": 1},
                            {"type": "toast", "message": "hi", "variant": "success"}
                        ]
                    }],
                    "motion": {"mode": "preset", "preset": "fadeIn", "duration": 200, "trigger": "onVisible"}
                }]
            },
            "modules": [{"id": "m1", "source": "console.log(1)"}]
        }))
        .unwrap();

        assert_eq!(doc.title(), Some("Demo"));
        assert_eq!(doc.lang(), Some("de"));
        assert_eq!(doc.initial_state().unwrap()["count"], json!(0));
        let button = doc.find("b1").unwrap();
        assert_eq!(button.node_type, NodeType::Button);
        assert_eq!(
            button.style.space,
            Some(Spacing::Edges(EdgeSpacing {
                x: Some(SpaceToken::Md),
                y: Some(SpaceToken::Sm),
                ..EdgeSpacing::default()
            }))
        );
        assert_eq!(button.events[0].effects.len(), 2);
        assert_eq!(button.motion.as_ref().unwrap().trigger(), MotionTrigger::OnVisible);
        assert_eq!(doc.ids(), vec!["app", "b1"]);
    }

    #[test]
    fn keyframe_motion_iterations() {
        let motion: MotionSpec = serde_json::from_value(json!({
            "mode": "keyframes",
            "keyframes": [{"opacity": 0}, {"opacity": 1}],
            "iterations": "infinite",
            "fill": "both"
        }))
        .unwrap();
        match &motion {
            MotionSpec::Keyframes(k) => {
                assert_eq!(k.iterations, Some(Iterations::Keyword(IterationKeyword::Infinite)));
                assert_eq!(k.keyframes.len(), 2);
            }
            other => panic!("expected keyframes, got {other:?}"),
        }
        assert_eq!(motion.trigger(), MotionTrigger::OnMount);
        assert_eq!(motion.preset_name(), None);
    }

    #[test]
    fn style_merge_is_shallow_overlay() {
        let mut base = StyleTokens {
            color: Some(ColorRole::Text),
            radius: Some(RadiusToken::Sm),
            ..StyleTokens::default()
        };
        base.merge(&StyleTokens {
            radius: Some(RadiusToken::Lg),
            width: Some("50%".to_string()),
            ..StyleTokens::default()
        });
        assert_eq!(base.color, Some(ColorRole::Text));
        assert_eq!(base.radius, Some(RadiusToken::Lg));
        assert_eq!(base.width.as_deref(), Some("50%"));

        let before = base.clone();
        base.merge(&StyleTokens::default());
        assert_eq!(base, before);
    }

    #[test]
    fn new_build_document() {
        let doc = CoreDocument::new_build("Landing");
        assert!(doc.is_new_build());
        assert_eq!(doc.version, FORMAT_VERSION);
        assert_eq!(doc.title(), Some("Landing"));
        let json = doc.to_json_pretty().unwrap();
        assert_eq!(CoreDocument::from_json(&json).unwrap(), doc);
    }

    #[test]
    fn effect_target_refs() {
        let effect: Effect =
            serde_json::from_value(json!({"type": "focus", "target": "email"})).unwrap();
        assert_eq!(effect.target_ref(), Some("email"));
        assert_eq!(effect.kind(), "focus");
        let effect: Effect =
            serde_json::from_value(json!({"type": "setState", "key": "a", "value": null})).unwrap();
        assert_eq!(effect.target_ref(), None);
    }
}
