use crate::adapter::{
    copy_prop, grid_template, heading_tag, input_attrs, resolve_tokens, spacer_style, truthy_prop,
    Adapter, AdapterAssets, Declarations, ResolvedTag, TokenScale,
};
use pageir_core::model::{
    ColorRole, NodeType, RadiusToken, ShadowToken, SpaceToken, StyleTokens, TypographyToken,
};
use serde_json::{Map, Value};

pub const DEFAULT_ASSET_BASE: &str = "/frameworks/fluent";

/// Targets the Fluent component stylesheet: tokens become theme variables and
/// nodes get the library's component classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemedAdapter {
    asset_base: String,
}

impl Default for ThemedAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemedAdapter {
    pub fn new() -> Self {
        Self::with_asset_base(DEFAULT_ASSET_BASE)
    }

    pub fn with_asset_base(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self { asset_base: base.trim_end_matches('/').to_string() }
    }

    pub fn asset_base(&self) -> &str {
        &self.asset_base
    }
}

impl TokenScale for ThemedAdapter {
    fn space(&self, token: SpaceToken) -> &'static str {
        match token {
            SpaceToken::None => "0",
            SpaceToken::Xs => "var(--spacingXS)",
            SpaceToken::Sm => "var(--spacingS1)",
            SpaceToken::Md => "var(--spacingM)",
            SpaceToken::Lg => "var(--spacingL1)",
            SpaceToken::Xl => "var(--spacingXL)",
            SpaceToken::Xl2 => "var(--spacingXXL)",
            SpaceToken::Xl3 => "var(--spacingXXXL)",
        }
    }

    fn radius(&self, token: RadiusToken) -> &'static str {
        match token {
            RadiusToken::None => "0",
            RadiusToken::Sm => "var(--borderRadiusSmall)",
            RadiusToken::Md => "var(--borderRadiusMedium)",
            RadiusToken::Lg => "var(--borderRadiusLarge)",
            RadiusToken::Xl => "var(--borderRadiusXLarge)",
            RadiusToken::Full => "9999px",
        }
    }

    fn shadow(&self, token: ShadowToken) -> &'static str {
        match token {
            ShadowToken::None => "none",
            ShadowToken::Sm => "var(--shadow2)",
            ShadowToken::Md => "var(--shadow4)",
            ShadowToken::Lg => "var(--shadow8)",
            ShadowToken::Xl => "var(--shadow16)",
        }
    }

    fn color(&self, role: ColorRole) -> &'static str {
        match role {
            ColorRole::Primary => "var(--themePrimary)",
            ColorRole::Secondary | ColorRole::TextSecondary => "var(--neutralSecondary)",
            ColorRole::Success => "var(--greenText)",
            ColorRole::Warning => "var(--yellowText)",
            ColorRole::Danger => "var(--redText)",
            ColorRole::Info => "var(--blueText)",
            ColorRole::Neutral => "var(--neutralPrimary)",
            ColorRole::Surface | ColorRole::Background => "var(--bodyBackground)",
            ColorRole::Text => "var(--bodyText)",
            ColorRole::Border => "var(--neutralLight)",
            ColorRole::Muted => "var(--neutralLighter)",
        }
    }

    fn background(&self, role: ColorRole) -> &'static str {
        match role {
            ColorRole::Secondary | ColorRole::Neutral => "var(--neutralLighter)",
            ColorRole::Success => "var(--greenBackground)",
            ColorRole::Warning => "var(--yellowBackground)",
            ColorRole::Danger => "var(--redBackground)",
            ColorRole::Info => "var(--blueBackground)",
            ColorRole::Muted => "var(--neutralLighterAlt)",
            other => self.color(other),
        }
    }

    fn border_color(&self) -> &'static str {
        "var(--neutralLight)"
    }

    fn typography(&self, token: TypographyToken) -> (&'static str, &'static str, &'static str) {
        match token {
            TypographyToken::Display => ("2.5rem", "700", "1.2"),
            TypographyToken::Headline => ("2rem", "600", "1.25"),
            TypographyToken::Title => ("var(--fontSizeXL)", "600", "1.3"),
            TypographyToken::Subtitle => ("var(--fontSizeLarge)", "500", "1.4"),
            TypographyToken::Body => ("var(--fontSizeMedium)", "400", "1.5"),
            TypographyToken::Caption => ("var(--fontSizeSmall)", "400", "1.4"),
            TypographyToken::Overline => ("var(--fontSizeXSmall)", "600", "1.5"),
            TypographyToken::Code => ("var(--fontSizeSmall)", "400", "1.5"),
        }
    }

    fn monospace(&self) -> &'static str {
        "var(--fontFamilyMonospace, monospace)"
    }
}

fn classed(tag: &str, class: &str) -> ResolvedTag {
    ResolvedTag::new(tag).attr("class", class)
}

impl Adapter for ThemedAdapter {
    fn name(&self) -> &str {
        "themed"
    }

    fn resolve_style(&self, tokens: &StyleTokens) -> Declarations {
        resolve_tokens(self, tokens)
    }

    fn resolve_tag(&self, node_type: &NodeType, props: &Map<String, Value>) -> ResolvedTag {
        match node_type {
            NodeType::App => classed("div", "fluent-app"),
            NodeType::Page => classed("main", "fluent-page"),
            NodeType::Section => classed("section", "fluent-section"),
            NodeType::Box => classed("div", "fluent-box"),
            NodeType::Stack => classed("div", "fluent-stack"),
            NodeType::Grid => classed("div", "fluent-grid")
                .attr("style", format!("grid-template-columns:{}", grid_template(props))),
            NodeType::Cluster => {
                classed("div", "fluent-cluster").attr("style", "display:flex;flex-wrap:wrap")
            }
            NodeType::Spacer => ResolvedTag::new("div")
                .attr("aria-hidden", "true")
                .attr("style", spacer_style(props)),
            NodeType::Divider => classed("hr", "fluent-divider"),
            NodeType::Heading => ResolvedTag::new(heading_tag(props)),
            NodeType::Text => ResolvedTag::new("p"),
            NodeType::RichText => classed("div", "fluent-richtext"),
            NodeType::Image => {
                let mut tag = ResolvedTag::new("img");
                copy_prop(props, "src", &mut tag.attrs, "src");
                copy_prop(props, "alt", &mut tag.attrs, "alt");
                tag
            }
            NodeType::Icon => {
                let mut tag = ResolvedTag::new("span");
                copy_prop(props, "name", &mut tag.attrs, "data-icon");
                tag
            }
            NodeType::Button => {
                let class = match props.get("variant").and_then(Value::as_str) {
                    Some("primary") => "fluent-button fluent-button--primary",
                    Some("subtle") => "fluent-button fluent-button--subtle",
                    Some("icon") => "fluent-button fluent-button--icon",
                    _ => "fluent-button",
                };
                let mut tag = classed("button", class);
                if truthy_prop(props, "disabled") {
                    tag.attrs.insert("disabled".into(), String::new());
                }
                copy_prop(props, "icon", &mut tag.attrs, "data-icon");
                tag
            }
            NodeType::Link => {
                let mut tag = ResolvedTag::new("a");
                copy_prop(props, "href", &mut tag.attrs, "href");
                copy_prop(props, "target", &mut tag.attrs, "target");
                tag
            }
            NodeType::Form => {
                let mut tag = classed("form", "fluent-form");
                copy_prop(props, "action", &mut tag.attrs, "action");
                copy_prop(props, "method", &mut tag.attrs, "method");
                tag
            }
            NodeType::Input => {
                let mut tag = classed("input", "fluent-textfield-input");
                input_attrs(props, &mut tag.attrs);
                tag
            }
            NodeType::Select => {
                let mut tag = classed("select", "fluent-dropdown-select");
                copy_prop(props, "name", &mut tag.attrs, "name");
                if truthy_prop(props, "disabled") {
                    tag.attrs.insert("disabled".into(), String::new());
                }
                tag
            }
            NodeType::Checkbox => classed("label", "fluent-checkbox"),
            NodeType::Card => classed("div", "fluent-card"),
            NodeType::List => classed("ul", "fluent-list"),
            NodeType::Table => classed("table", "fluent-table"),
            NodeType::Badge => classed("span", "fluent-badge"),
            NodeType::Animate => classed("div", "fluent-animate"),
            NodeType::Disclosure => classed("details", "fluent-disclosure"),
            NodeType::Tabs => classed("div", "fluent-pivot"),
            NodeType::Dialog => {
                let mut tag = classed("dialog", "fluent-dialog")
                    .attr("role", "dialog")
                    .attr("aria-modal", "true");
                if truthy_prop(props, "open") {
                    tag.attrs.insert("open".into(), String::new());
                }
                tag
            }
            NodeType::ToastRegion => {
                classed("div", "fluent-toast-region").attr("aria-live", "polite")
            }
            NodeType::Unknown(_) => ResolvedTag::new("div"),
        }
    }

    fn assets(&self) -> AdapterAssets {
        AdapterAssets {
            styles: vec![
                format!("{}/fluent.min.css", self.asset_base),
                format!("{}/theme-light.css", self.asset_base),
            ],
            scripts: vec![format!("{}/fluent.min.js", self.asset_base)],
        }
    }

    fn part_prefix(&self) -> &str {
        "fluent"
    }
}
