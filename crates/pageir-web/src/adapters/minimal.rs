use crate::adapter::{
    copy_prop, grid_template, heading_tag, input_attrs, resolve_tokens, spacer_style, truthy_prop,
    Adapter, AdapterAssets, Declarations, ResolvedTag, TokenScale,
};
use pageir_core::model::{
    ColorRole, NodeType, RadiusToken, ShadowToken, SpaceToken, StyleTokens, TypographyToken,
};
use serde_json::{Map, Value};

/// Plain HTML with literal CSS values and no external assets.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalAdapter;

impl TokenScale for MinimalAdapter {
    fn space(&self, token: SpaceToken) -> &'static str {
        match token {
            SpaceToken::None => "0",
            SpaceToken::Xs => "0.25rem",
            SpaceToken::Sm => "0.5rem",
            SpaceToken::Md => "1rem",
            SpaceToken::Lg => "1.5rem",
            SpaceToken::Xl => "2rem",
            SpaceToken::Xl2 => "3rem",
            SpaceToken::Xl3 => "4rem",
        }
    }

    fn radius(&self, token: RadiusToken) -> &'static str {
        match token {
            RadiusToken::None => "0",
            RadiusToken::Sm => "4px",
            RadiusToken::Md => "8px",
            RadiusToken::Lg => "12px",
            RadiusToken::Xl => "16px",
            RadiusToken::Full => "9999px",
        }
    }

    fn shadow(&self, token: ShadowToken) -> &'static str {
        match token {
            ShadowToken::None => "none",
            ShadowToken::Sm => "0 1px 2px rgba(0,0,0,0.05)",
            ShadowToken::Md => "0 4px 6px rgba(0,0,0,0.1)",
            ShadowToken::Lg => "0 10px 15px rgba(0,0,0,0.1)",
            ShadowToken::Xl => "0 20px 25px rgba(0,0,0,0.1)",
        }
    }

    fn color(&self, role: ColorRole) -> &'static str {
        match role {
            ColorRole::Primary => "#0078d4",
            ColorRole::Secondary | ColorRole::Neutral | ColorRole::TextSecondary => "#6c757d",
            ColorRole::Success => "#28a745",
            ColorRole::Warning => "#ffc107",
            ColorRole::Danger => "#dc3545",
            ColorRole::Info => "#17a2b8",
            ColorRole::Surface => "#ffffff",
            ColorRole::Background => "#f5f5f5",
            ColorRole::Text => "#212529",
            ColorRole::Border => "#dee2e6",
            ColorRole::Muted => "#f8f9fa",
        }
    }

    fn border_color(&self) -> &'static str {
        self.color(ColorRole::Border)
    }

    fn typography(&self, token: TypographyToken) -> (&'static str, &'static str, &'static str) {
        match token {
            TypographyToken::Display => ("2.5rem", "700", "1.2"),
            TypographyToken::Headline => ("2rem", "600", "1.25"),
            TypographyToken::Title => ("1.5rem", "600", "1.3"),
            TypographyToken::Subtitle => ("1.25rem", "500", "1.4"),
            TypographyToken::Body => ("1rem", "400", "1.5"),
            TypographyToken::Caption => ("0.875rem", "400", "1.4"),
            TypographyToken::Overline => ("0.75rem", "600", "1.5"),
            TypographyToken::Code => ("0.875rem", "400", "1.5"),
        }
    }

    fn monospace(&self) -> &'static str {
        "monospace"
    }
}

fn base_tag(node_type: &NodeType) -> &'static str {
    match node_type {
        NodeType::Page => "main",
        NodeType::Section => "section",
        NodeType::Divider => "hr",
        NodeType::Text => "p",
        NodeType::Image => "img",
        NodeType::Icon | NodeType::Badge => "span",
        NodeType::Button => "button",
        NodeType::Link => "a",
        NodeType::Form => "form",
        NodeType::Input => "input",
        NodeType::Select => "select",
        NodeType::Checkbox => "label",
        NodeType::List => "ul",
        NodeType::Table => "table",
        NodeType::Disclosure => "details",
        NodeType::Dialog => "dialog",
        _ => "div",
    }
}

impl Adapter for MinimalAdapter {
    fn name(&self) -> &str {
        "minimal"
    }

    fn resolve_style(&self, tokens: &StyleTokens) -> Declarations {
        resolve_tokens(self, tokens)
    }

    fn resolve_tag(&self, node_type: &NodeType, props: &Map<String, Value>) -> ResolvedTag {
        let mut resolved = ResolvedTag::new(base_tag(node_type));
        let attrs = &mut resolved.attrs;
        match node_type {
            NodeType::Heading => return ResolvedTag::new(heading_tag(props)),
            NodeType::Image => {
                copy_prop(props, "src", attrs, "src");
                copy_prop(props, "alt", attrs, "alt");
            }
            NodeType::Link => {
                copy_prop(props, "href", attrs, "href");
                copy_prop(props, "target", attrs, "target");
            }
            NodeType::Input => input_attrs(props, attrs),
            NodeType::Select => {
                copy_prop(props, "name", attrs, "name");
                if truthy_prop(props, "disabled") {
                    attrs.insert("disabled".into(), String::new());
                }
            }
            NodeType::Button => {
                if truthy_prop(props, "disabled") {
                    attrs.insert("disabled".into(), String::new());
                }
                copy_prop(props, "variant", attrs, "data-variant");
            }
            NodeType::Form => {
                copy_prop(props, "action", attrs, "action");
                copy_prop(props, "method", attrs, "method");
            }
            NodeType::Stack => {
                attrs.insert("style".into(), "display:flex;flex-direction:column".into());
            }
            NodeType::Grid => {
                attrs.insert(
                    "style".into(),
                    format!("display:grid;grid-template-columns:{}", grid_template(props)),
                );
            }
            NodeType::Cluster => {
                attrs.insert("style".into(), "display:flex;flex-wrap:wrap".into());
            }
            NodeType::Spacer => {
                attrs.insert("style".into(), spacer_style(props));
                attrs.insert("aria-hidden".into(), "true".into());
            }
            NodeType::Dialog => {
                if truthy_prop(props, "open") {
                    attrs.insert("open".into(), String::new());
                }
            }
            _ => {}
        }
        resolved
    }

    fn assets(&self) -> AdapterAssets {
        AdapterAssets::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageir_core::model::{BorderTokens, EdgeSpacing, LayoutToken, Spacing};
    use serde_json::json;

    #[test]
    fn tokens_resolve_to_literal_css() {
        let css = MinimalAdapter.resolve_style(&StyleTokens {
            space: Some(Spacing::Edges(EdgeSpacing {
                x: Some(SpaceToken::Md),
                top: Some(SpaceToken::Xl2),
                ..EdgeSpacing::default()
            })),
            border: Some(BorderTokens::default()),
            bg: Some(ColorRole::Primary),
            typography: Some(TypographyToken::Code),
            layout: Some(LayoutToken::Hidden),
            opacity: Some(0.5),
            ..StyleTokens::default()
        });
        let flat: Vec<(&str, &str)> = css.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            flat,
            vec![
                ("padding-left", "1rem"),
                ("padding-right", "1rem"),
                ("padding-top", "3rem"),
                ("border", "1px solid #dee2e6"),
                ("background-color", "#0078d4"),
                ("font-size", "0.875rem"),
                ("font-weight", "400"),
                ("line-height", "1.5"),
                ("font-family", "monospace"),
                ("display", "none"),
                ("opacity", "0.5"),
            ]
        );
    }

    #[test]
    fn tags_and_attributes() {
        let props = json!({"columns": 2}).as_object().cloned().unwrap_or_default();
        let grid = MinimalAdapter.resolve_tag(&NodeType::Grid, &props);
        assert_eq!(grid.tag, "div");
        assert_eq!(
            grid.attrs.get("style").map(String::as_str),
            Some("display:grid;grid-template-columns:repeat(2, 1fr)")
        );

        let props = json!({"variant": "primary", "disabled": true});
        let props = props.as_object().cloned().unwrap_or_default();
        let button = MinimalAdapter.resolve_tag(&NodeType::Button, &props);
        assert_eq!(button.tag, "button");
        assert_eq!(button.attrs.get("disabled").map(String::as_str), Some(""));
        assert_eq!(button.attrs.get("data-variant").map(String::as_str), Some("primary"));

        let carousel = NodeType::Unknown("Carousel".into());
        let unknown = MinimalAdapter.resolve_tag(&carousel, &Map::new());
        assert_eq!(unknown.tag, "div");
        assert!(MinimalAdapter.assets().styles.is_empty());
    }
}
