//! HTML backend for PageIR documents.
//!
//! - [`adapter`] / [`adapters`]: the presentation seam and its two
//!   implementations (themed component library, minimal literal CSS).
//! - [`compile`]: document to full page, deterministic.
//! - [`runtime`]: headless interpreter of the page runtime, for tests and
//!   tooling. [`RUNTIME_JS`] is the same runtime for browsers.
//! - [`value`]: browser-compatible string/truthiness coercions.

pub mod adapter;
pub mod adapters;
pub mod compile;
pub mod runtime;
pub mod value;

pub use adapter::{Adapter, AdapterAssets, AdapterKind, Attributes, Declarations, ResolvedTag};
pub use adapters::{MinimalAdapter, ThemedAdapter};
pub use compile::{compile, compile_page, CompileOptions, CompiledPage};
pub use runtime::{FetchRequest, MockHost, Page, RuntimeError, RuntimeHost};

/// Browser runtime embedded in pages that use events or motion.
pub const RUNTIME_JS: &str = include_str!("pageir-runtime.js");

/// Compiles with the adapter named by `kind`.
pub fn compile_with(
    document: &pageir_core::CoreDocument,
    kind: AdapterKind,
    asset_base: &str,
    options: &CompileOptions,
) -> CompiledPage {
    let adapter = kind.build(asset_base);
    compile_page(document, adapter.as_ref(), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageir_core::model::{Effect, EventBinding, Node, NodeType};
    use pageir_core::CoreDocument;
    use serde_json::json;

    #[test]
    fn runtime_source_is_embeddable() {
        assert!(RUNTIME_JS.contains("window.__irState"));
        assert!(RUNTIME_JS.contains("data-ir-events"));
        assert!(!RUNTIME_JS.contains("</script"));
    }

    #[test]
    fn compiled_page_round_trips_through_headless_runtime() {
        let mut doc = CoreDocument::new_build("Counter");
        doc.app.props.insert("state".into(), json!({"items": []}));
        doc.app.children = vec![
            Node::new("add", NodeType::Button).with_text("Add").with_event(
                EventBinding::on("click").then(Effect::AppendStateArray {
                    key: Some("items".into()),
                    value: json!("a"),
                }),
            ),
            Node::new("list", NodeType::Text).with_prop("bind", json!("items")),
        ];
        for kind in [AdapterKind::Themed, AdapterKind::Minimal] {
            let page = compile_with(&doc, kind, "/assets", &CompileOptions::default());
            assert!(page.uses_runtime);
            let mut runtime = Page::load(&page.html).expect("load");
            runtime.mount();
            let mut host = MockHost::new();
            runtime.dispatch("add", "click", &mut host).expect("click");
            runtime.dispatch("add", "click", &mut host).expect("click");
            assert_eq!(runtime.text_content("list").as_deref(), Some("a,a"));
        }
    }
}
