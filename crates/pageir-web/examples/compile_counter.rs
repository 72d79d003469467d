use pageir_core::{
    apply, validate, Condition, ConditionOp, CoreDocument, Effect, EventBinding, InsertPosition,
    Node, NodeType, Op,
};
use pageir_web::{compile_with, AdapterKind, CompileOptions, MockHost, Page};
use serde_json::json;

fn main() -> Result<(), String> {
    let mut document = CoreDocument::new_build("Counter");
    document.app.props.insert("state".into(), json!({"count": 0}));
    document.app.children = vec![
        Node::new("title", NodeType::Heading).with_prop("level", json!(1)).with_text("Counter"),
        Node::new("count", NodeType::Text).with_prop("bind", json!("count")),
        Node::new("toasts", NodeType::ToastRegion),
    ];

    // The generator side: one edit batch adds the button.
    let button = Node::new("inc", NodeType::Button).with_text("Start").with_event(
        EventBinding::on("click")
            .when(Condition {
                key: "count".into(),
                op: ConditionOp::Lt,
                value: Some(json!(1)),
            })
            .then(Effect::SetState { key: Some("count".into()), value: json!(1) })
            .then(Effect::Toast { message: Some("Started".into()), variant: None }),
    );
    let insert =
        Op::Insert { parent_id: "app".into(), position: InsertPosition::Append, node: button };
    let document = apply(&document, &[insert]);
    for diagnostic in validate(&document) {
        println!("{diagnostic}");
    }

    let compiled = compile_with(&document, AdapterKind::Minimal, "", &CompileOptions::default());
    println!("{}", compiled.html);
    println!("fingerprint: {}", compiled.fingerprint);

    let mut page = Page::load(&compiled.html).map_err(|e| e.to_string())?;
    page.mount();
    let mut host = MockHost::new();
    for _ in 0..2 {
        let ran = page.dispatch("inc", "click", &mut host).map_err(|e| e.to_string())?;
        println!("click ran {ran} effect(s), count = {:?}", page.text_content("count"));
    }
    page.advance(10);
    for toast in page.toasts() {
        println!("toast {:?}: {} (shown: {})", toast.variant, toast.message, toast.shown);
    }
    Ok(())
}
