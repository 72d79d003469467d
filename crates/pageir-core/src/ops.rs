//! Tree edits.
//!
//! `apply` is total: it never fails and never mutates its input. Ops that
//! reference ids missing from the tree leave it unchanged, and checking
//! whether a batch did what it meant to is left to `validate`.

use crate::diagnostic::Diagnostic;
use crate::error::IrError;
use crate::model::{CoreDocument, EventBinding, MotionSpec, Node, StyleTokens};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    Prepend,
    Append,
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

/// Where an insert lands. The wire form overloads `parentId`: it names the
/// parent for prepend/append and a sibling for before/after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAnchor<'a> {
    IntoParent { parent: &'a str, edge: Edge },
    RelativeToSibling { sibling: &'a str, side: Side },
}

impl InsertPosition {
    pub fn anchor(self, id: &str) -> InsertAnchor<'_> {
        match self {
            InsertPosition::Prepend => InsertAnchor::IntoParent { parent: id, edge: Edge::Start },
            InsertPosition::Append => InsertAnchor::IntoParent { parent: id, edge: Edge::End },
            InsertPosition::Before => {
                InsertAnchor::RelativeToSibling { sibling: id, side: Side::Before }
            }
            InsertPosition::After => {
                InsertAnchor::RelativeToSibling { sibling: id, side: Side::After }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Op {
    UpdateProps {
        node_id: String,
        props: Map<String, Value>,
    },
    UpdateStyle {
        node_id: String,
        style: StyleTokens,
    },
    UpdateText {
        node_id: String,
        text: String,
    },
    Replace {
        node_id: String,
        node: Node,
    },
    Delete {
        node_id: String,
    },
    Insert {
        parent_id: String,
        position: InsertPosition,
        node: Node,
    },
    AddEvent {
        node_id: String,
        event: EventBinding,
    },
    RemoveEvent {
        node_id: String,
        event_index: usize,
    },
    UpdateAnimation {
        node_id: String,
        motion: MotionSpec,
    },
}

impl Op {
    pub const NAMES: &'static [&'static str] = &[
        "updateProps",
        "updateStyle",
        "updateText",
        "replace",
        "delete",
        "insert",
        "addEvent",
        "removeEvent",
        "updateAnimation",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Op::UpdateProps { .. } => "updateProps",
            Op::UpdateStyle { .. } => "updateStyle",
            Op::UpdateText { .. } => "updateText",
            Op::Replace { .. } => "replace",
            Op::Delete { .. } => "delete",
            Op::Insert { .. } => "insert",
            Op::AddEvent { .. } => "addEvent",
            Op::RemoveEvent { .. } => "removeEvent",
            Op::UpdateAnimation { .. } => "updateAnimation",
        }
    }

    /// The id the op addresses (the anchor id for inserts).
    pub fn target_id(&self) -> &str {
        match self {
            Op::Insert { parent_id, .. } => parent_id,
            Op::UpdateProps { node_id, .. }
            | Op::UpdateStyle { node_id, .. }
            | Op::UpdateText { node_id, .. }
            | Op::Replace { node_id, .. }
            | Op::Delete { node_id }
            | Op::AddEvent { node_id, .. }
            | Op::RemoveEvent { node_id, .. }
            | Op::UpdateAnimation { node_id, .. } => node_id,
        }
    }
}

/// Applies `ops` in order to a copy of `document`.
pub fn apply(document: &CoreDocument, ops: &[Op]) -> CoreDocument {
    let mut working = document.clone();
    for (index, op) in ops.iter().enumerate() {
        if apply_op(&mut working.app, op) {
            debug!(index, op = op.name(), id = op.target_id(), "applied op");
        } else {
            debug!(index, op = op.name(), id = op.target_id(), "op matched no node");
        }
    }
    working
}

fn apply_op(root: &mut Node, op: &Op) -> bool {
    match op {
        Op::UpdateProps { node_id, props } => update(root, node_id, |node| {
            for (key, value) in props {
                node.props.insert(key.clone(), value.clone());
            }
        }),
        Op::UpdateStyle { node_id, style } => update(root, node_id, |node| node.style.merge(style)),
        Op::UpdateText { node_id, text } => {
            update(root, node_id, |node| node.text = Some(text.clone()))
        }
        Op::AddEvent { node_id, event } => {
            update(root, node_id, |node| node.events.push(event.clone()))
        }
        Op::RemoveEvent { node_id, event_index } => update(root, node_id, |node| {
            if *event_index < node.events.len() {
                node.events.remove(*event_index);
            }
        }),
        Op::UpdateAnimation { node_id, motion } => {
            update(root, node_id, |node| node.motion = Some(motion.clone()))
        }
        Op::Replace { node_id, node } => replace_all(root, node_id, node),
        Op::Delete { node_id } => delete_all(root, node_id),
        Op::Insert { parent_id, position, node } => match position.anchor(parent_id) {
            InsertAnchor::IntoParent { parent, edge } => insert_into(root, parent, edge, node),
            InsertAnchor::RelativeToSibling { sibling, side } => {
                insert_beside(root, sibling, side, node)
            }
        },
    }
}

/// In-place edits touch the first pre-order match only.
fn update(root: &mut Node, id: &str, edit: impl FnOnce(&mut Node)) -> bool {
    match root.find_mut(id) {
        Some(node) => {
            edit(node);
            true
        }
        None => false,
    }
}

/// Replaces every match, the root included. A replaced subtree is not
/// searched again.
fn replace_all(node: &mut Node, id: &str, replacement: &Node) -> bool {
    if node.id == id {
        *node = replacement.clone();
        return true;
    }
    let mut replaced = false;
    for child in &mut node.children {
        replaced |= replace_all(child, id, replacement);
    }
    replaced
}

/// Removes every non-root match. Only children lists are searched.
fn delete_all(node: &mut Node, id: &str) -> bool {
    let before = node.children.len();
    node.children.retain(|child| child.id != id);
    let mut deleted = node.children.len() != before;
    for child in &mut node.children {
        deleted |= delete_all(child, id);
    }
    deleted
}

fn insert_into(node: &mut Node, parent: &str, edge: Edge, new_node: &Node) -> bool {
    if node.id == parent {
        match edge {
            Edge::Start => node.children.insert(0, new_node.clone()),
            Edge::End => node.children.push(new_node.clone()),
        }
        return true;
    }
    let mut inserted = false;
    for child in &mut node.children {
        inserted |= insert_into(child, parent, edge, new_node);
    }
    inserted
}

/// Splices next to the first sibling found in a children list; when this list
/// has no match, each child subtree is searched in turn.
fn insert_beside(node: &mut Node, sibling: &str, side: Side, new_node: &Node) -> bool {
    if let Some(index) = node.children.iter().position(|child| child.id == sibling) {
        let at = match side {
            Side::Before => index,
            Side::After => index + 1,
        };
        node.children.insert(at, new_node.clone());
        return true;
    }
    let mut inserted = false;
    for child in &mut node.children {
        inserted |= insert_beside(child, sibling, side, new_node);
    }
    inserted
}

/// Ops decoded from raw JSON plus warnings for elements that were skipped.
#[derive(Debug, Clone, Default)]
pub struct DecodedOps {
    pub ops: Vec<Op>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Decodes a JSON array of ops. A non-array input is out of contract; an
/// element that does not decode is dropped with a warning so the rest of the
/// batch survives.
pub fn decode_ops(raw: &Value) -> Result<DecodedOps, IrError> {
    let items = raw
        .as_array()
        .ok_or_else(|| IrError::contract("ops must be a JSON array"))?;
    let mut decoded = DecodedOps::default();
    for (index, item) in items.iter().enumerate() {
        match serde_json::from_value::<Op>(item.clone()) {
            Ok(op) => decoded.ops.push(op),
            Err(err) => {
                debug!(index, error = %err, "skipping undecodable op");
                let path = format!("ops[{index}]");
                decoded.diagnostics.push(Diagnostic::warning(path, format!("skipped op: {err}")));
            }
        }
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColorRole, Effect, MotionPreset, NodeType, RadiusToken};
    use crate::validate::validate;
    use serde_json::json;

    fn sample() -> CoreDocument {
        let mut doc = CoreDocument::new_build("Sample");
        doc.app = doc
            .app
            .with_child(
                Node::new("main", NodeType::Stack)
                    .with_child(Node::new("title", NodeType::Heading).with_text("Hello"))
                    .with_child(
                        Node::new("card", NodeType::Card)
                            .with_child(Node::new("x", NodeType::Text).with_text("gone soon"))
                            .with_child(Node::new("y", NodeType::Text).with_text("stays")),
                    ),
            )
            .with_child(Node::new("footer", NodeType::Section));
        doc
    }

    fn insert(parent: &str, position: InsertPosition, node: Node) -> Op {
        Op::Insert { parent_id: parent.into(), position, node }
    }

    fn text(id: &str) -> Node {
        Node::new(id, NodeType::Text)
    }

    fn animate(id: &str, preset: MotionPreset) -> Op {
        Op::UpdateAnimation { node_id: id.into(), motion: MotionSpec::preset(preset) }
    }

    fn child_ids(node: &Node) -> Vec<&str> {
        node.children.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn op_wire_shape_decodes() {
        let op: Op = serde_json::from_value(json!({
            "op": "insert",
            "parentId": "main",
            "position": "append",
            "node": {"id": "n", "type": "Text", "text": "hi"}
        }))
        .expect("decode");
        assert_eq!(op.name(), "insert");
        assert_eq!(op.target_id(), "main");

        let raw = json!({"op": "removeEvent", "nodeId": "b", "eventIndex": 1});
        let op: Op = serde_json::from_value(raw).expect("decode");
        assert_eq!(op, Op::RemoveEvent { node_id: "b".into(), event_index: 1 });
    }

    #[test]
    fn apply_leaves_input_untouched() {
        let doc = sample();
        let snapshot = doc.clone();
        let out = apply(&doc, &[Op::UpdateText { node_id: "title".into(), text: "Bye".into() }]);
        assert_eq!(doc, snapshot);
        assert_eq!(out.find("title").and_then(|n| n.text.as_deref()), Some("Bye"));
    }

    #[test]
    fn delete_grandchild_only() {
        let doc = sample();
        let out = apply(&doc, &[Op::Delete { node_id: "x".into() }]);
        assert!(out.find("x").is_none());
        let card = out.find("card").expect("card");
        assert_eq!(child_ids(card), vec!["y"]);
        assert_eq!(out.find("title"), doc.find("title"));
        assert_eq!(out.find("footer"), doc.find("footer"));
        assert_eq!(out.ids(), vec!["app", "main", "title", "card", "y", "footer"]);
    }

    #[test]
    fn delete_never_removes_root() {
        let doc = sample();
        let out = apply(&doc, &[Op::Delete { node_id: "app".into() }]);
        assert_eq!(out, doc);
    }

    #[test]
    fn empty_deltas_are_idempotent() {
        let doc = sample();
        let ops = vec![
            Op::UpdateProps { node_id: "title".into(), props: Map::new() },
            Op::UpdateStyle { node_id: "card".into(), style: StyleTokens::default() },
        ];
        assert_eq!(apply(&doc, &ops), doc);
    }

    #[test]
    fn unknown_ids_change_nothing() {
        let doc = sample();
        let ghost = text("ghost");
        let props = json!({"a": 1}).as_object().cloned().unwrap_or_default();
        let style = StyleTokens { radius: Some(RadiusToken::Lg), ..StyleTokens::default() };
        let ops = vec![
            Op::UpdateProps { node_id: "nope".into(), props },
            Op::UpdateStyle { node_id: "nope".into(), style },
            Op::UpdateText { node_id: "nope".into(), text: "t".into() },
            Op::Replace { node_id: "nope".into(), node: ghost.clone() },
            Op::Delete { node_id: "nope".into() },
            insert("nope", InsertPosition::Append, ghost.clone()),
            insert("nope", InsertPosition::Before, ghost),
            Op::AddEvent { node_id: "nope".into(), event: EventBinding::on("click") },
            Op::RemoveEvent { node_id: "nope".into(), event_index: 0 },
            animate("nope", MotionPreset::FadeIn),
        ];
        assert_eq!(apply(&doc, &ops), doc);
    }

    #[test]
    fn update_props_and_style_merge_shallowly() {
        let mut doc = sample();
        doc.app.children[0].props.insert("gap".into(), json!("md"));
        doc.app.children[0].style.color = Some(ColorRole::Text);
        let out = apply(
            &doc,
            &[
                Op::UpdateProps {
                    node_id: "main".into(),
                    props: json!({"direction": "row"}).as_object().cloned().unwrap_or_default(),
                },
                Op::UpdateStyle {
                    node_id: "main".into(),
                    style: StyleTokens { bg: Some(ColorRole::Surface), ..StyleTokens::default() },
                },
            ],
        );
        let main = out.find("main").expect("main");
        assert_eq!(main.props.get("gap"), Some(&json!("md")));
        assert_eq!(main.props.get("direction"), Some(&json!("row")));
        assert_eq!(main.style.color, Some(ColorRole::Text));
        assert_eq!(main.style.bg, Some(ColorRole::Surface));
    }

    #[test]
    fn insert_positions() {
        let doc = sample();
        let out = apply(
            &doc,
            &[
                insert("card", InsertPosition::Prepend, text("p")),
                insert("card", InsertPosition::Append, text("a")),
                insert("y", InsertPosition::Before, text("b")),
                insert("y", InsertPosition::After, text("c")),
            ],
        );
        let card = out.find("card").expect("card");
        assert_eq!(child_ids(card), vec!["p", "x", "b", "y", "c", "a"]);
    }

    #[test]
    fn insert_before_root_is_noop() {
        let doc = sample();
        let out = apply(&doc, &[insert("app", InsertPosition::Before, text("z"))]);
        assert_eq!(out, doc);
    }

    #[test]
    fn replace_swaps_subtree_and_can_replace_root() {
        let doc = sample();
        let card2 = Node::new("card2", NodeType::Box).with_text("new");
        let out = apply(&doc, &[Op::Replace { node_id: "card".into(), node: card2 }]);
        assert!(out.find("x").is_none());
        assert_eq!(out.find("card2").and_then(|n| n.text.as_deref()), Some("new"));

        let root = Node::new("root", NodeType::App);
        let out = apply(&doc, &[Op::Replace { node_id: "app".into(), node: root }]);
        assert_eq!(out.app.id, "root");
        assert!(out.app.children.is_empty());
    }

    #[test]
    fn events_add_and_remove_by_index() {
        let doc = sample();
        let first = EventBinding::on("click").then(Effect::Emit { event: Some("one".into()) });
        let second = EventBinding::on("hover");
        let out = apply(
            &doc,
            &[
                Op::AddEvent { node_id: "title".into(), event: first.clone() },
                Op::AddEvent { node_id: "title".into(), event: second.clone() },
                Op::RemoveEvent { node_id: "title".into(), event_index: 0 },
                Op::RemoveEvent { node_id: "title".into(), event_index: 7 },
            ],
        );
        assert_eq!(out.find("title").expect("title").events, vec![second]);
    }

    #[test]
    fn update_animation_replaces_motion() {
        let doc = sample();
        let out = apply(
            &doc,
            &[animate("card", MotionPreset::FadeIn), animate("card", MotionPreset::Bounce)],
        );
        let motion = out.find("card").and_then(|n| n.motion.as_ref()).expect("motion");
        assert_eq!(motion.preset_name(), Some(MotionPreset::Bounce));
    }

    #[test]
    fn fresh_ids_keep_tree_valid() {
        let doc = sample();
        let out = apply(
            &doc,
            &[
                insert("main", InsertPosition::Append, text("n1").with_child(text("n2"))),
                Op::Replace { node_id: "footer".into(), node: Node::new("n3", NodeType::Section) },
                insert("n3", InsertPosition::After, Node::new("n4", NodeType::Divider)),
            ],
        );
        let diags = validate(&out);
        assert!(diags.iter().all(|d| !d.message.starts_with("Duplicate node ID")), "{diags:?}");
    }

    #[test]
    fn decode_skips_bad_elements() {
        let raw = json!([
            {"op": "updateText", "nodeId": "title", "text": "ok"},
            {"op": "teleport", "nodeId": "title"},
            {"op": "delete"},
            {"op": "delete", "nodeId": "x"}
        ]);
        let decoded = decode_ops(&raw).expect("array");
        assert_eq!(decoded.ops.len(), 2);
        let paths: Vec<&str> = decoded.diagnostics.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["ops[1]", "ops[2]"]);
        assert!(decoded.diagnostics.iter().all(|d| !d.is_error()));

        assert!(matches!(decode_ops(&json!({"op": "delete"})), Err(IrError::Contract(_))));
    }
}
