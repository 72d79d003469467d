//! JSON Schemas for generated output, plus the hydration step.
//!
//! Constrained decoders require every object to be closed
//! (`additionalProperties: false`), which rules out the free-form IR fields.
//! In the generation schema `props`, `style`, `events`, `event` and `motion`
//! are therefore JSON-encoded strings, and [`hydrate_ops`] parses them back
//! before the ops are decoded.

use crate::model::{
    AlignToken, BorderStyle, ColorRole, ConditionOp, Effect, FillMode, FontWeight, HttpMethod,
    LayoutToken, MotionPreset, MotionTrigger, NodeType, Overflow, Position, RadiusToken,
    ShadowToken, SpaceToken, TextAlign, ToastVariant, TypographyToken,
};
use crate::ops::Op;
use serde_json::{json, Map, Value};

const NODE_ENCODED_FIELDS: &[&str] = &["props", "style", "events", "motion"];
const OP_ENCODED_FIELDS: &[&str] = &["props", "style", "event", "motion"];

fn encoded(what: &str) -> Value {
    json!({"type": "string", "description": format!("JSON-encoded {what}")})
}

fn closed(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

fn op_variant(op: &str, mut properties: Map<String, Value>, required: &[&str]) -> Value {
    let mut all = Map::new();
    all.insert("op".into(), json!({"type": "string", "const": op}));
    all.append(&mut properties);
    let mut req = vec!["op"];
    req.extend_from_slice(required);
    closed(Value::Object(all), &req)
}

fn props(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Generation schema for an array of ops.
pub fn ops_schema() -> Value {
    let node_ref = json!({"$ref": "#/$defs/Node"});
    let variants = vec![
        op_variant(
            "updateProps",
            props(json!({"nodeId": {"type": "string"}, "props": encoded("props object to merge")})),
            &["nodeId", "props"],
        ),
        op_variant(
            "updateStyle",
            props(json!({
                "nodeId": {"type": "string"},
                "style": encoded("StyleTokens object to merge"),
            })),
            &["nodeId", "style"],
        ),
        op_variant(
            "updateText",
            props(json!({"nodeId": {"type": "string"}, "text": {"type": "string"}})),
            &["nodeId", "text"],
        ),
        op_variant(
            "replace",
            props(json!({"nodeId": {"type": "string"}, "node": node_ref.clone()})),
            &["nodeId", "node"],
        ),
        op_variant("delete", props(json!({"nodeId": {"type": "string"}})), &["nodeId"]),
        op_variant(
            "insert",
            props(json!({
                "parentId": {"type": "string"},
                "position": {"type": "string", "enum": ["prepend", "append", "before", "after"]},
                "node": node_ref
            })),
            &["parentId", "position", "node"],
        ),
        op_variant(
            "addEvent",
            props(json!({"nodeId": {"type": "string"}, "event": encoded("EventBinding object")})),
            &["nodeId", "event"],
        ),
        op_variant(
            "removeEvent",
            props(json!({"nodeId": {"type": "string"}, "eventIndex": {"type": "number"}})),
            &["nodeId", "eventIndex"],
        ),
        op_variant(
            "updateAnimation",
            props(json!({"nodeId": {"type": "string"}, "motion": encoded("MotionSpec object")})),
            &["nodeId", "motion"],
        ),
    ];

    json!({
        "type": "array",
        "items": {"anyOf": variants},
        "$defs": {
            "Node": closed(
                json!({
                    "id": {"type": "string"},
                    "type": {"type": "string", "enum": NodeType::names()},
                    "props": encoded("props object"),
                    "style": encoded("StyleTokens object"),
                    "events": encoded("EventBinding[] array"),
                    "motion": encoded("MotionSpec object"),
                    "children": {"type": "array", "items": {"$ref": "#/$defs/Node"}},
                    "text": {"type": "string"}
                }),
                &["id", "type"],
            )
        }
    })
}

fn enum_of(names: Vec<&'static str>) -> Value {
    json!({"type": "string", "enum": names})
}

fn style_schema() -> Value {
    let space = enum_of(SpaceToken::names());
    let color = enum_of(ColorRole::names());
    let align = enum_of(AlignToken::names());
    json!({
        "type": "object",
        "properties": {
            "space": {"oneOf": [
                space.clone(),
                {
                    "type": "object",
                    "properties": {
                        "x": space.clone(), "y": space.clone(), "top": space.clone(),
                        "right": space.clone(), "bottom": space.clone(), "left": space.clone()
                    },
                    "additionalProperties": false
                }
            ]},
            "radius": enum_of(RadiusToken::names()),
            "border": {
                "type": "object",
                "properties": {
                    "width": {"type": "number"},
                    "style": enum_of(BorderStyle::names()),
                    "color": color.clone()
                },
                "additionalProperties": false
            },
            "shadow": enum_of(ShadowToken::names()),
            "color": color.clone(),
            "bg": color,
            "typography": enum_of(TypographyToken::names()),
            "layout": enum_of(LayoutToken::names()),
            "align": align.clone(),
            "justify": align,
            "gap": space,
            "width": {"type": "string"},
            "height": {"type": "string"},
            "minWidth": {"type": "string"},
            "maxWidth": {"type": "string"},
            "minHeight": {"type": "string"},
            "maxHeight": {"type": "string"},
            "overflow": enum_of(Overflow::names()),
            "opacity": {"type": "number", "minimum": 0, "maximum": 1},
            "fontWeight": enum_of(FontWeight::names()),
            "fontSize": {"type": "string"},
            "textAlign": enum_of(TextAlign::names()),
            "cursor": {"type": "string"},
            "position": enum_of(Position::names())
        },
        "additionalProperties": false
    })
}

fn binding_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "event": {"type": "string"},
            "when": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "key": {"type": "string"},
                        "op": enum_of(ConditionOp::names()),
                        "value": {}
                    },
                    "required": ["key", "op"]
                }
            },
            "do": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": {"type": "string", "enum": Effect::KINDS},
                        "target": {"type": "string"},
                        "key": {"type": "string"},
                        "value": {},
                        "url": {"type": "string"},
                        "method": enum_of(HttpMethod::names()),
                        "body": {},
                        "resultKey": {"type": "string"},
                        "event": {"type": "string"},
                        "animation": {"type": "string"},
                        "selector": {"type": "string"},
                        "message": {"type": "string"},
                        "variant": enum_of(ToastVariant::names())
                    },
                    "required": ["type"]
                }
            }
        },
        "required": ["event", "do"]
    })
}

fn motion_schema() -> Value {
    let trigger = enum_of(MotionTrigger::names());
    json!({
        "oneOf": [
            {
                "type": "object",
                "properties": {
                    "mode": {"const": "preset"},
                    "preset": enum_of(MotionPreset::names()),
                    "duration": {"type": "number"},
                    "delay": {"type": "number"},
                    "easing": {"type": "string"},
                    "trigger": trigger.clone(),
                    "stateKey": {"type": "string"}
                },
                "required": ["mode", "preset"]
            },
            {
                "type": "object",
                "properties": {
                    "mode": {"const": "keyframes"},
                    "keyframes": {"type": "array", "items": {"type": "object"}},
                    "duration": {"type": "number"},
                    "delay": {"type": "number"},
                    "easing": {"type": "string"},
                    "iterations": {"oneOf": [{"type": "number"}, {"const": "infinite"}]},
                    "fill": enum_of(FillMode::names()),
                    "trigger": trigger,
                    "stateKey": {"type": "string"}
                },
                "required": ["mode", "keyframes"]
            }
        ]
    })
}

/// Structural schema of a whole document, with the free-form fields typed.
pub fn document_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "CoreDocument",
        "type": "object",
        "properties": {
            "version": {"type": "string"},
            "app": {"$ref": "#/$defs/Node"},
            "assets": {
                "type": "object",
                "properties": {
                    "styles": {"type": "array", "items": {"type": "string"}},
                    "scripts": {"type": "array", "items": {"type": "string"}}
                },
                "additionalProperties": false
            },
            "modules": {
                "type": "array",
                "items": closed(
                    json!({"id": {"type": "string"}, "source": {"type": "string"}}),
                    &["id", "source"],
                )
            }
        },
        "required": ["version", "app"],
        "$defs": {
            "Node": {
                "type": "object",
                "properties": {
                    "id": {"type": "string"},
                    "type": enum_of(NodeType::names()),
                    "props": {"type": "object"},
                    "style": {"$ref": "#/$defs/StyleTokens"},
                    "events": {"type": "array", "items": {"$ref": "#/$defs/EventBinding"}},
                    "motion": {"$ref": "#/$defs/MotionSpec"},
                    "children": {"type": "array", "items": {"$ref": "#/$defs/Node"}},
                    "text": {"type": "string"}
                },
                "required": ["id", "type"],
                "additionalProperties": false
            },
            "StyleTokens": style_schema(),
            "EventBinding": binding_schema(),
            "MotionSpec": motion_schema()
        }
    })
}

/// Parses a string holding JSON; anything that does not parse stays as the
/// raw string for the decoder to reject later.
fn try_parse(value: &mut Value) {
    if let Value::String(raw) = value {
        if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
            *value = parsed;
        }
    }
}

/// Restores the string-encoded fields of a generated node, recursively.
pub fn hydrate_node(raw: &Value) -> Value {
    let mut node = raw.clone();
    hydrate_node_in_place(&mut node);
    node
}

fn hydrate_node_in_place(node: &mut Value) {
    let Some(fields) = node.as_object_mut() else { return };
    for key in NODE_ENCODED_FIELDS {
        if let Some(value) = fields.get_mut(*key) {
            try_parse(value);
        }
    }
    if let Some(Value::Array(children)) = fields.get_mut("children") {
        children.iter_mut().for_each(hydrate_node_in_place);
    }
}

/// Restores the string-encoded fields of generated ops. Non-object items pass
/// through unchanged.
pub fn hydrate_ops(raw: &[Value]) -> Vec<Value> {
    raw.iter()
        .map(|op| {
            let mut op = op.clone();
            if let Some(fields) = op.as_object_mut() {
                if let Some(node) = fields.get_mut("node") {
                    if node.is_object() {
                        hydrate_node_in_place(node);
                    }
                }
                for key in OP_ENCODED_FIELDS {
                    if let Some(value) = fields.get_mut(*key) {
                        try_parse(value);
                    }
                }
            }
            op
        })
        .collect()
}

fn stringify(value: &mut Value) {
    if !value.is_string() {
        *value = Value::String(value.to_string());
    }
}

fn encode_node_in_place(node: &mut Value) {
    let Some(fields) = node.as_object_mut() else { return };
    for key in NODE_ENCODED_FIELDS {
        if let Some(value) = fields.get_mut(*key) {
            stringify(value);
        }
    }
    if let Some(Value::Array(children)) = fields.get_mut("children") {
        children.iter_mut().for_each(encode_node_in_place);
    }
}

/// Inverse of [`hydrate_ops`]: ops in the shape the generation schema accepts.
pub fn encode_ops(ops: &[Op]) -> Result<Vec<Value>, serde_json::Error> {
    ops.iter()
        .map(|op| {
            let mut value = serde_json::to_value(op)?;
            if let Some(fields) = value.as_object_mut() {
                if let Some(node) = fields.get_mut("node") {
                    encode_node_in_place(node);
                }
                for key in OP_ENCODED_FIELDS {
                    if let Some(field) = fields.get_mut(*key) {
                        stringify(field);
                    }
                }
            }
            Ok(value)
        })
        .collect()
}
