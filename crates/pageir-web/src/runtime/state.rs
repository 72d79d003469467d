use crate::value::{js_number, js_strict_eq, js_string, js_string_opt, js_truthy};
use pageir_core::model::{Condition, ConditionOp};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Page-wide state addressed by dotted paths.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StateStore {
    root: Value,
}

impl StateStore {
    pub fn new(initial: Map<String, Value>) -> Self {
        Self { root: Value::Object(initial) }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Successive lookups; a falsy intermediate is returned as-is, the way
    /// `a && a[k]` short-circuits.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut current = Some(&self.root);
        for segment in key.split('.') {
            current = match current {
                Some(value) if !js_truthy(Some(value)) => return Some(value),
                Some(Value::Object(map)) => map.get(segment),
                Some(Value::Array(items)) => {
                    segment.parse::<usize>().ok().and_then(|i| items.get(i))
                }
                _ => None,
            };
        }
        current
    }

    /// Creates missing intermediate objects. Arrays are addressed by index,
    /// an existing one or the next one (which appends). Returns false,
    /// leaving the store untouched, when the path runs through a scalar or
    /// names an array slot that is not a valid index.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        let mut segments: Vec<&str> = key.split('.').collect();
        let Some(last) = segments.pop() else { return false };
        let mut current = &mut self.root;
        for segment in segments {
            match slot(current, segment, || Value::Object(Map::new())) {
                Some(next) => current = next,
                None => return false,
            }
        }
        match slot(current, last, || Value::Null) {
            Some(target) => {
                *target = value;
                true
            }
            None => false,
        }
    }
}

/// The child `segment` names inside `container`, created with `fill` when
/// missing. Only slots created here are empty, so a later refusal never
/// follows a partial write.
fn slot<'a>(
    container: &'a mut Value,
    segment: &str,
    fill: impl FnOnce() -> Value,
) -> Option<&'a mut Value> {
    match container {
        Value::Object(map) => Some(map.entry(segment.to_string()).or_insert_with(fill)),
        Value::Array(items) => {
            let index = segment.parse::<usize>().ok()?;
            if index == items.len() {
                items.push(fill());
            }
            items.get_mut(index)
        }
        _ => None,
    }
}

fn to_primitive(value: Option<&Value>) -> Option<Value> {
    value.map(|v| match v {
        Value::Array(_) | Value::Object(_) => Value::String(js_string(v)),
        other => other.clone(),
    })
}

/// Relational comparison: strings compare lexically, everything else as
/// numbers, and NaN compares as nothing.
fn relation(a: Option<&Value>, b: Option<&Value>) -> Option<Ordering> {
    let (a, b) = (to_primitive(a), to_primitive(b));
    if let (Some(Value::String(x)), Some(Value::String(y))) = (&a, &b) {
        return Some(x.cmp(y));
    }
    js_number(a.as_ref()).partial_cmp(&js_number(b.as_ref()))
}

pub(crate) fn condition_holds(store: &StateStore, condition: &Condition) -> bool {
    let actual = store.get(&condition.key);
    let expected = condition.value.as_ref();
    match condition.op {
        ConditionOp::Eq => js_strict_eq(actual, expected),
        ConditionOp::Neq => !js_strict_eq(actual, expected),
        ConditionOp::Gt => relation(actual, expected) == Some(Ordering::Greater),
        ConditionOp::Lt => relation(actual, expected) == Some(Ordering::Less),
        ConditionOp::Gte => {
            matches!(relation(actual, expected), Some(Ordering::Greater | Ordering::Equal))
        }
        ConditionOp::Lte => {
            matches!(relation(actual, expected), Some(Ordering::Less | Ordering::Equal))
        }
        ConditionOp::Truthy => js_truthy(actual),
        ConditionOp::Falsy => !js_truthy(actual),
        ConditionOp::Contains => match actual {
            Some(Value::Array(items)) => {
                items.iter().any(|item| js_strict_eq(Some(item), expected))
            }
            other => js_string_opt(other).contains(&js_string_opt(expected)),
        },
    }
}

/// An empty list always holds.
pub(crate) fn conditions_hold(store: &StateStore, conditions: &[Condition]) -> bool {
    conditions.iter().all(|c| condition_holds(store, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(value: Value) -> StateStore {
        StateStore::new(value.as_object().cloned().unwrap_or_default())
    }

    fn cond(key: &str, op: ConditionOp, value: Option<Value>) -> Condition {
        Condition { key: key.to_string(), op, value }
    }

    #[test]
    fn dotted_reads() {
        let s = store(json!({"user": {"name": "Ada", "tags": ["a", "b"]}, "zero": 0}));
        assert_eq!(s.get("user.name"), Some(&json!("Ada")));
        assert_eq!(s.get("user.tags.1"), Some(&json!("b")));
        assert_eq!(s.get("user.missing.deeper"), None);
        assert_eq!(s.get("zero.anything"), Some(&json!(0)));
        assert_eq!(s.get("user.name.length"), None);
    }

    #[test]
    fn writes_create_intermediates() {
        let mut s = store(json!({}));
        assert!(s.set("form.contact.email", json!("a@b.c")));
        assert_eq!(s.root(), &json!({"form": {"contact": {"email": "a@b.c"}}}));
        assert!(s.set("form.contact.email", json!(null)));
        assert_eq!(s.get("form.contact.email"), Some(&Value::Null));
    }

    #[test]
    fn writes_through_arrays_use_indices() {
        let mut s = store(json!({"items": ["a", "b"], "rows": [{"done": false}]}));
        assert!(s.set("items.0", json!("x")));
        assert_eq!(s.get("items.0"), Some(&json!("x")));
        assert!(s.set("items.2", json!("c")));
        assert!(s.set("rows.0.done", json!(true)));
        assert!(s.set("rows.1.done", json!(false)));
        assert_eq!(
            s.root(),
            &json!({"items": ["x", "b", "c"], "rows": [{"done": true}, {"done": false}]})
        );

        assert!(!s.set("items.7", json!("gap")));
        assert!(!s.set("items.first", json!("named")));
        assert_eq!(s.get("items"), Some(&json!(["x", "b", "c"])));
    }

    #[test]
    fn writes_through_scalars_are_refused() {
        let mut s = store(json!({"count": 3}));
        assert!(!s.set("count.value", json!(1)));
        assert_eq!(s.root(), &json!({"count": 3}));
    }

    #[test]
    fn operators() {
        let s = store(json!({"n": 5, "s": "hello world", "list": [1, "x"], "flag": false}));
        assert!(condition_holds(&s, &cond("n", ConditionOp::Eq, Some(json!(5)))));
        assert!(!condition_holds(&s, &cond("n", ConditionOp::Eq, Some(json!("5")))));
        assert!(condition_holds(&s, &cond("n", ConditionOp::Neq, Some(json!("5")))));
        assert!(condition_holds(&s, &cond("n", ConditionOp::Gt, Some(json!(4)))));
        assert!(condition_holds(&s, &cond("n", ConditionOp::Gte, Some(json!("5")))));
        assert!(!condition_holds(&s, &cond("n", ConditionOp::Lt, Some(json!(5)))));
        assert!(condition_holds(&s, &cond("n", ConditionOp::Lte, Some(json!(5)))));
        assert!(!condition_holds(&s, &cond("missing", ConditionOp::Lt, Some(json!(1)))));
        assert!(condition_holds(&s, &cond("s", ConditionOp::Gt, Some(json!("abc")))));
        assert!(condition_holds(&s, &cond("s", ConditionOp::Contains, Some(json!("o w")))));
        assert!(condition_holds(&s, &cond("list", ConditionOp::Contains, Some(json!("x")))));
        assert!(!condition_holds(&s, &cond("list", ConditionOp::Contains, Some(json!("1")))));
        assert!(condition_holds(&s, &cond("flag", ConditionOp::Falsy, None)));
        assert!(!condition_holds(&s, &cond("s", ConditionOp::Falsy, None)));
        assert!(condition_holds(&s, &cond("missing", ConditionOp::Contains, Some(json!("defin")))));
    }

    #[test]
    fn empty_conditions_hold() {
        assert!(conditions_hold(&store(json!({})), &[]));
    }
}
