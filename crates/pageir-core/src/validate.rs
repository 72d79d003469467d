use crate::diagnostic::{has_errors, Diagnostic};
use crate::error::IrError;
use crate::model::{CoreDocument, Node};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Dynamic-execution patterns flagged in script modules. Advisory only.
const DENY_PATTERNS: &[&str] = &[r"\beval\s*\(", r"\bnew\s+Function\s*\(", r"\bimport\s*\("];

static DENY_LIST: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();

fn deny_list() -> &'static [(&'static str, Regex)] {
    DENY_LIST.get_or_init(|| {
        DENY_PATTERNS
            .iter()
            .filter_map(|src| Regex::new(src).ok().map(|re| (*src, re)))
            .collect()
    })
}

/// How a caller treats validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationPolicy {
    /// Report and continue.
    #[default]
    Lenient,
    /// Reject when any error is present.
    Strict,
}

pub fn enforce(policy: ValidationPolicy, diagnostics: &[Diagnostic]) -> Result<(), IrError> {
    if policy == ValidationPolicy::Lenient || !has_errors(diagnostics) {
        return Ok(());
    }
    let errors: Vec<&Diagnostic> = diagnostics.iter().filter(|d| d.is_error()).collect();
    Err(IrError::Rejected {
        count: errors.len(),
        first: errors.first().map(|d| d.to_string()).unwrap_or_default(),
    })
}

/// Static checks over a document. Never mutates or fails; every finding is a
/// diagnostic.
pub fn validate(document: &CoreDocument) -> Vec<Diagnostic> {
    let mut walk = Walk::default();
    walk.node(&document.app, "app".to_string());

    let Walk { mut diagnostics, ids, visited, .. } = walk;

    for (node, path) in visited {
        for (i, binding) in node.events.iter().enumerate() {
            for (j, effect) in binding.effects.iter().enumerate() {
                let Some(target) = effect.target_ref() else { continue };
                if !target.is_empty() && !ids.contains(target) {
                    diagnostics.push(Diagnostic::error(
                        format!("{path}.events[{i}].do[{j}].target"),
                        format!("Target ID \"{target}\" does not exist in document"),
                    ));
                }
            }
        }
    }

    let mut module_ids = HashSet::new();
    for (i, module) in document.modules.iter().enumerate() {
        if !module_ids.insert(module.id.as_str()) {
            diagnostics.push(Diagnostic::error(
                format!("modules[{i}].id"),
                format!("Duplicate module ID: \"{}\"", module.id),
            ));
        }
        for (pattern, re) in deny_list() {
            if re.is_match(&module.source) {
                diagnostics.push(Diagnostic::warning(
                    format!("modules[{i}].source"),
                    format!(
                        "Module \"{}\" contains potentially dangerous pattern: {pattern}",
                        module.id
                    ),
                ));
            }
        }
    }

    diagnostics
}

#[derive(Default)]
struct Walk<'a> {
    diagnostics: Vec<Diagnostic>,
    ids: HashSet<&'a str>,
    reported: HashSet<&'a str>,
    visited: Vec<(&'a Node, String)>,
}

impl<'a> Walk<'a> {
    fn node(&mut self, node: &'a Node, path: String) {
        self.visited.push((node, path.clone()));
        let id = node.id.as_str();
        if !self.ids.insert(id) && self.reported.insert(id) {
            self.diagnostics
                .push(Diagnostic::error(path.clone(), format!("Duplicate node ID: \"{id}\"")));
        }

        if !node.node_type.is_known() {
            self.diagnostics.push(Diagnostic::error(
                format!("{path}.type"),
                format!("Unknown NodeType: \"{}\"", node.node_type),
            ));
        }

        for (i, binding) in node.events.iter().enumerate() {
            let binding_path = format!("{path}.events[{i}]");
            if binding.event.is_empty() {
                self.diagnostics.push(Diagnostic::error(
                    binding_path.clone(),
                    "EventBinding missing \"event\" field",
                ));
            }
            if binding.effects.is_empty() {
                self.diagnostics.push(Diagnostic::warning(
                    binding_path,
                    "EventBinding has empty \"do\" array",
                ));
            }
        }

        for (i, child) in node.children.iter().enumerate() {
            self.node(child, format!("{path}.children[{i}]"));
        }
    }
}
