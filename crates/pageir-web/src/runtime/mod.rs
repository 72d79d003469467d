//! Headless rendition of the page runtime.
//!
//! [`Page`] reads compiled markup back in and interprets the wire attributes
//! the same way the embedded script does in a browser: delegated events,
//! effects, dotted-path state with bound elements, motion triggers, toasts
//! and timers. Network access goes through a [`RuntimeHost`].

mod dom;
mod page;
mod state;

pub use page::Page;

use pageir_core::model::ToastVariant;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Event types the runtime delegates from the document.
pub const DELEGATED_EVENTS: &[&str] = &["click", "submit", "input", "change", "focus", "blur"];

/// Signal name used by `emit` effects that do not name one.
pub const DEFAULT_SIGNAL: &str = "ir:event";

pub const TOAST_SHOW_DELAY_MS: u64 = 10;
pub const TOAST_DISMISS_MS: u64 = 3000;
pub const TOAST_REMOVE_DELAY_MS: u64 = 300;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("malformed markup: {0}")]
    Markup(String),
    #[error("invalid state bootstrap: {0}")]
    Bootstrap(#[source] serde_json::Error),
    #[error("no element with id \"{0}\"")]
    UnknownNode(String),
    #[error("event type \"{0}\" is not delegated")]
    UnsupportedEvent(String),
    #[error("fetch {url} failed: {reason}")]
    Fetch { url: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: String,
    pub url: String,
    /// JSON body, sent for non-GET requests only.
    pub body: Option<Value>,
}

impl FetchRequest {
    pub fn content_type(&self) -> Option<&'static str> {
        self.body.as_ref().map(|_| "application/json")
    }
}

/// Side-effecting capabilities the page needs from its environment.
pub trait RuntimeHost {
    /// Performs the request and returns the decoded JSON response.
    fn fetch(&mut self, request: &FetchRequest) -> Result<Value, RuntimeError>;
}

/// Answers fetches from a fixed table keyed `"METHOD url"` and records every
/// request it sees.
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    responses: HashMap<String, Value>,
    requests: Vec<FetchRequest>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, method: &str, url: &str, body: Value) -> Self {
        self.responses.insert(format!("{} {url}", method.to_ascii_uppercase()), body);
        self
    }

    pub fn requests(&self) -> &[FetchRequest] {
        &self.requests
    }
}

impl RuntimeHost for MockHost {
    fn fetch(&mut self, request: &FetchRequest) -> Result<Value, RuntimeError> {
        self.requests.push(request.clone());
        self.responses
            .get(&format!("{} {}", request.method, request.url))
            .cloned()
            .ok_or_else(|| RuntimeError::Fetch {
                url: request.url.clone(),
                reason: "no response registered".to_string(),
            })
    }
}

/// A custom event dispatched by an `emit` effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub name: String,
    /// `data-ir-id` of the element whose binding emitted it.
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastView {
    pub message: String,
    pub variant: ToastVariant,
    /// Whether the show class is currently applied.
    pub shown: bool,
}

/// A keyframe animation started on an element.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeAnimation {
    pub node_id: Option<String>,
    pub keyframes: Vec<Map<String, Value>>,
    pub duration_ms: u32,
    pub delay_ms: u32,
    pub easing: String,
    /// `f64::INFINITY` for endless animations.
    pub iterations: f64,
    pub fill: String,
}
