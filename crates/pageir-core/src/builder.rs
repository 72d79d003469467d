//! The boundary to whatever generates ops.
//!
//! A [`Builder`] is handed the current document and an instruction and comes
//! back with ops, a plain reply, or a failure. [`transform_page`] applies the
//! ops, validates the result and reports what changed. Retries and timeouts
//! belong to the builder implementation, not to this module.

use crate::diagnostic::{Diagnostic, Severity};
use crate::error::IrError;
use crate::model::CoreDocument;
use crate::ops::{apply, decode_ops, Op};
use crate::schema::hydrate_ops;
use crate::validate::validate;
use serde_json::Value;
use std::future::Future;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Pretty-printed JSON of the current document.
    pub current_page: String,
    pub message: String,
    /// True when the App has no children yet.
    pub new_build: bool,
}

impl BuildRequest {
    pub fn new(document: &CoreDocument, message: impl Into<String>) -> Result<Self, IrError> {
        Ok(Self {
            current_page: document.to_json_pretty()?,
            message: message.into(),
            new_build: document.is_new_build(),
        })
    }

    /// Plain-text prompt for completion-style builders.
    pub fn prompt(&self) -> String {
        let mode = if self.new_build {
            "The page is empty. Build it from scratch by inserting nodes under \"app\"."
        } else {
            "Edit the existing page. Address nodes by their ids."
        };
        format!(
            "<CURRENT_PAGE>\n{}\n</CURRENT_PAGE>\n\n{mode}\nRespond with a JSON array of ops, \
             or with plain text if the request is a question.\n\n<REQUEST>\n{}\n</REQUEST>",
            self.current_page, self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuilderOutcome {
    /// Decoded ops plus warnings for elements that were dropped.
    Ops { ops: Vec<Op>, diagnostics: Vec<Diagnostic> },
    /// A conversational answer. The document stays as it is.
    Reply(String),
    Failure(String),
}

pub trait Builder {
    fn run(&self, request: &BuildRequest) -> impl Future<Output = BuilderOutcome> + Send;
}

/// Reads raw completion text: the outermost `[...]` span is taken as the
/// generated ops, text without one is a reply.
pub fn parse_completion(text: &str) -> BuilderOutcome {
    let trimmed = text.trim();
    let span = trimmed.find('[').zip(trimmed.rfind(']'));
    let Some((start, end)) = span.filter(|(start, end)| start < end) else {
        return BuilderOutcome::Reply(text.to_string());
    };
    let raw: Value = match serde_json::from_str(&trimmed[start..=end]) {
        Ok(raw) => raw,
        Err(err) => return BuilderOutcome::Failure(format!("completion is not valid JSON: {err}")),
    };
    let Value::Array(items) = raw else {
        return BuilderOutcome::Failure("completion is not an array".to_string());
    };
    match decode_ops(&Value::Array(hydrate_ops(&items))) {
        Ok(decoded) => BuilderOutcome::Ops { ops: decoded.ops, diagnostics: decoded.diagnostics },
        Err(err) => BuilderOutcome::Failure(err.to_string()),
    }
}

/// A [`Builder`] over a text completion function: prompt in, text out.
pub struct CompletionBuilder<F> {
    complete: F,
}

impl<F, Fut> CompletionBuilder<F>
where
    F: Fn(String) -> Fut + Sync,
    Fut: Future<Output = Result<String, String>> + Send,
{
    pub fn new(complete: F) -> Self {
        Self { complete }
    }
}

impl<F, Fut> Builder for CompletionBuilder<F>
where
    F: Fn(String) -> Fut + Sync,
    Fut: Future<Output = Result<String, String>> + Send,
{
    fn run(&self, request: &BuildRequest) -> impl Future<Output = BuilderOutcome> + Send {
        let pending = (self.complete)(request.prompt());
        async move {
            match pending.await {
                Ok(text) => parse_completion(&text),
                Err(err) => BuilderOutcome::Failure(err),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutcome {
    pub document: CoreDocument,
    /// Number of ops the builder returned. Zero for replies.
    pub change_count: usize,
    pub reply: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One edit round: ask the builder, apply what it returns, validate.
pub async fn transform_page<B: Builder>(
    document: &CoreDocument,
    message: &str,
    builder: &B,
) -> Result<TransformOutcome, IrError> {
    let request = BuildRequest::new(document, message)?;
    match builder.run(&request).await {
        BuilderOutcome::Ops { ops, mut diagnostics } => {
            let updated = apply(document, &ops);
            diagnostics.extend(validate(&updated));
            let errors: Vec<String> = diagnostics
                .iter()
                .filter(|d| d.severity == Severity::Error)
                .map(|d| d.message.clone())
                .collect();
            if !errors.is_empty() {
                warn!(
                    ops = ops.len(),
                    "validation errors after applying ops: {}",
                    errors.join("; ")
                );
            }
            info!(changes = ops.len(), new_build = request.new_build, "page transformed");
            Ok(TransformOutcome {
                document: updated,
                change_count: ops.len(),
                reply: None,
                diagnostics,
            })
        }
        BuilderOutcome::Reply(text) => Ok(TransformOutcome {
            document: document.clone(),
            change_count: 0,
            reply: Some(text),
            diagnostics: Vec::new(),
        }),
        BuilderOutcome::Failure(reason) => Err(IrError::Builder(reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeType};
    use std::sync::Mutex;

    struct Canned {
        text: Result<String, String>,
        seen: Mutex<Vec<BuildRequest>>,
    }

    impl Builder for Canned {
        fn run(&self, request: &BuildRequest) -> impl Future<Output = BuilderOutcome> + Send {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.clone());
            }
            let outcome = match &self.text {
                Ok(text) => parse_completion(text),
                Err(err) => BuilderOutcome::Failure(err.clone()),
            };
            async move { outcome }
        }
    }

    fn canned(text: &str) -> Canned {
        Canned { text: Ok(text.to_string()), seen: Mutex::new(Vec::new()) }
    }

    #[test]
    fn completion_with_surrounding_prose() {
        let text = r#"Sure, here you go:
[{"op":"insert","parentId":"app","position":"append","node":{"id":"h","type":"Heading","props":"{\"level\":1}","text":"Hi"}}]
Let me know!"#;
        match parse_completion(text) {
            BuilderOutcome::Ops { ops, diagnostics } => {
                assert_eq!(ops.len(), 1);
                assert!(diagnostics.is_empty());
                let Op::Insert { node, .. } = &ops[0] else { panic!("expected insert") };
                assert_eq!(node.props.get("level"), Some(&serde_json::json!(1)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn completion_without_array_is_reply() {
        assert_eq!(
            parse_completion("What color should the button be?"),
            BuilderOutcome::Reply("What color should the button be?".into())
        );
    }

    #[test]
    fn malformed_array_is_failure() {
        assert!(matches!(parse_completion("[{\"op\": ]"), BuilderOutcome::Failure(_)));
    }

    #[tokio::test]
    async fn transform_applies_and_counts() {
        let doc = CoreDocument::new_build("T");
        let builder = canned(
            r#"[{"op":"insert","parentId":"app","position":"append","node":{"id":"t","type":"Text","text":"a"}},
                {"op":"updateText","nodeId":"t","text":"b"},
                {"op":"bogus"}]"#,
        );
        let outcome = transform_page(&doc, "add a text", &builder).await.expect("transform");
        assert_eq!(outcome.change_count, 2);
        assert_eq!(outcome.document.find("t").and_then(|n| n.text.as_deref()), Some("b"));
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].path, "ops[2]");

        let seen = builder.seen.lock().expect("lock");
        assert!(seen[0].new_build);
        assert!(seen[0].prompt().contains("add a text"));
    }

    #[tokio::test]
    async fn reply_keeps_document() {
        let mut doc = CoreDocument::new_build("T");
        doc.app.children.push(Node::new("x", NodeType::Text));
        let outcome = transform_page(&doc, "why?", &canned("Because.")).await.expect("transform");
        assert_eq!(outcome.document, doc);
        assert_eq!(outcome.change_count, 0);
        assert_eq!(outcome.reply.as_deref(), Some("Because."));
    }

    #[tokio::test]
    async fn failure_is_error() {
        let builder = Canned { text: Err("rate limited".into()), seen: Mutex::new(Vec::new()) };
        let err = transform_page(&CoreDocument::new_build("T"), "go", &builder)
            .await
            .expect_err("failure");
        assert!(matches!(err, IrError::Builder(ref reason) if reason == "rate limited"));
    }

    #[tokio::test]
    async fn completion_builder_sends_prompt() {
        let builder = CompletionBuilder::new(|prompt: String| async move {
            if prompt.contains("<CURRENT_PAGE>") {
                Ok(r#"[{"op":"delete","nodeId":"x"}]"#.to_string())
            } else {
                Err("no page".to_string())
            }
        });
        let mut doc = CoreDocument::new_build("T");
        doc.app.children.push(Node::new("x", NodeType::Text));
        let outcome = transform_page(&doc, "remove x", &builder).await.expect("transform");
        assert!(outcome.document.app.children.is_empty());
        assert_eq!(outcome.change_count, 1);
    }
}
