//! PageIR core crate.
//!
//! A page is a typed tree (`model`) that an external generator edits through
//! small, id-addressed operations instead of raw markup. The crate is split
//! along the path an edit takes:
//!
//! - `schema`: closed JSON Schemas for constrained generation, and
//!   `hydrate_ops` to undo the string-encoding those schemas require.
//! - `ops`: decoding and pure application of edit batches.
//! - `validate`: static checks producing `Diagnostic`s.
//! - `builder`: the generator boundary and the one-round `transform_page`.
//!
//! Nothing here performs I/O. Rendering lives in `pageir-web`.
//!
//! Everything after decoding is total: unresolved ids are no-ops, bad batch
//! elements are skipped with a warning, and validation reports rather than
//! fails. Callers choose how strict to be with `ValidationPolicy`.

pub mod builder;
pub mod diagnostic;
pub mod error;
pub mod model;
pub mod ops;
pub mod schema;
pub mod validate;

pub use builder::{
    parse_completion, transform_page, BuildRequest, Builder, BuilderOutcome, CompletionBuilder,
    TransformOutcome,
};
pub use diagnostic::{has_errors, Diagnostic, Severity};
pub use error::IrError;
pub use model::{
    Condition, ConditionOp, CoreDocument, DocumentAssets, Effect, EventBinding, MotionPreset,
    MotionSpec, MotionTrigger, Node, NodeType, ScriptModule, StyleTokens, FORMAT_VERSION,
};
pub use ops::{apply, decode_ops, DecodedOps, InsertAnchor, InsertPosition, Op};
pub use schema::{document_schema, encode_ops, hydrate_node, hydrate_ops, ops_schema};
pub use validate::{enforce, validate, ValidationPolicy};
