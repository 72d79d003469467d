use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pageir_core::{
    apply, decode_ops, document_schema, enforce, hydrate_ops, ops_schema, validate, CoreDocument,
    Diagnostic, ValidationPolicy,
};
use pageir_web::adapters::themed::DEFAULT_ASSET_BASE;
use pageir_web::{compile_with, AdapterKind, CompileOptions, RUNTIME_JS};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const CONFIG_FILE: &str = "pageir.config.json";

/// Project settings read from `pageir.config.json`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub adapter: AdapterKind,
    #[serde(default = "default_asset_base")]
    pub themed_asset_base: String,
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_title")]
    pub default_title: String,
    #[serde(default = "default_lang")]
    pub default_lang: String,
}

fn default_asset_base() -> String {
    DEFAULT_ASSET_BASE.to_string()
}

fn default_title() -> String {
    CompileOptions::default().default_title
}

fn default_lang() -> String {
    CompileOptions::default().default_lang
}

impl Default for Config {
    fn default() -> Self {
        Self {
            adapter: AdapterKind::default(),
            themed_asset_base: default_asset_base(),
            strict: false,
            default_title: default_title(),
            default_lang: default_lang(),
        }
    }
}

impl Config {
    /// An explicit path must exist; otherwise `pageir.config.json` in `dir`
    /// is used when present.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = dir.join(CONFIG_FILE);
                if !candidate.is_file() {
                    debug!("no {CONFIG_FILE}, using defaults");
                    return Ok(Self::default());
                }
                candidate
            }
        };
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            default_title: self.default_title.clone(),
            default_lang: self.default_lang.clone(),
        }
    }

    pub fn policy(&self, strict_flag: bool) -> ValidationPolicy {
        if strict_flag || self.strict {
            ValidationPolicy::Strict
        } else {
            ValidationPolicy::Lenient
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "pageir")]
#[command(version, about = "Edit, validate and compile PageIR documents", long_about = None)]
pub struct Cli {
    /// Config file (defaults to ./pageir.config.json when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write an empty document
    New {
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Apply a batch of ops to a document
    Apply {
        doc: PathBuf,
        /// JSON array of ops, string-encoded fields allowed
        #[arg(long)]
        ops: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Fail instead of writing when the result has validation errors
        #[arg(long)]
        strict: bool,
    },
    /// Report diagnostics for a document
    Validate {
        doc: PathBuf,
        /// Exit with an error when any diagnostic is an error
        #[arg(long)]
        strict: bool,
    },
    /// Compile a document to an HTML page
    Compile {
        doc: PathBuf,
        /// themed or minimal (overrides the config)
        #[arg(long)]
        adapter: Option<AdapterKind>,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print a generation schema
    Schema {
        #[arg(value_enum)]
        kind: SchemaKind,
    },
    /// Write the browser runtime script
    InitClient {
        #[arg(long, default_value = "pageir-runtime.js")]
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaKind {
    /// Closed schema for an ops batch
    Ops,
    /// Structural schema of a whole document
    Document,
}

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run_from_env() -> Result<()> {
    run(Cli::parse())
}

pub fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let config = Config::load(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Command::New { title, out } => {
            let title = title.unwrap_or_else(|| config.default_title.clone());
            let doc = CoreDocument::new_build(title);
            emit(out.as_deref(), &doc.to_json_pretty()?)
        }
        Command::Apply { doc, ops, out, strict } => {
            let document = read_document(&doc)?;
            let raw = read_json(&ops)?;
            let updated = apply_batch(&document, &raw, config.policy(strict))?;
            emit(out.as_deref(), &updated.to_json_pretty()?)
        }
        Command::Validate { doc, strict } => {
            let document = read_document(&doc)?;
            let diagnostics = validate(&document);
            for diagnostic in &diagnostics {
                println!("{diagnostic}");
            }
            let errors = diagnostics.iter().filter(|d| d.is_error()).count();
            info!(errors, warnings = diagnostics.len() - errors, "validated {}", doc.display());
            enforce(config.policy(strict), &diagnostics)?;
            Ok(())
        }
        Command::Compile { doc, adapter, out } => {
            let document = read_document(&doc)?;
            let kind = adapter.unwrap_or(config.adapter);
            let options = config.compile_options();
            let page = compile_with(&document, kind, &config.themed_asset_base, &options);
            info!(
                fingerprint = %page.fingerprint,
                bytes = page.html.len(),
                runtime = page.uses_runtime,
                "compiled {}",
                doc.display()
            );
            emit(out.as_deref(), &page.html)
        }
        Command::Schema { kind } => {
            let schema = match kind {
                SchemaKind::Ops => ops_schema(),
                SchemaKind::Document => document_schema(),
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
        Command::InitClient { out } => {
            fs::write(&out, RUNTIME_JS)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!("wrote {}", out.display());
            Ok(())
        }
    }
}

/// Hydrates and decodes a raw ops batch, applies it and validates the
/// result under `policy`.
pub fn apply_batch(
    document: &CoreDocument,
    raw_ops: &Value,
    policy: ValidationPolicy,
) -> Result<CoreDocument> {
    let Value::Array(items) = raw_ops else {
        bail!("ops file must contain a JSON array");
    };
    let decoded = decode_ops(&Value::Array(hydrate_ops(items)))?;
    report(&decoded.diagnostics);

    let updated = apply(document, &decoded.ops);
    let diagnostics = validate(&updated);
    report(&diagnostics);
    enforce(policy, &diagnostics).context("refusing to write an invalid document")?;

    info!(applied = decoded.ops.len(), skipped = decoded.diagnostics.len(), "ops applied");
    Ok(updated)
}

fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        warn!("{diagnostic}");
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn read_document(path: &Path) -> Result<CoreDocument> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    CoreDocument::from_json(&raw)
        .with_context(|| format!("{} is not a PageIR document", path.display()))
}

fn emit(out: Option<&Path>, contents: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => println!("{contents}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageir_core::IrError;
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("{}-{}-{}", prefix, std::process::id(), ts));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pageir").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn test_config_defaults_and_partial_file() {
        let dir = unique_temp_dir("pageir-config");
        assert_eq!(Config::load(None, &dir).expect("defaults"), Config::default());

        fs::write(dir.join(CONFIG_FILE), r#"{"adapter": "minimal", "defaultLang": "de"}"#)
            .expect("failed to write config");
        let config = Config::load(None, &dir).expect("config should load");
        assert_eq!(config.adapter, AdapterKind::Minimal);
        assert_eq!(config.default_lang, "de");
        assert_eq!(config.default_title, "Untitled Page");
        assert_eq!(config.themed_asset_base, "/frameworks/fluent");
        assert_eq!(config.policy(false), ValidationPolicy::Lenient);
        assert_eq!(config.policy(true), ValidationPolicy::Strict);

        let missing = dir.join("nope.json");
        assert!(Config::load(Some(&missing), &dir).is_err());
    }

    #[test]
    fn test_apply_batch_hydrates_and_skips_bad_ops() {
        let doc = CoreDocument::new_build("T");
        let raw = json!([
            {"op": "insert", "parentId": "app", "position": "append",
             "node": {"id": "h", "type": "Heading", "props": "{\"level\":1}", "text": "Hello"}},
            {"op": "explode"}
        ]);
        let updated =
            apply_batch(&doc, &raw, ValidationPolicy::Strict).expect("batch should apply");
        let heading = updated.app.find("h").expect("heading inserted");
        assert_eq!(heading.props.get("level"), Some(&json!(1)));

        assert!(apply_batch(&doc, &json!({"op": "delete"}), ValidationPolicy::Lenient).is_err());
    }

    #[test]
    fn test_strict_apply_rejects_dangling_targets() {
        let doc = CoreDocument::new_build("T");
        let toggle = json!({"type": "toggleTarget", "target": "ghost"});
        let raw = json!([{
            "op": "insert", "parentId": "app", "position": "append",
            "node": {"id": "b", "type": "Button", "events": [{"event": "click", "do": [toggle]}]}
        }]);
        assert!(apply_batch(&doc, &raw, ValidationPolicy::Lenient).is_ok());
        let err =
            apply_batch(&doc, &raw, ValidationPolicy::Strict).expect_err("strict should reject");
        assert!(matches!(err.downcast_ref::<IrError>(), Some(IrError::Rejected { count: 1, .. })));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        match cli(&["compile", "page.json", "--adapter", "minimal", "-o", "out.html"]).command {
            Command::Compile { adapter, out, .. } => {
                assert_eq!(adapter, Some(AdapterKind::Minimal));
                assert_eq!(out, Some(PathBuf::from("out.html")));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(matches!(
            cli(&["schema", "document"]).command,
            Command::Schema { kind: SchemaKind::Document }
        ));
        let unknown = ["pageir", "compile", "p.json", "--adapter", "bootstrap"];
        assert!(Cli::try_parse_from(unknown).is_err());
    }

    #[test]
    fn test_new_apply_compile_round_trip_on_disk() {
        let dir = unique_temp_dir("pageir-run");
        let doc_path = dir.join("page.json");
        let ops_path = dir.join("ops.json");
        let html_path = dir.join("page.html");
        let js_path = dir.join("runtime.js");
        let config = dir.join("custom.json");
        fs::write(&config, r#"{"adapter": "minimal"}"#).expect("failed to write config");
        let config = config.to_string_lossy().to_string();
        let doc = doc_path.to_string_lossy().to_string();
        let ops = ops_path.to_string_lossy().to_string();
        let html_out = html_path.to_string_lossy().to_string();
        let js_out = js_path.to_string_lossy().to_string();
        let run_with_config = |args: &[&str]| {
            let mut full = vec!["--config", config.as_str()];
            full.extend_from_slice(args);
            run(cli(&full))
        };

        run_with_config(&["new", "--title", "Shop", "-o", doc.as_str()]).expect("new");
        let insert = json!([{
            "op": "insert", "parentId": "app", "position": "append",
            "node": {"id": "t", "type": "Text", "text": "Hi"}
        }]);
        fs::write(&ops_path, insert.to_string()).expect("failed to write ops");
        run_with_config(&["apply", doc.as_str(), "--ops", ops.as_str(), "-o", doc.as_str()])
            .expect("apply");
        run_with_config(&["validate", doc.as_str(), "--strict"]).expect("validate");
        run_with_config(&["compile", doc.as_str(), "-o", html_out.as_str()]).expect("compile");
        run_with_config(&["init-client", "--out", js_out.as_str()]).expect("init-client");

        let html = fs::read_to_string(&html_path).expect("html written");
        assert!(html.contains("<title>Shop</title>"));
        assert!(html.contains("<p data-ir-id=\"t\">Hi</p>"));
        assert!(!html.contains("fluent"));
        assert_eq!(fs::read_to_string(&js_path).expect("runtime written"), RUNTIME_JS);
    }
}
