//! generate swift data-access code from graphql documents
//!
//! reads a schema (file or url) and one or more executable documents, then
//! writes swift sources and, optionally, an operation-id manifest.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use typecase::{
    compile, generate, load_schema, read_documents, write_operation_ids, write_output,
    GeneratorConfig, OutputMode, SchemaSource,
};

#[derive(Debug, Parser)]
#[command(name = "typecase-codegen", version, about)]
struct Args {
    /// schema sdl file
    #[arg(long, conflicts_with = "url", required_unless_present = "url")]
    schema: Option<PathBuf>,

    /// endpoint serving the schema sdl
    #[arg(long)]
    url: Option<String>,

    /// bearer token for --url
    #[arg(long, requires = "url")]
    token: Option<String>,

    /// output directory
    #[arg(long)]
    out: PathBuf,

    /// json generator config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// wrap every declaration in `public enum <NAMESPACE>`
    #[arg(long)]
    namespace: Option<String>,

    /// keep custom scalar names instead of mapping them to String
    #[arg(long)]
    passthrough_custom_scalars: bool,

    /// prefix for passed-through custom scalars
    #[arg(long)]
    custom_scalars_prefix: Option<String>,

    /// do not merge fields of spread fragments into the spreading type
    #[arg(long)]
    no_merge_fragment_fields: bool,

    /// emit operation identifiers and write the manifest to this path
    #[arg(long, value_name = "PATH")]
    operation_ids: Option<PathBuf>,

    /// one swift file per document plus a shared types file
    #[arg(long)]
    per_file: bool,

    /// file name of the combined artifact
    #[arg(long)]
    combined_file_name: Option<String>,

    /// graphql documents or directories containing them
    #[arg(required = true)]
    documents: Vec<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("codegen failed: {err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> typecase::Result<()> {
    let config = build_config(&args)?;

    let source = match (&args.schema, &args.url) {
        (Some(path), _) => SchemaSource::file(path),
        (None, Some(url)) => SchemaSource::url(url, args.token.clone())?,
        (None, None) => {
            return Err(typecase::Error::Config(
                "--schema or --url is required".to_string(),
            ))
        }
    };
    let schema = load_schema(&source)?;
    let documents = read_documents(&args.documents)?;
    let ctx = compile(schema, &documents)?;
    let output = generate(&ctx, &config)?;

    let written = write_output(&output, &args.out)?;
    if let Some(path) = &args.operation_ids {
        write_operation_ids(&output, path)?;
    }
    tracing::info!(files = written.len(), out = %args.out.display(), "done");
    Ok(())
}

fn build_config(args: &Args) -> typecase::Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::new(),
    };
    if let Some(namespace) = &args.namespace {
        config = config.with_namespace(namespace);
    }
    if args.passthrough_custom_scalars {
        config = config.with_passthrough_custom_scalars(true);
    }
    if let Some(prefix) = &args.custom_scalars_prefix {
        config = config.with_custom_scalars_prefix(prefix);
    }
    if args.no_merge_fragment_fields {
        config = config.with_merge_in_fields_from_fragment_spreads(false);
    }
    if args.operation_ids.is_some() {
        config = config.with_operation_ids(true);
    }
    if args.per_file {
        config = config.with_output_mode(OutputMode::PerFile);
    }
    if let Some(name) = &args.combined_file_name {
        config = config.with_combined_file_name(name);
    }
    config.validate()?;
    Ok(config)
}
