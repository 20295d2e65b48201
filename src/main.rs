//! nimdoc — generate API documentation for Nim modules.
//!
//! Two modes:
//!
//! - **stdin mode**: `nimdocinfo src/queue.nim | nimdoc -f json` renders an
//!   extractor payload (markers optional) to stdout
//! - **identifier mode**: `nimdoc -o site/api queue utils.strings` collects
//!   each module through the extractor and writes one file per identifier

use anyhow::{Context, Result};
use clap::Parser;
use nimdoc::collector::{self, JSON_START_MARKER};
use nimdoc::config::{Config, HandlerOptions, LocalOptions};
use nimdoc::handler::{self, Handler};
use nimdoc::render;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nimdoc", version, about = "Generate API documentation for Nim modules")]
struct Cli {
    /// Module identifiers (`pkg.module`). If omitted, reads a payload from stdin.
    identifiers: Vec<String>,

    /// Output directory (required when identifiers are given)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Config file (default: nimdoc.toml, searched upwards from the current directory)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Output format: html (default), json
    #[arg(short = 'f', long, default_value = "html")]
    format: String,

    /// Docstring dialect: rst, google, numpy, epydoc
    #[arg(short = 's', long)]
    docstring_style: Option<String>,

    /// Include non-exported declarations and fields
    #[arg(long)]
    show_private: bool,

    /// Where field docs come from: inline, docstring
    #[arg(long)]
    type_field_doc_style: Option<String>,

    /// Nim search path, relative to the project directory. Repeatable.
    #[arg(short = 'p', long = "path")]
    paths: Vec<String>,

    /// Repository URL for source links
    #[arg(long)]
    source_url: Option<String>,

    /// Branch or tag for source links
    #[arg(long)]
    source_ref: Option<String>,

    /// Heading level of the module title (1-6)
    #[arg(long)]
    heading_level: Option<u8>,
}

impl Cli {
    /// Options given on the command line; unset flags fall through to config.
    fn local_options(&self) -> LocalOptions {
        LocalOptions {
            show_private: self.show_private.then_some(true),
            heading_level: self.heading_level,
            docstring_style: self.docstring_style.clone(),
            type_field_doc_style: self.type_field_doc_style.clone(),
            source_url: self.source_url.clone(),
            source_ref: self.source_ref.clone(),
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nimdoc=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let cli = Cli::parse();

    if cli.identifiers.is_empty() {
        return stdin_mode(&cli);
    }

    identifier_mode(&cli)
}

/// stdin mode: read an extractor payload, render it to stdout.
fn stdin_mode(cli: &Cli) -> Result<()> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let data = if input.contains(JSON_START_MARKER) {
        collector::extract_json(&input, Path::new("<stdin>"))?
    } else {
        serde_json::from_str(&input).context("invalid JSON on stdin")?
    };
    let module = collector::parse_module(data)?;

    let config = Config::load(cli.config.as_deref(), &std::env::current_dir()?)?;
    let options = HandlerOptions::resolve(
        &config.options.validated().overlay(&cli.local_options()),
        None,
    );

    let renderer = render::create_renderer(&cli.format)?;
    let module = handler::prepare(module, &options);
    print!("{}", renderer.render(&module, &options));
    Ok(())
}

/// identifier mode: collect each module and write `<output>/<identifier>.<ext>`.
fn identifier_mode(cli: &Cli) -> Result<()> {
    let output_dir = cli
        .output
        .as_deref()
        .context("--output is required when identifiers are given")?;

    let renderer = render::create_renderer(&cli.format)?;

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let mut config = Config::load(cli.config.as_deref(), &cwd)?;
    if !cli.paths.is_empty() {
        config.paths = Some(cli.paths.clone());
    }
    let base_dir = config.base_dir(&cwd);

    let mut handler = Handler::new(config, base_dir);
    let options = handler.options(&cli.local_options());

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;

    for identifier in &cli.identifiers {
        let module = handler.collect(identifier, &options)?;
        let out_path = output_dir.join(format!("{}.{}", identifier, renderer.file_extension()));

        fs::write(&out_path, handler.render(&module, &options, renderer.as_ref()))
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        info!(identifier = identifier.as_str(), path = %out_path.display(), "wrote");
    }

    Ok(())
}
