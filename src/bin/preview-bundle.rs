/// Preview bundler CLI
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use bundler_native::{Bundler, GenerateOptions, NoBuffers};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "preview-bundle")]
#[command(about = "Bundle a component and its imports for live preview")]
#[command(version)]
struct Args {
    /// Entry component file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Package module directory (defaults to the nearest node_modules)
    #[arg(long, value_name = "DIR")]
    module_dir: Option<PathBuf>,

    /// Runtime-support script injected under the reserved breadcrumb
    #[arg(long, value_name = "FILE")]
    runtime: Option<PathBuf>,

    /// Drop leading imports from the entry script
    #[arg(long)]
    strip_imports: bool,

    /// Mount the entry component instead of exporting it
    #[arg(long)]
    auto_mount: bool,

    /// DOM selector used with --auto-mount
    #[arg(long, default_value = "body")]
    target: String,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,
}

fn run(args: Args) -> anyhow::Result<bool> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let mut bundler = Bundler::default();
    if let Some(runtime) = &args.runtime {
        bundler = bundler.load_runtime(runtime)?;
    }

    let options = GenerateOptions {
        module_dir: args.module_dir,
        strip_imports: args.strip_imports,
        auto_mount: args.auto_mount,
        mount_target: args.target,
    };
    let bundle = bundler.generate(&source, &args.input, &NoBuffers, &options);

    let json = if args.pretty {
        serde_json::to_string_pretty(&bundle)?
    } else {
        serde_json::to_string(&bundle)?
    };
    println!("{}", json);

    Ok(!bundle.has_errors())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(2);
        }
    }
}
