use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[cfg(target_env = "msvc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use callvis::{CallvisOptions, OutputFormat, RenderOptions, run_main, write_output};

#[derive(Parser, Debug)]
#[command(
    name = "callvis",
    about = "callvis: render a program's call graph as a clustered Graphviz document",
    version
)]
pub struct Cli {
    /// Call graph JSON produced by the analysis, or `-` for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    #[command(flatten)]
    render: RenderOptions,

    /// TOML file with render options; command-line flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Toolchain root; packages found under <GOROOT>/src are standard.
    /// Defaults to $GOROOT, then `go env GOROOT`
    #[arg(long, value_name = "DIR")]
    goroot: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Dot)]
    format: OutputFormat,

    /// Keep compiler generated functions instead of bridging over them
    #[arg(long = "keep-synthetic", default_value_t = false)]
    keep_synthetic: bool,

    /// Output file path (writes to file instead of stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<String>,
}

pub fn run(args: Cli) -> bool {
    let total_start = Instant::now();

    // Initialize tracing subscriber for logging
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let opts = CallvisOptions {
        input: args.input,
        config: args.config,
        render: args.render,
        goroot: args.goroot,
        format: args.format,
        output: args.output,
        keep_synthetic: args.keep_synthetic,
    };

    let result = run_main(&opts).and_then(|text| write_output(opts.output.as_deref(), &text));
    let ok = match result {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Error: {e}");
            tracing::error!(kind = e.kind().as_str(), error = %e, "execution failed");
            false
        }
    };

    let total_secs = total_start.elapsed().as_secs_f64();
    tracing::info!(total_secs, "complete");
    ok
}

pub fn main() {
    let args = Cli::parse();
    if !run(args) {
        std::process::exit(1);
    }
}
