use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rillc_drv::{Config, Session};

/// Compiler for the rill language.
#[derive(Parser)]
#[command(name = "rillc", disable_version_flag = true)]
struct Cli {
    /// Source file to compile.
    #[arg(required_unless_present = "version")]
    source: Option<PathBuf>,

    /// Output executable path.
    #[arg(short, long, default_value = "a.out")]
    output: PathBuf,

    /// Print version information.
    #[arg(short = 'v', long = "version")]
    version: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.version {
        println!("rillc {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }
    let source = cli.source.expect("clap enforces a source file");

    let session = Session::new(Config { source, output: cli.output });
    match session.run().context("compilation failed") {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}
