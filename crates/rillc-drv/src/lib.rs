//! rillc-drv - Compiler driver
//!
//! Orchestrates one compilation: read the source file, run the front end,
//! emit assembly, then shell out to GNU `as` and `ld` to produce the
//! executable. The driver owns all user-facing error formatting; core
//! passes never report anything.
//!
//! ```text
//! source.rill -> [front] -> IR in Context -> [codegen] -> out.s
//!             -> as out.s -o out.o -> ld out.o -o out
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::info;

use rillc_front::FrontError;
use rillc_ir::{Context, SymbolKind};
use rillc_util::symbol::SYM_MAIN;

/// One invocation's configuration, straight from the CLI.
#[derive(Clone, Debug)]
pub struct Config {
    /// Source file to compile.
    pub source: PathBuf,
    /// Output executable path.
    pub output: PathBuf,
}

/// Anything that can stop a compilation.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{path}: {error}")]
    Read { path: String, #[source] error: io::Error },

    /// A front-end diagnostic, formatted `file:line:column: message`.
    #[error("{path}:{error}")]
    Front { path: String, error: FrontError },

    #[error("no `main` function in the module")]
    MissingMain,

    #[error("failed to write {path}: {error}")]
    Write { path: String, #[source] error: io::Error },

    #[error("failed to run `{tool}`: {error}")]
    ToolSpawn { tool: &'static str, #[source] error: io::Error },

    #[error("`{tool}` failed:\n{stderr}")]
    ToolFailed { tool: &'static str, stderr: String },
}

/// Compile `source` text to an assembly buffer, without touching the
/// filesystem or external tools.
pub fn compile_to_assembly(source: &str, source_name: &str) -> Result<String, DriverError> {
    let mut context = Context::new();
    rillc_front::compile(source, &mut context)
        .map_err(|error| DriverError::Front { path: source_name.to_owned(), error })?;

    match context.symbol(SYM_MAIN).map(|entry| &entry.kind) {
        Some(SymbolKind::Code(_)) => {}
        _ => return Err(DriverError::MissingMain),
    }

    Ok(rillc_codegen::emit_module(&context, source_name))
}

/// One compilation session.
pub struct Session {
    config: Config,
}

impl Session {
    pub fn new(config: Config) -> Session {
        Session { config }
    }

    /// Run the whole pipeline: source to linked executable.
    pub fn run(&self) -> Result<(), DriverError> {
        let source_name = self.config.source.display().to_string();
        let source = std::fs::read_to_string(&self.config.source)
            .map_err(|error| DriverError::Read { path: source_name.clone(), error })?;

        let assembly = compile_to_assembly(&source, &source_name)?;

        let assembly_path = self.config.output.with_extension("s");
        let object_path = self.config.output.with_extension("o");
        write_file(&assembly_path, &assembly)?;
        info!(path = %assembly_path.display(), "wrote assembly");

        run_tool("as", |command| {
            command.arg(&assembly_path).arg("-o").arg(&object_path)
        })?;
        run_tool("ld", |command| {
            command.arg(&object_path).arg("-o").arg(&self.config.output)
        })?;
        info!(path = %self.config.output.display(), "linked executable");
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), DriverError> {
    std::fs::write(path, contents)
        .map_err(|error| DriverError::Write { path: path.display().to_string(), error })
}

fn run_tool(
    tool: &'static str,
    configure: impl FnOnce(&mut Command) -> &mut Command,
) -> Result<(), DriverError> {
    let mut command = Command::new(tool);
    configure(&mut command);
    let output = command
        .output()
        .map_err(|error| DriverError::ToolSpawn { tool, error })?;
    if !output.status.success() {
        return Err(DriverError::ToolFailed {
            tool,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}
