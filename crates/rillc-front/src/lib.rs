//! rillc-front - Front end of the rill compiler
//!
//! Lexes, parses, type checks, and lowers one source file into the IR
//! tables of a [`rillc_ir::Context`]. The front end is the gatekeeper:
//! every diagnostic the compiler can report to the user originates here,
//! and IR handed onward is well-formed by construction (valid SSA
//! references, single assignment, type-correct operands).

pub mod ast;
pub mod check;
pub mod cursor;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use error::{FrontError, SourceLocation};

use rillc_ir::Context;
use tracing::debug;

/// Compile `source` into `context`: all top-level definitions become
/// module symbols with their functions lowered to IR.
pub fn compile(source: &str, context: &mut Context) -> Result<(), FrontError> {
    let tokens = lexer::lex(source)?;
    let module = parser::parse(tokens)?;
    debug!(items = module.items.len(), "parsed module");
    check::check_module(&module, context)
}
