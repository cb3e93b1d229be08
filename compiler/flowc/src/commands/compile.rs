//! The `compile` command: compile a graph document and write the unit.

use std::io::{IsTerminal, Write};

use crate::document::encode_unit;
use crate::options::CompileOptions;

use super::{compile_or_exit, load_graph};

/// Compile a graph document and write the unit in the requested format to
/// `options.output`, or to stdout when no output is given.
pub fn compile_file(path: &str, options: &CompileOptions) {
    let graph = load_graph(path);
    let compilation = compile_or_exit(path, &graph);

    if options.verbose {
        eprintln!(
            "{path}: {} ops, {} locals, {} problems",
            compilation.unit.ops.len(),
            compilation.unit.max_locals,
            compilation.problems.len()
        );
    }

    let bytes = match encode_unit(&compilation.unit, options.emit) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    if let Some(output) = &options.output {
        if let Err(e) = std::fs::write(output, &bytes) {
            eprintln!("error: cannot write '{}': {e}", output.display());
            std::process::exit(1);
        }
        if options.verbose {
            eprintln!("wrote {} bytes to {}", bytes.len(), output.display());
        }
        return;
    }

    let mut stdout = std::io::stdout();
    if options.emit.is_binary() && stdout.is_terminal() {
        eprintln!("error: refusing to write binary output to a terminal, use -o <path>");
        std::process::exit(1);
    }
    if let Err(e) = stdout.write_all(&bytes).and_then(|()| stdout.flush()) {
        eprintln!("error: cannot write to stdout: {e}");
        std::process::exit(1);
    }
}
