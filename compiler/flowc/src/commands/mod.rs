//! Command handlers for the flowc CLI.
//!
//! Each submodule implements one command. Shared utilities that load a graph
//! and compile it (exiting with a message on failure) live here in the module
//! root.

use flow_compile::{compile_graph, Catalog, Compilation, Graph, WireProblem};

use crate::document::parse_graph;

mod compile;
mod kinds;
mod run;

pub use compile::compile_file;
pub use kinds::list_kinds;
pub use run::run_file;

/// Read a file from disk, exiting with a user-friendly error message on failure.
pub(super) fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            let msg = match e.kind() {
                std::io::ErrorKind::NotFound => format!("cannot find file '{path}'"),
                std::io::ErrorKind::PermissionDenied => {
                    format!("permission denied reading '{path}'")
                }
                std::io::ErrorKind::InvalidData => {
                    format!("'{path}' contains invalid UTF-8 data")
                }
                _ => format!("error reading '{path}': {e}"),
            };
            eprintln!("error: {msg}");
            std::process::exit(1);
        }
    }
}

/// Read and parse a graph document, exiting on failure.
pub(super) fn load_graph(path: &str) -> Graph {
    let content = read_file(path);
    match parse_graph(&content) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("error: {path}: {e}");
            std::process::exit(1);
        }
    }
}

/// Compile a graph against the built-in catalog, exiting on structural
/// errors. Recoverable wire problems are reported as warnings.
pub(super) fn compile_or_exit(path: &str, graph: &Graph) -> Compilation {
    match compile_graph(graph, &Catalog::builtin()) {
        Ok(compilation) => {
            report_problems(path, &compilation.problems);
            compilation
        }
        Err(e) => {
            eprintln!("error: {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn report_problems(path: &str, problems: &[WireProblem]) {
    for problem in problems {
        eprintln!("warning: {path}: {problem}");
    }
}
