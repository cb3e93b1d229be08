//! Command-line options shared by `compile` and `run`.

use std::path::PathBuf;

use flow_compile::Literal;

/// How a compiled unit is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitFormat {
    /// Human-readable operation listing
    #[default]
    Listing,
    /// `serde_json` encoding of the unit
    Json,
    /// `bincode` encoding of the unit
    Bin,
}

impl EmitFormat {
    /// Parse from command line string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "listing" | "list" | "text" => Some(Self::Listing),
            "json" => Some(Self::Json),
            "bin" | "bincode" => Some(Self::Bin),
            _ => None,
        }
    }

    /// Whether the encoding is binary (never written to a terminal as-is).
    pub fn is_binary(self) -> bool {
        self == Self::Bin
    }
}

/// A scripted return value for one host function.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Host function name.
    pub target: String,
    /// Value the function returns.
    pub value: Literal,
}

impl Answer {
    /// Parse `name=literal`. The literal is read as JSON (`5`, `true`,
    /// `"x"`, `null`); anything that is not valid JSON is taken as text.
    pub fn parse(s: &str) -> Option<Self> {
        let (target, value) = s.split_once('=')?;
        if target.is_empty() {
            return None;
        }
        let value = serde_json::from_str::<Literal>(value)
            .unwrap_or_else(|_| Literal::Text(value.to_owned()));
        Some(Self {
            target: target.to_owned(),
            value,
        })
    }
}

/// Options for `flowc compile` and `flowc run`.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Output encoding (`compile` only).
    pub emit: EmitFormat,
    /// Output file; stdout when unset.
    pub output: Option<PathBuf>,
    /// Host answers (`run` only).
    pub answers: Vec<Answer>,
    /// Print unit statistics and run summaries.
    pub verbose: bool,
}

impl CompileOptions {
    /// Fold options parsed from later arguments into `self`.
    pub fn merge(&mut self, other: &CompileOptions) {
        if other.emit != EmitFormat::default() {
            self.emit = other.emit;
        }
        if other.output.is_some() {
            self.output.clone_from(&other.output);
        }
        self.answers.extend(other.answers.iter().cloned());
        self.verbose |= other.verbose;
    }
}

/// Parse options from command line arguments.
///
/// `-o <path>` needs lookahead and is handled by the caller; the `-o=<path>`
/// and `--output=<path>` forms are accepted here.
pub fn parse_options(args: &[String]) -> CompileOptions {
    let mut options = CompileOptions::default();

    for arg in args {
        if let Some(emit) = arg.strip_prefix("--emit=") {
            if let Some(format) = EmitFormat::parse(emit) {
                options.emit = format;
            } else {
                eprintln!("warning: unknown emit format '{emit}', options: listing, json, bin");
            }
        } else if let Some(output) = arg.strip_prefix("-o=") {
            options.output = Some(PathBuf::from(output));
        } else if let Some(output) = arg.strip_prefix("--output=") {
            options.output = Some(PathBuf::from(output));
        } else if let Some(answer) = arg.strip_prefix("--answer=") {
            if let Some(answer) = Answer::parse(answer) {
                options.answers.push(answer);
            } else {
                eprintln!("warning: malformed answer '{answer}', expected <name>=<literal>");
            }
        } else if arg == "--verbose" || arg == "-v" {
            options.verbose = true;
        } else {
            eprintln!("warning: unknown option '{arg}'");
        }
    }

    options
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests panic on unexpected parse results"
)]
mod tests;
