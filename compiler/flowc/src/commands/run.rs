//! The `run` command: compile a graph document and execute it on the
//! reference machine.

use flow_bytecode::vm::{self, HostCall, RuntimeValue, ScriptedHost};
use flow_compile::Literal;

use crate::options::{Answer, CompileOptions};

use super::{compile_or_exit, load_graph};

/// Compile and run a graph, printing every host call in execution order.
pub fn run_file(path: &str, options: &CompileOptions) {
    let graph = load_graph(path);
    let compilation = compile_or_exit(path, &graph);

    let mut host = scripted_host(&options.answers);
    let outcome = match vm::run(&compilation.unit, &mut host) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("error: runtime fault in '{path}': {e}");
            std::process::exit(1);
        }
    };

    for call in host.calls() {
        println!("{}", format_call(call));
    }
    if options.verbose {
        eprintln!(
            "{path}: {} host calls, {} steps",
            host.calls().len(),
            outcome.steps
        );
    }
}

fn scripted_host(answers: &[Answer]) -> ScriptedHost {
    answers.iter().fold(ScriptedHost::new(), |host, answer| {
        host.with_answer(answer.target.clone(), runtime_value(&answer.value))
    })
}

/// The value a host answer hands back to the machine.
#[expect(
    clippy::cast_precision_loss,
    reason = "integer answers stand for numbers, which are doubles"
)]
fn runtime_value(literal: &Literal) -> RuntimeValue {
    match literal {
        Literal::Null => RuntimeValue::NULL,
        Literal::Boolean(b) => RuntimeValue::Boolean(*b),
        Literal::Integer(i) => RuntimeValue::Double(*i as f64),
        Literal::Number(n) => RuntimeValue::Double(*n),
        Literal::Text(s) => RuntimeValue::text(s),
    }
}

fn format_call(call: &HostCall) -> String {
    let args: Vec<String> = call.args.iter().map(ToString::to_string).collect();
    format!("{}({})", call.target, args.join(", "))
}
