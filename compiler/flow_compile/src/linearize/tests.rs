use flow_bytecode::vm::{self, RuntimeValue, ScriptedHost};
use flow_bytecode::Op;
use pretty_assertions::assert_eq;

use super::*;
use crate::test_helpers::count;
use crate::value::ValueKind;

// Graph building

fn graph_with_start() -> (Graph, NodeId) {
    let mut graph = Graph::new();
    let start = graph.add_node(Node::new("start"));
    graph.set_entry(start);
    (graph, start)
}

/// Wire signal output `out` of `from` to the signal input of `to`.
fn then(graph: &mut Graph, from: NodeId, out: usize, to: NodeId) -> WireId {
    graph.connect(Port::new(from, out), Port::new(to, 0))
}

/// Wire value output 0 of `from` to input `input` of `to`.
fn feed(graph: &mut Graph, from: NodeId, to: NodeId, input: usize) -> WireId {
    graph.connect(Port::new(from, 0), Port::new(to, input))
}

fn emitter(graph: &mut Graph, kind: &str, function: &str) -> NodeId {
    graph.add_node(Node::new(format!("emit:{kind}")).with_tag(function))
}

// Running

fn compile(graph: &Graph) -> Compilation {
    compile_graph(graph, &Catalog::builtin()).unwrap()
}

fn compile_err(graph: &Graph) -> CompileError {
    compile_graph(graph, &Catalog::builtin()).unwrap_err()
}

fn execute_with(graph: &Graph, mut host: ScriptedHost) -> ScriptedHost {
    let compilation = compile(graph);
    vm::run(&compilation.unit, &mut host).unwrap();
    host
}

fn execute(graph: &Graph) -> ScriptedHost {
    execute_with(graph, ScriptedHost::new())
}

fn targets(host: &ScriptedHost) -> Vec<&str> {
    host.calls().iter().map(|call| call.target.as_str()).collect()
}

fn first_arg(host: &ScriptedHost, target: &str) -> RuntimeValue {
    host.calls_to(target).next().unwrap().args[0].clone()
}

// Ordering

#[test]
fn empty_program() {
    let (graph, _) = graph_with_start();
    let compilation = compile(&graph);
    assert_eq!(compilation.unit.ops, vec![Op::Return]);
    assert!(compilation.problems.is_empty());
}

#[test]
fn fan_out_follows_wire_order() {
    let (mut graph, start) = graph_with_start();
    let a = emitter(&mut graph, "number", "a");
    let b = emitter(&mut graph, "number", "b");
    then(&mut graph, start, 0, a);
    then(&mut graph, start, 0, b);
    assert_eq!(targets(&execute(&graph)), vec!["a", "b"]);

    let (mut graph, start) = graph_with_start();
    let a = emitter(&mut graph, "number", "a");
    let b = emitter(&mut graph, "number", "b");
    then(&mut graph, start, 0, b);
    then(&mut graph, start, 0, a);
    assert_eq!(targets(&execute(&graph)), vec!["b", "a"]);
}

#[test]
fn chains_run_in_order() {
    let (mut graph, start) = graph_with_start();
    let a = emitter(&mut graph, "number", "a");
    let b = emitter(&mut graph, "number", "b");
    let c = emitter(&mut graph, "number", "c");
    then(&mut graph, start, 0, a);
    then(&mut graph, a, 0, b);
    then(&mut graph, b, 0, c);
    assert_eq!(targets(&execute(&graph)), vec!["a", "b", "c"]);
}

#[test]
fn node_runs_once_per_arriving_signal() {
    let (mut graph, start) = graph_with_start();
    let a = emitter(&mut graph, "number", "a");
    let b = emitter(&mut graph, "number", "b");
    then(&mut graph, start, 0, a);
    then(&mut graph, start, 0, b);
    then(&mut graph, b, 0, a);
    assert_eq!(targets(&execute(&graph)), vec!["a", "b", "a"]);
}

#[test]
fn long_chains_compile() {
    let (mut graph, start) = graph_with_start();
    let mut prev = start;
    for _ in 0..1_000 {
        let next = emitter(&mut graph, "number", "tick");
        then(&mut graph, prev, 0, next);
        prev = next;
    }
    assert_eq!(execute(&graph).calls_to("tick").count(), 1_000);
}

// Values

#[test]
fn constant_with_two_consumers_is_emitted_once() {
    let (mut graph, start) = graph_with_start();
    let five = graph.add_node(Node::new("number").with_inset(0, 5.0));
    let a = emitter(&mut graph, "number", "a");
    let b = emitter(&mut graph, "number", "b");
    then(&mut graph, start, 0, a);
    then(&mut graph, a, 0, b);
    feed(&mut graph, five, a, 1);
    feed(&mut graph, five, b, 1);

    let compilation = compile(&graph);
    let fives = count(&compilation.unit.ops, |op| {
        *op == Op::Const(Constant::number(5.0))
    });
    assert_eq!(fives, 1);

    let host = execute(&graph);
    assert_eq!(first_arg(&host, "a"), RuntimeValue::Double(5.0));
    assert_eq!(first_arg(&host, "b"), RuntimeValue::Double(5.0));
}

#[test]
fn query_with_two_consumers_runs_once() {
    let (mut graph, start) = graph_with_start();
    let sensor = graph.add_node(Node::new("query:number").with_tag("sensor"));
    let a = emitter(&mut graph, "number", "a");
    let b = emitter(&mut graph, "number", "b");
    then(&mut graph, start, 0, a);
    then(&mut graph, a, 0, b);
    feed(&mut graph, sensor, a, 1);
    feed(&mut graph, sensor, b, 1);

    let host = execute_with(
        &graph,
        ScriptedHost::new().with_answer("sensor", RuntimeValue::Double(4.0)),
    );
    assert_eq!(targets(&host), vec!["sensor", "a", "b"]);
    assert_eq!(first_arg(&host, "b"), RuntimeValue::Double(4.0));
}

#[test]
fn query_with_one_consumer_runs_per_activation() {
    let (mut graph, start) = graph_with_start();
    let sensor = graph.add_node(Node::new("query:number").with_tag("sensor"));
    let repeat = graph.add_node(Node::new("repeat").with_inset(1, 3_i64));
    let a = emitter(&mut graph, "number", "a");
    then(&mut graph, start, 0, repeat);
    then(&mut graph, repeat, 0, a);
    feed(&mut graph, sensor, a, 1);

    assert_eq!(execute(&graph).calls_to("sensor").count(), 3);
}

#[test]
fn shared_value_reaches_both_branch_arms() {
    for (lhs, taken) in [(1.0, "yes"), (3.0, "no")] {
        let (mut graph, start) = graph_with_start();
        let five = graph.add_node(Node::new("number").with_inset(0, 5.0));
        let less = graph.add_node(
            Node::new("less_than")
                .with_inset(0, lhs)
                .with_inset(1, 2.0),
        );
        let branch = graph.add_node(Node::new("if"));
        let yes = emitter(&mut graph, "number", "yes");
        let no = emitter(&mut graph, "number", "no");
        then(&mut graph, start, 0, branch);
        then(&mut graph, branch, 0, yes);
        then(&mut graph, branch, 1, no);
        feed(&mut graph, less, branch, 1);
        feed(&mut graph, five, yes, 1);
        feed(&mut graph, five, no, 1);

        let compilation = compile(&graph);
        let fives = count(&compilation.unit.ops, |op| {
            *op == Op::Const(Constant::number(5.0))
        });
        assert_eq!(fives, 1);

        let host = execute(&graph);
        assert_eq!(targets(&host), vec![taken]);
        assert_eq!(first_arg(&host, taken), RuntimeValue::Double(5.0));
    }
}

#[test]
fn shared_value_survives_empty_loop() {
    let (mut graph, start) = graph_with_start();
    let five = graph.add_node(Node::new("number").with_inset(0, 5.0));
    let repeat = graph.add_node(Node::new("repeat").with_inset(1, 0_i64));
    let a = emitter(&mut graph, "number", "a");
    let b = emitter(&mut graph, "number", "b");
    then(&mut graph, start, 0, repeat);
    then(&mut graph, repeat, 0, a);
    then(&mut graph, repeat, 1, b);
    feed(&mut graph, five, a, 1);
    feed(&mut graph, five, b, 1);

    let host = execute(&graph);
    assert_eq!(targets(&host), vec!["b"]);
    assert_eq!(first_arg(&host, "b"), RuntimeValue::Double(5.0));
}

#[test]
fn shared_query_in_loop_and_done_runs_once() {
    let (mut graph, start) = graph_with_start();
    let sensor = graph.add_node(Node::new("query:number").with_tag("sensor"));
    let repeat = graph.add_node(Node::new("repeat").with_inset(1, 2_i64));
    let a = emitter(&mut graph, "number", "a");
    let b = emitter(&mut graph, "number", "b");
    then(&mut graph, start, 0, repeat);
    then(&mut graph, repeat, 0, a);
    then(&mut graph, repeat, 1, b);
    feed(&mut graph, sensor, a, 1);
    feed(&mut graph, sensor, b, 1);

    let host = execute_with(
        &graph,
        ScriptedHost::new().with_answer("sensor", RuntimeValue::Double(8.0)),
    );
    assert_eq!(targets(&host), vec!["sensor", "a", "a", "b"]);
    assert_eq!(first_arg(&host, "b"), RuntimeValue::Double(8.0));
}

#[test]
fn shared_query_inside_loop_body_runs_each_pass() {
    let (mut graph, start) = graph_with_start();
    let sensor = graph.add_node(Node::new("query:number").with_tag("sensor"));
    let repeat = graph.add_node(Node::new("repeat").with_inset(1, 3_i64));
    let a = emitter(&mut graph, "number", "a");
    let b = emitter(&mut graph, "number", "b");
    then(&mut graph, start, 0, repeat);
    then(&mut graph, repeat, 0, a);
    then(&mut graph, a, 0, b);
    feed(&mut graph, sensor, a, 1);
    feed(&mut graph, sensor, b, 1);

    let host = execute(&graph);
    assert_eq!(host.calls_to("sensor").count(), 3);
    assert_eq!(host.calls_to("b").count(), 3);
}

#[test]
fn shared_value_reaches_node_on_two_signal_paths() {
    // if (false) { show } else { tail; show }, both reading one constant
    let (mut graph, start) = graph_with_start();
    let five = graph.add_node(Node::new("number").with_inset(0, 5.0));
    let branch = graph.add_node(Node::new("if"));
    let tail = emitter(&mut graph, "number", "tail");
    let show = emitter(&mut graph, "number", "show");
    then(&mut graph, start, 0, branch);
    then(&mut graph, branch, 0, show);
    then(&mut graph, branch, 1, tail);
    then(&mut graph, tail, 0, show);
    feed(&mut graph, five, show, 1);
    feed(&mut graph, five, tail, 1);

    let host = execute(&graph);
    assert_eq!(targets(&host), vec!["tail", "show"]);
    assert_eq!(first_arg(&host, "tail"), RuntimeValue::Double(5.0));
    assert_eq!(first_arg(&host, "show"), RuntimeValue::Double(5.0));
}

#[test]
fn unwired_inputs_use_inset_or_default() {
    let (mut graph, start) = graph_with_start();
    let bare = emitter(&mut graph, "number", "bare");
    let inset = graph.add_node(Node::new("emit:number").with_tag("inset").with_inset(1, 3_i64));
    let text = emitter(&mut graph, "text", "text");
    let flag = emitter(&mut graph, "condition", "flag");
    then(&mut graph, start, 0, bare);
    then(&mut graph, bare, 0, inset);
    then(&mut graph, inset, 0, text);
    then(&mut graph, text, 0, flag);

    let host = execute(&graph);
    assert_eq!(first_arg(&host, "bare"), RuntimeValue::Double(0.0));
    assert_eq!(first_arg(&host, "inset"), RuntimeValue::Double(3.0));
    assert_eq!(first_arg(&host, "text"), RuntimeValue::text(""));
    assert_eq!(first_arg(&host, "flag"), RuntimeValue::Boolean(false));
}

#[test]
fn arithmetic_and_comparison() {
    let (mut graph, start) = graph_with_start();
    let two = graph.add_node(Node::new("number").with_inset(0, 2.0));
    let times = graph.add_node(Node::new("multiply").with_inset(1, 10.0));
    let sum = graph.add_node(Node::new("add").with_inset(1, 1.0));
    let big = graph.add_node(Node::new("greater_than").with_inset(1, 20.0));
    let out = emitter(&mut graph, "number", "out");
    let check = emitter(&mut graph, "condition", "check");
    then(&mut graph, start, 0, out);
    then(&mut graph, out, 0, check);
    feed(&mut graph, two, times, 0);
    feed(&mut graph, times, sum, 0);
    feed(&mut graph, sum, out, 1);
    feed(&mut graph, sum, big, 0);
    feed(&mut graph, big, check, 1);

    let host = execute(&graph);
    assert_eq!(first_arg(&host, "out"), RuntimeValue::Double(21.0));
    assert_eq!(first_arg(&host, "check"), RuntimeValue::Boolean(true));
}

#[test]
fn mismatched_native_kinds_cast_to_default() {
    let (mut graph, start) = graph_with_start();
    let number = graph.add_node(Node::new("number").with_inset(0, 3.0));
    let text = graph.add_node(Node::new("text").with_inset(0, "x"));
    let as_text = emitter(&mut graph, "text", "as_text");
    let as_number = emitter(&mut graph, "number", "as_number");
    then(&mut graph, start, 0, as_text);
    then(&mut graph, as_text, 0, as_number);
    feed(&mut graph, number, as_text, 1);
    feed(&mut graph, text, as_number, 1);

    let host = execute(&graph);
    assert_eq!(first_arg(&host, "as_text"), RuntimeValue::text(""));
    assert_eq!(first_arg(&host, "as_number"), RuntimeValue::Double(0.0));
}

#[test]
fn math_constant_reads_static() {
    let (mut graph, start) = graph_with_start();
    let e = graph.add_node(Node::new("math_constant").with_tag("E"));
    let pi = graph.add_node(Node::new("math_constant"));
    let a = emitter(&mut graph, "number", "a");
    let b = emitter(&mut graph, "number", "b");
    then(&mut graph, start, 0, a);
    then(&mut graph, a, 0, b);
    feed(&mut graph, e, a, 1);
    feed(&mut graph, pi, b, 1);

    let host = execute(&graph);
    assert_eq!(first_arg(&host, "a"), RuntimeValue::Double(std::f64::consts::E));
    assert_eq!(first_arg(&host, "b"), RuntimeValue::Double(std::f64::consts::PI));
}

// Variables

#[test]
fn variables_carry_values_between_nodes() {
    let (mut graph, start) = graph_with_start();
    let set = graph.add_node(
        Node::new("set_variable:number")
            .with_tag("n")
            .with_inset(1, 7.0),
    );
    let get = graph.add_node(Node::new("get_variable:number").with_tag("n"));
    let out = emitter(&mut graph, "number", "out");
    then(&mut graph, start, 0, set);
    then(&mut graph, set, 0, out);
    feed(&mut graph, get, out, 1);

    assert_eq!(first_arg(&execute(&graph), "out"), RuntimeValue::Double(7.0));
}

#[test]
fn unset_variable_reads_default() {
    let (mut graph, start) = graph_with_start();
    let get = graph.add_node(Node::new("get_variable:number").with_tag("never"));
    let out = emitter(&mut graph, "number", "out");
    then(&mut graph, start, 0, out);
    feed(&mut graph, get, out, 1);

    assert_eq!(first_arg(&execute(&graph), "out"), RuntimeValue::Double(0.0));
}

#[test]
fn variable_of_another_kind_reads_default() {
    let (mut graph, start) = graph_with_start();
    let set = graph.add_node(
        Node::new("set_variable:text")
            .with_tag("v")
            .with_inset(1, "hello"),
    );
    let get = graph.add_node(Node::new("get_variable:number").with_tag("v"));
    let out = emitter(&mut graph, "number", "out");
    then(&mut graph, start, 0, set);
    then(&mut graph, set, 0, out);
    feed(&mut graph, get, out, 1);

    assert_eq!(first_arg(&execute(&graph), "out"), RuntimeValue::Double(0.0));
}

#[test]
fn counter_in_loop() {
    // n = 0; repeat 5 { n = n + 1 }; emit n
    let (mut graph, start) = graph_with_start();
    let repeat = graph.add_node(Node::new("repeat").with_inset(1, 5_i64));
    let get = graph.add_node(Node::new("get_variable:number").with_tag("n"));
    let inc = graph.add_node(Node::new("add").with_inset(1, 1.0));
    let set = graph.add_node(Node::new("set_variable:number").with_tag("n"));
    let read = graph.add_node(Node::new("get_variable:number").with_tag("n"));
    let out = emitter(&mut graph, "number", "out");
    then(&mut graph, start, 0, repeat);
    then(&mut graph, repeat, 0, set);
    then(&mut graph, repeat, 1, out);
    feed(&mut graph, get, inc, 0);
    feed(&mut graph, inc, set, 1);
    feed(&mut graph, read, out, 1);

    assert_eq!(first_arg(&execute(&graph), "out"), RuntimeValue::Double(5.0));
}

// Control

#[test]
fn repeat_runs_body_then_done() {
    let (mut graph, start) = graph_with_start();
    let repeat = graph.add_node(Node::new("repeat").with_inset(1, 3_i64));
    let tick = emitter(&mut graph, "number", "tick");
    let done = emitter(&mut graph, "number", "done");
    then(&mut graph, start, 0, repeat);
    then(&mut graph, repeat, 0, tick);
    then(&mut graph, repeat, 1, done);

    assert_eq!(
        targets(&execute(&graph)),
        vec!["tick", "tick", "tick", "done"]
    );
}

#[test]
fn if_takes_one_arm() {
    for (lhs, expected) in [(1.0, "yes"), (3.0, "no")] {
        let (mut graph, start) = graph_with_start();
        let less = graph.add_node(
            Node::new("less_than")
                .with_inset(0, lhs)
                .with_inset(1, 2.0),
        );
        let branch = graph.add_node(Node::new("if"));
        let yes = emitter(&mut graph, "number", "yes");
        let no = emitter(&mut graph, "number", "no");
        then(&mut graph, start, 0, branch);
        then(&mut graph, branch, 0, yes);
        then(&mut graph, branch, 1, no);
        feed(&mut graph, less, branch, 1);

        assert_eq!(targets(&execute(&graph)), vec![expected]);
    }
}

#[test]
fn not_inverts() {
    let (mut graph, start) = graph_with_start();
    let not = graph.add_node(Node::new("not").with_inset(0, false));
    let out = emitter(&mut graph, "condition", "out");
    then(&mut graph, start, 0, out);
    feed(&mut graph, not, out, 1);

    assert_eq!(first_arg(&execute(&graph), "out"), RuntimeValue::Boolean(true));
}

// Wire problems

#[test]
fn removed_source_defaults_input() {
    let (mut graph, start) = graph_with_start();
    let five = graph.add_node(Node::new("number").with_inset(0, 5.0));
    let out = graph.add_node(Node::new("emit:number").with_tag("out").with_inset(1, 2.0));
    then(&mut graph, start, 0, out);
    let wire = feed(&mut graph, five, out, 1);
    graph.remove_node(five);

    let compilation = compile(&graph);
    assert_eq!(
        compilation.problems,
        vec![WireProblem::MissingSource { wire, node: five }]
    );
    assert_eq!(first_arg(&execute(&graph), "out"), RuntimeValue::Double(2.0));
}

#[test]
fn removed_target_is_skipped() {
    let (mut graph, start) = graph_with_start();
    let gone = emitter(&mut graph, "number", "gone");
    let kept = emitter(&mut graph, "number", "kept");
    let wire = then(&mut graph, start, 0, gone);
    then(&mut graph, start, 0, kept);
    graph.remove_node(gone);

    let compilation = compile(&graph);
    assert_eq!(
        compilation.problems,
        vec![WireProblem::MissingTarget { wire, node: gone }]
    );
    assert_eq!(targets(&execute(&graph)), vec!["kept"]);
}

#[test]
fn missing_output_index_defaults_input() {
    let (mut graph, start) = graph_with_start();
    let five = graph.add_node(Node::new("number").with_inset(0, 5.0));
    let out = emitter(&mut graph, "number", "out");
    then(&mut graph, start, 0, out);
    let from = Port::new(five, 3);
    let wire = graph.connect(from, Port::new(out, 1));

    let compilation = compile(&graph);
    assert_eq!(
        compilation.problems,
        vec![WireProblem::MissingOutput { wire, port: from }]
    );
    assert_eq!(first_arg(&execute(&graph), "out"), RuntimeValue::Double(0.0));
}

#[test]
fn signal_into_value_input_is_ignored() {
    let (mut graph, start) = graph_with_start();
    let out = emitter(&mut graph, "number", "out");
    then(&mut graph, start, 0, out);
    let stray = graph.connect(Port::new(start, 0), Port::new(out, 1));

    let compilation = compile(&graph);
    assert_eq!(
        compilation.problems,
        vec![WireProblem::SignalIntoValue {
            wire: stray,
            input: Port::new(out, 1),
        }]
    );
    assert_eq!(targets(&execute(&graph)), vec!["out"]);
}

#[test]
fn signal_into_missing_input_is_ignored() {
    let (mut graph, start) = graph_with_start();
    let out = emitter(&mut graph, "number", "out");
    let to = Port::new(out, 7);
    let wire = graph.connect(Port::new(start, 0), to);

    let compilation = compile(&graph);
    assert_eq!(
        compilation.problems,
        vec![WireProblem::MissingInput { wire, port: to }]
    );
}

// Structural errors

#[test]
fn entry_is_required() {
    assert_eq!(compile_err(&Graph::new()), CompileError::NoEntry);

    let (mut graph, start) = graph_with_start();
    graph.remove_node(start);
    assert_eq!(compile_err(&graph), CompileError::MissingEntry(start));
}

#[test]
fn unknown_kind_fails() {
    let (mut graph, start) = graph_with_start();
    let odd = graph.add_node(Node::new("vector"));
    then(&mut graph, start, 0, odd);
    assert_eq!(
        compile_err(&graph),
        CompileError::UnknownKind {
            node: odd,
            kind: "vector".to_owned(),
        }
    );
}

#[test]
fn signal_cycle_fails() {
    let (mut graph, start) = graph_with_start();
    let a = emitter(&mut graph, "number", "a");
    let b = emitter(&mut graph, "number", "b");
    then(&mut graph, start, 0, a);
    then(&mut graph, a, 0, b);
    then(&mut graph, b, 0, a);
    assert_eq!(compile_err(&graph), CompileError::SignalCycle(a));
}

#[test]
fn value_cycle_fails() {
    let (mut graph, start) = graph_with_start();
    let x = graph.add_node(Node::new("add"));
    let y = graph.add_node(Node::new("add"));
    let out = emitter(&mut graph, "number", "out");
    then(&mut graph, start, 0, out);
    feed(&mut graph, x, y, 0);
    feed(&mut graph, y, x, 0);
    feed(&mut graph, x, out, 1);
    assert_eq!(
        compile_err(&graph),
        CompileError::ValueCycle(Port::new(x, 0))
    );
}

#[test]
fn value_fan_in_fails() {
    let (mut graph, start) = graph_with_start();
    let one = graph.add_node(Node::new("number"));
    let two = graph.add_node(Node::new("number"));
    let out = emitter(&mut graph, "number", "out");
    then(&mut graph, start, 0, out);
    feed(&mut graph, one, out, 1);
    feed(&mut graph, two, out, 1);
    assert_eq!(
        compile_err(&graph),
        CompileError::ValueFanIn {
            port: Port::new(out, 1),
            count: 2,
        }
    );
}

#[test]
fn inset_beyond_declared_inputs_fails() {
    let (mut graph, start) = graph_with_start();
    let out = graph.add_node(Node::new("emit:number").with_inset(5, 1.0));
    then(&mut graph, start, 0, out);
    assert_eq!(
        compile_err(&graph),
        CompileError::InputOutOfRange {
            node: out,
            kind: "emit:number".to_owned(),
            index: 5,
            declared: 2,
        }
    );
}

#[test]
fn variable_without_tag_fails() {
    let (mut graph, start) = graph_with_start();
    let set = graph.add_node(Node::new("set_variable:number"));
    then(&mut graph, start, 0, set);
    assert_eq!(
        compile_err(&graph),
        CompileError::MissingTag {
            node: set,
            kind: "set_variable:number".to_owned(),
        }
    );
}

struct Sink;

impl NodeKind for Sink {
    fn name(&self) -> &str {
        "sink"
    }

    fn inputs(&self) -> &[PortSpec] {
        const INPUTS: [PortSpec; 1] = [PortSpec::signal("in")];
        &INPUTS
    }

    fn outputs(&self) -> &[PortSpec] {
        &[]
    }
}

#[test]
fn kind_without_activation_fails() {
    let mut catalog = Catalog::builtin();
    catalog.register(Sink);
    let (mut graph, start) = graph_with_start();
    let sink = graph.add_node(Node::new("sink"));
    then(&mut graph, start, 0, sink);
    assert_eq!(
        compile_graph(&graph, &catalog).unwrap_err(),
        CompileError::NotActivatable {
            node: sink,
            kind: "sink".to_owned(),
        }
    );
}

/// Reads its signal input as a value and follows its value output.
struct Confused;

impl NodeKind for Confused {
    fn name(&self) -> &str {
        "confused"
    }

    fn inputs(&self) -> &[PortSpec] {
        const INPUTS: [PortSpec; 1] = [PortSpec::signal("in")];
        &INPUTS
    }

    fn outputs(&self) -> &[PortSpec] {
        const OUTPUTS: [PortSpec; 1] = [PortSpec::native("value", ValueKind::Number)];
        &OUTPUTS
    }

    fn activate(
        &self,
        cx: &mut Activation<'_, '_>,
        _input: usize,
    ) -> Result<Instruction, CompileError> {
        cx.follow(0)
    }

    fn output(&self, cx: &mut Activation<'_, '_>, _index: usize) -> Result<Instruction, CompileError> {
        cx.input(0)
    }
}

#[test]
fn port_direction_mistakes_name_the_port() {
    let mut catalog = Catalog::builtin();
    catalog.register(Confused);

    let (mut graph, start) = graph_with_start();
    let confused = graph.add_node(Node::new("confused"));
    then(&mut graph, start, 0, confused);
    let err = compile_graph(&graph, &catalog).unwrap_err();
    assert_eq!(err, CompileError::NotASignal(Port::new(confused, 0)));
    assert_eq!(
        err.to_string(),
        format!("{confused}.0 is a value port where a signal was expected")
    );

    let (mut graph, start) = graph_with_start();
    let confused = graph.add_node(Node::new("confused"));
    let out = emitter(&mut graph, "number", "out");
    then(&mut graph, start, 0, out);
    feed(&mut graph, confused, out, 1);
    let err = compile_graph(&graph, &catalog).unwrap_err();
    assert_eq!(err, CompileError::NotAValue(Port::new(confused, 0)));
    assert_eq!(
        err.to_string(),
        format!("{confused}.0 is a signal port where a value was expected")
    );
}
