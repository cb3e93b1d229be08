//! Built-in node kinds.
//!
//! Per value kind (number, condition, text) the catalog also carries a family
//! of kinds named `<family>:<kind>`: `set_variable`, `get_variable`, `emit`
//! and `query`.

use flow_bytecode::{ArithOp, CompareOp, Op, StackType};

use super::{Catalog, NodeKind, PortSpec};
use crate::error::CompileError;
use crate::instruction::Instruction;
use crate::linearize::Activation;
use crate::value::ValueKind;

pub(super) fn register_all(catalog: &mut Catalog) {
    catalog.register(Start);
    for kind in ValueKind::VALUES {
        catalog.register(ConstantValue::new(kind));
        catalog.register(SetVariable::new(kind));
        catalog.register(GetVariable::new(kind));
        catalog.register(Emit::new(kind));
        catalog.register(Query::new(kind));
    }
    for (name, op) in [
        ("add", ArithOp::Add),
        ("subtract", ArithOp::Sub),
        ("multiply", ArithOp::Mul),
        ("divide", ArithOp::Div),
    ] {
        catalog.register(Arithmetic::new(name, op));
    }
    for (name, op) in [
        ("less_than", CompareOp::Lt),
        ("greater_than", CompareOp::Gt),
        ("equals", CompareOp::Eq),
    ] {
        catalog.register(Comparison::new(name, op));
    }
    catalog.register(Not);
    catalog.register(If);
    catalog.register(Repeat);
    catalog.register(MathConstant);
}

/// `start`: the usual entry node. One signal output, nothing else.
pub struct Start;

impl NodeKind for Start {
    fn name(&self) -> &str {
        "start"
    }

    fn inputs(&self) -> &[PortSpec] {
        &[]
    }

    fn outputs(&self) -> &[PortSpec] {
        const OUTPUTS: [PortSpec; 1] = [PortSpec::signal("next")];
        &OUTPUTS
    }
}

/// `number`, `condition`, `text`: outputs its input, so an unwired node
/// yields its inset.
pub struct ConstantValue {
    kind: ValueKind,
    ports: [PortSpec; 1],
}

impl ConstantValue {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            ports: [PortSpec::native("value", kind)],
        }
    }
}

impl NodeKind for ConstantValue {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn inputs(&self) -> &[PortSpec] {
        &self.ports
    }

    fn outputs(&self) -> &[PortSpec] {
        &self.ports
    }

    fn output(&self, cx: &mut Activation<'_, '_>, index: usize) -> Result<Instruction, CompileError> {
        match index {
            0 => cx.input(0),
            _ => Err(cx.no_value_output(index)),
        }
    }
}

const NUMBER_PAIR: [PortSpec; 2] = [
    PortSpec::native("a", ValueKind::Number),
    PortSpec::native("b", ValueKind::Number),
];

/// `add`, `subtract`, `multiply`, `divide`.
pub struct Arithmetic {
    name: &'static str,
    op: ArithOp,
}

impl Arithmetic {
    pub fn new(name: &'static str, op: ArithOp) -> Self {
        Self { name, op }
    }
}

impl NodeKind for Arithmetic {
    fn name(&self) -> &str {
        self.name
    }

    fn inputs(&self) -> &[PortSpec] {
        &NUMBER_PAIR
    }

    fn outputs(&self) -> &[PortSpec] {
        const OUTPUTS: [PortSpec; 1] = [PortSpec::native("result", ValueKind::Number)];
        &OUTPUTS
    }

    fn output(&self, cx: &mut Activation<'_, '_>, index: usize) -> Result<Instruction, CompileError> {
        if index != 0 {
            return Err(cx.no_value_output(index));
        }
        let lhs = cx.input(0)?;
        let rhs = cx.input(1)?;
        Ok(Instruction::arith(self.op, lhs, rhs))
    }
}

/// `less_than`, `greater_than`, `equals` over numbers.
pub struct Comparison {
    name: &'static str,
    op: CompareOp,
}

impl Comparison {
    pub fn new(name: &'static str, op: CompareOp) -> Self {
        Self { name, op }
    }
}

impl NodeKind for Comparison {
    fn name(&self) -> &str {
        self.name
    }

    fn inputs(&self) -> &[PortSpec] {
        &NUMBER_PAIR
    }

    fn outputs(&self) -> &[PortSpec] {
        const OUTPUTS: [PortSpec; 1] = [PortSpec::native("result", ValueKind::Condition)];
        &OUTPUTS
    }

    fn output(&self, cx: &mut Activation<'_, '_>, index: usize) -> Result<Instruction, CompileError> {
        if index != 0 {
            return Err(cx.no_value_output(index));
        }
        let lhs = cx.input(0)?;
        let rhs = cx.input(1)?;
        Ok(Instruction::compare(self.op, lhs, rhs))
    }
}

/// `not`: boolean negation.
pub struct Not;

impl NodeKind for Not {
    fn name(&self) -> &str {
        "not"
    }

    fn inputs(&self) -> &[PortSpec] {
        const INPUTS: [PortSpec; 1] = [PortSpec::native("value", ValueKind::Condition)];
        &INPUTS
    }

    fn outputs(&self) -> &[PortSpec] {
        const OUTPUTS: [PortSpec; 1] = [PortSpec::native("result", ValueKind::Condition)];
        &OUTPUTS
    }

    fn output(&self, cx: &mut Activation<'_, '_>, index: usize) -> Result<Instruction, CompileError> {
        if index != 0 {
            return Err(cx.no_value_output(index));
        }
        let value = cx.input(0)?;
        Ok(Instruction::sequence(
            StackType::Boolean,
            vec![value, Instruction::op(Op::Not, StackType::Boolean)],
        ))
    }
}

/// `if`: follows `then` or `else` depending on its condition.
pub struct If;

impl NodeKind for If {
    fn name(&self) -> &str {
        "if"
    }

    fn inputs(&self) -> &[PortSpec] {
        const INPUTS: [PortSpec; 2] = [
            PortSpec::signal("in"),
            PortSpec::native("condition", ValueKind::Condition),
        ];
        &INPUTS
    }

    fn outputs(&self) -> &[PortSpec] {
        const OUTPUTS: [PortSpec; 2] = [PortSpec::signal("then"), PortSpec::signal("else")];
        &OUTPUTS
    }

    fn activate(
        &self,
        cx: &mut Activation<'_, '_>,
        _input: usize,
    ) -> Result<Instruction, CompileError> {
        let condition = cx.input(1)?;
        let then = cx.follow(0)?;
        let otherwise = cx.follow(1)?;
        Ok(Instruction::branch(condition, then, otherwise))
    }
}

/// `repeat`: follows `body` `times` times, then `done`.
pub struct Repeat;

impl NodeKind for Repeat {
    fn name(&self) -> &str {
        "repeat"
    }

    fn inputs(&self) -> &[PortSpec] {
        const INPUTS: [PortSpec; 2] = [
            PortSpec::signal("in"),
            PortSpec::native("times", ValueKind::Number),
        ];
        &INPUTS
    }

    fn outputs(&self) -> &[PortSpec] {
        const OUTPUTS: [PortSpec; 2] = [PortSpec::signal("body"), PortSpec::signal("done")];
        &OUTPUTS
    }

    fn activate(
        &self,
        cx: &mut Activation<'_, '_>,
        _input: usize,
    ) -> Result<Instruction, CompileError> {
        let times = cx.input(1)?;
        let body = cx.follow(0)?;
        let done = cx.follow(1)?;
        Ok(Instruction::sequence(
            StackType::Void,
            vec![Instruction::repeat(times, body), done],
        ))
    }
}

/// `set_variable:<kind>`: stores its boxed input under the node's tag.
pub struct SetVariable {
    name: String,
    inputs: [PortSpec; 2],
}

impl SetVariable {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            name: format!("set_variable:{kind}"),
            inputs: [PortSpec::signal("in"), PortSpec::boxed("value", kind)],
        }
    }
}

impl NodeKind for SetVariable {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[PortSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[PortSpec] {
        const OUTPUTS: [PortSpec; 1] = [PortSpec::signal("next")];
        &OUTPUTS
    }

    fn activate(
        &self,
        cx: &mut Activation<'_, '_>,
        _input: usize,
    ) -> Result<Instruction, CompileError> {
        let variable = cx.require_tag()?;
        let value = cx.input(1)?;
        let next = cx.follow(0)?;
        Ok(Instruction::sequence(
            StackType::Void,
            vec![Instruction::store_variable(variable, value), next],
        ))
    }
}

/// `get_variable:<kind>`: the boxed value last stored under the node's tag.
pub struct GetVariable {
    name: String,
    outputs: [PortSpec; 1],
}

impl GetVariable {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            name: format!("get_variable:{kind}"),
            outputs: [PortSpec::boxed("value", kind)],
        }
    }
}

impl NodeKind for GetVariable {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[PortSpec] {
        &[]
    }

    fn outputs(&self) -> &[PortSpec] {
        &self.outputs
    }

    fn output(&self, cx: &mut Activation<'_, '_>, index: usize) -> Result<Instruction, CompileError> {
        if index != 0 {
            return Err(cx.no_value_output(index));
        }
        let variable = cx.require_tag()?;
        Ok(Instruction::load_variable(variable))
    }
}

/// `emit:<kind>`: hands its input to a host function. The tag names the
/// function; untagged nodes call `emit_<kind>`.
pub struct Emit {
    name: String,
    function: String,
    inputs: [PortSpec; 2],
}

impl Emit {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            name: format!("emit:{kind}"),
            function: format!("emit_{kind}"),
            inputs: [PortSpec::signal("in"), PortSpec::native("value", kind)],
        }
    }
}

impl NodeKind for Emit {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[PortSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[PortSpec] {
        const OUTPUTS: [PortSpec; 1] = [PortSpec::signal("next")];
        &OUTPUTS
    }

    fn activate(
        &self,
        cx: &mut Activation<'_, '_>,
        _input: usize,
    ) -> Result<Instruction, CompileError> {
        let function = cx.tag().unwrap_or(self.function.as_str());
        let value = cx.input(1)?;
        let call = Instruction::call(function, vec![value], StackType::Void)?;
        let next = cx.follow(0)?;
        Ok(Instruction::sequence(StackType::Void, vec![call, next]))
    }
}

/// `query:<kind>`: a value computed by a host function. The tag names the
/// function; untagged nodes call `query_<kind>`.
pub struct Query {
    name: String,
    function: String,
    kind: ValueKind,
    outputs: [PortSpec; 1],
}

impl Query {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            name: format!("query:{kind}"),
            function: format!("query_{kind}"),
            kind,
            outputs: [PortSpec::native("value", kind)],
        }
    }
}

impl NodeKind for Query {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[PortSpec] {
        &[]
    }

    fn outputs(&self) -> &[PortSpec] {
        &self.outputs
    }

    fn output(&self, cx: &mut Activation<'_, '_>, index: usize) -> Result<Instruction, CompileError> {
        if index != 0 {
            return Err(cx.no_value_output(index));
        }
        let function = cx.tag().unwrap_or(self.function.as_str());
        Instruction::call(function, Vec::new(), self.kind.native_type())
    }
}

/// `math_constant`: reads `Math.<tag>`, `Math.PI` when untagged.
pub struct MathConstant;

impl NodeKind for MathConstant {
    fn name(&self) -> &str {
        "math_constant"
    }

    fn inputs(&self) -> &[PortSpec] {
        &[]
    }

    fn outputs(&self) -> &[PortSpec] {
        const OUTPUTS: [PortSpec; 1] = [PortSpec::native("value", ValueKind::Number)];
        &OUTPUTS
    }

    fn output(&self, cx: &mut Activation<'_, '_>, index: usize) -> Result<Instruction, CompileError> {
        if index != 0 {
            return Err(cx.no_value_output(index));
        }
        let field = cx.tag().unwrap_or("PI");
        Ok(Instruction::op(
            Op::GetStatic {
                owner: "Math".into(),
                name: field.into(),
                ty: StackType::Double,
            },
            StackType::Double,
        ))
    }
}
