//! Compiled units handed to the target encoder.

use std::fmt;

use crate::op::Op;

/// The output of one full-graph compilation.
///
/// This is the whole contract with the encoder: the flat ordered operation
/// list and the number of local slots the routine needs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompiledUnit {
    /// Operations in execution order, labels inline.
    pub ops: Vec<Op>,
    /// Total local slots consumed (reserved + temporaries).
    pub max_locals: u32,
}

impl CompiledUnit {
    pub fn new(ops: Vec<Op>, max_locals: u32) -> Self {
        Self { ops, max_locals }
    }

    /// Number of real (non-label) operations.
    pub fn op_count(&self) -> usize {
        self.ops.iter().filter(|op| !op.is_label()).count()
    }
}

/// Human-readable listing: one operation per line, labels flush left.
impl fmt::Display for CompiledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; locals: {}", self.max_locals)?;
        for op in &self.ops {
            if op.is_label() {
                writeln!(f, "{op}")?;
            } else {
                writeln!(f, "    {op}")?;
            }
        }
        Ok(())
    }
}
