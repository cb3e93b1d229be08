//! Stack growth guard for deep graph walks.
//!
//! Signal chains and value dependency chains in an authored graph can be
//! arbitrarily long, and both the linearizer and the instruction compiler
//! walk them recursively. [`ensure_sufficient_stack`] grows the stack on
//! demand so a long chain of nodes never overflows the native stack.
//!
//! - **Native targets**: `stacker` grows the stack when the red zone is hit.
//! - **WASM targets**: plain passthrough.

/// Remaining stack below which we grow (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains.
///
/// Wrap every recursive step that follows graph edges:
///
/// ```text
/// fn follow(&mut self, port: Port) -> Result<Instruction, CompileError> {
///     ensure_sufficient_stack(|| self.follow_inner(port))
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
