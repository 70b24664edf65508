//! Error types for graph construction and tracing.

use thiserror::Error;

/// Errors produced while building the backward graph or mirroring a forward
/// call into a trace.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A node required backward-subgraph capture but does not implement
    /// saved-variable retrieval.
    #[error("saved variables needed but not implemented in {node}")]
    MissingSavedVariables { node: String },

    /// A non-traceable node was applied through the trace bridge while none
    /// of its inputs carried a live tracing session.
    #[error("no tracing state is attached to any input")]
    NoTracingState,

    /// Operand shapes are incompatible for an elementwise operation.
    #[error("shape mismatch between operands: {left:?} and {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    /// An operation received a different number of operands than it expects.
    #[error("{op} expects {expected} operands, got {actual}")]
    Arity {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An operation requires a defined operand at a position where an
    /// undefined variable was passed.
    #[error("{op} requires a defined operand at position {position}")]
    UndefinedOperand { op: &'static str, position: usize },
}
