use std::sync::Arc;

use crate::{
    accumulator::GradAccumulator, checkpoint::ContextSlot, error::GraphError, variable::Variable,
};

/// Backward target of an [`Edge`]: either the node that produced the input or,
/// for leaves, the input's gradient accumulator.
///
/// Targets are held through strong references, so a shared sub-result stays
/// alive as long as any downstream edge points at it. Edges only ever point
/// backward, toward producers, which keeps the graph acyclic.
#[derive(Clone)]
pub enum EdgeTarget {
    /// The input was produced by this node.
    Node(Arc<dyn Function>),
    /// The input is a leaf; gradients accumulate here.
    Accumulator(Arc<GradAccumulator>),
}

/// One entry of a node's edge table.
#[derive(Clone)]
pub struct Edge {
    /// Where the gradient for this input flows.
    pub target: EdgeTarget,
    /// Which output of the target node the input came from. Always zero for
    /// accumulators.
    pub output_nr: usize,
}

/// Executability and connectivity of a node, stamped once at construction
/// from its prospective inputs and never mutated afterwards.
#[derive(Clone, Default)]
pub struct FunctionFlags {
    /// The node takes part in the backward pass: at least one input requires
    /// gradients and none is volatile.
    pub is_executable: bool,
    /// At least one input is volatile.
    pub is_volatile: bool,
    /// One entry per input, in input order. Undefined inputs leave a `None`
    /// gap so that indexing by input position stays valid.
    pub edges: Vec<Option<Edge>>,
}

impl FunctionFlags {
    /// Resolves the flags of a node from its inputs.
    ///
    /// Pure and deterministic: for each defined input its gradient
    /// requirement is OR-ed into `is_executable` and its volatility into
    /// `is_volatile`, and an edge is recorded toward its producing node (at
    /// the input's output index) or its accumulator (at slot 0). Undefined
    /// inputs contribute nothing but still occupy their positional slot.
    /// A single volatile input poisons executability for the whole node.
    ///
    /// An empty input sequence yields a valid, simply non-differentiable
    /// node.
    ///
    /// Any ordered sequence of variables is accepted, slices and fixed-size
    /// arrays included.
    pub fn from_inputs<'a, I>(inputs: I) -> Self
    where
        I: IntoIterator<Item = &'a Variable>,
    {
        let mut flags = Self::default();

        for input in inputs {
            if !input.defined() {
                flags.edges.push(None);
                continue;
            }

            flags.is_executable |= input.requires_grad();
            flags.is_volatile |= input.is_volatile();

            let edge = match input.grad_fn() {
                Some(function) => Edge {
                    target: EdgeTarget::Node(function),
                    output_nr: input.output_nr(),
                },
                None => Edge {
                    target: EdgeTarget::Accumulator(input.grad_accumulator()),
                    output_nr: 0,
                },
            };
            flags.edges.push(Some(edge));
        }

        flags.is_executable &= !flags.is_volatile;
        flags
    }
}

/// A value saved by a node for its backward pass.
///
/// The trace bridge unpacks saved variables when it has to capture a node's
/// backward subgraph; how the value is later consumed numerically is not this
/// crate's concern.
#[derive(Clone)]
pub struct SavedVariable {
    value: Variable,
}

impl SavedVariable {
    pub fn new(value: &Variable) -> Self {
        Self {
            value: value.clone(),
        }
    }

    /// Yields the saved value back as a variable.
    pub fn unpack(&self) -> Variable {
        self.value.clone()
    }
}

/// A node of the backward graph.
///
/// Implementors supply the forward math in [`apply`](Function::apply) and
/// stamp their [`FunctionFlags`] from their inputs at construction time.
/// Everything else has defaults: nodes are not traceable, do not pass state
/// transparently, save no variables and carry no context slot. Checkpoint
/// node kinds override [`context_slot`](Function::context_slot) instead of
/// the bridge special-casing them by type.
///
/// Nodes and their flags are immutable once constructed and may be read
/// concurrently by backward-traversal schedulers.
pub trait Function: Send + Sync {
    /// Identifies the node kind, for diagnostics and error messages.
    fn name(&self) -> &'static str;

    /// The flags stamped at construction.
    fn flags(&self) -> &FunctionFlags;

    /// Runs the forward computation.
    ///
    /// Outputs are returned in order; each defined output should point back
    /// at this node through [`Variable::from_op`].
    fn apply(self: Arc<Self>, inputs: &[Variable]) -> Result<Vec<Variable>, GraphError>;

    /// `true` if the forward already natively participates in tracing and
    /// needs no bridging.
    fn is_traceable(&self) -> bool {
        false
    }

    /// `true` if the node is a transparent pass-through within an enclosing
    /// capture subgraph and must not get its own context edge.
    fn passes_state_transparently(&self) -> bool {
        false
    }

    /// The values this node saved for its backward pass, if it implements
    /// saving at all. Nodes that save nothing return `Some` of an empty
    /// sequence; `None` means the contract is unimplemented and backward
    /// capture of this node is a fatal error.
    fn saved_variables(&self) -> Option<Vec<SavedVariable>> {
        None
    }

    /// The slot receiving this node's forward-context select, exposed only by
    /// checkpoint node kinds.
    fn context_slot(&self) -> Option<&ContextSlot> {
        None
    }
}
