mod graph;

use std::{collections::HashMap, sync::Arc};

use parking_lot::{Mutex, MutexGuard};

use crate::{
    error::GraphError,
    function::{Function, SavedVariable},
    variable::Variable,
};

pub use graph::{TraceGraph, TraceNode, TraceNodeId, TraceOp, TraceType};

/// Inputs and outputs of a call whose backward subgraph must be captured for
/// later replay, handed over by the bridge when a node's backward pass cannot
/// be traced directly.
pub struct BackwardSubgraph {
    /// The call's inputs extended with the node's unpacked saved variables.
    pub inputs: Vec<Variable>,
    /// The call's real outputs.
    pub outputs: Vec<Variable>,
}

/// Mutable interior of a tracing session, reachable only through the
/// session's lock.
pub struct TraceInner {
    graph: TraceGraph,
    value_map: HashMap<usize, TraceNodeId>,
    in_checkpoint_subgraph: bool,
    backward_checkpoints: HashMap<usize, Arc<dyn Function>>,
    backward_subgraphs: Vec<BackwardSubgraph>,
}

impl TraceInner {
    /// The trace graph built so far.
    pub fn graph(&self) -> &TraceGraph {
        &self.graph
    }

    /// `true` while forward execution runs inside a checkpointed subgraph.
    pub fn in_checkpoint_subgraph(&self) -> bool {
        self.in_checkpoint_subgraph
    }

    /// Backward subgraphs marked for capture so far.
    pub fn backward_subgraphs(&self) -> &[BackwardSubgraph] {
        &self.backward_subgraphs
    }

    /// Resolves the trace value of `variable`, creating a graph input on
    /// first sight. Undefined variables have no identity and always map to a
    /// fresh input, mirroring the gap they leave in the edge table.
    fn value_trace(&mut self, variable: &Variable) -> TraceNodeId {
        let key = match variable.key() {
            Some(key) => key,
            None => {
                let id = self.graph.create_input();
                self.graph.append(id);
                return id;
            }
        };

        if let Some(&id) = self.value_map.get(&key) {
            return id;
        }

        let id = self.graph.create_input();
        self.graph.append(id);
        self.value_map.insert(key, id);

        id
    }

    /// Associates `variable` with the trace value `id`.
    fn set_value_trace(&mut self, variable: &Variable, id: TraceNodeId) {
        if let Some(key) = variable.key() {
            self.value_map.insert(key, id);
        }
    }

    /// The checkpoint registered as the backward counterpart of this call,
    /// looked up by output identity first and input identity second.
    fn backward_checkpoint_for(
        &self,
        inputs: &[Variable],
        outputs: &[Variable],
    ) -> Option<Arc<dyn Function>> {
        outputs
            .iter()
            .chain(inputs)
            .filter_map(Variable::key)
            .find_map(|key| self.backward_checkpoints.get(&key).map(Arc::clone))
    }
}

/// A tracing session.
///
/// One state is created per top-level traced invocation and threaded through
/// nested apply calls by attaching itself to every variable it has seen. The
/// lock is the only exclusive section in the crate: it is held around trace
/// mutation and deliberately released around the actual forward computation,
/// so long-running forward work never serializes other threads' bookkeeping.
pub struct TraceState {
    inner: Mutex<TraceInner>,
}

impl TraceState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(TraceInner {
                graph: TraceGraph::default(),
                value_map: HashMap::new(),
                in_checkpoint_subgraph: false,
                backward_checkpoints: HashMap::new(),
                backward_subgraphs: Vec::new(),
            }),
        })
    }

    /// Recovers the ambient session from a call's inputs.
    pub fn of(inputs: &[Variable]) -> Result<Arc<Self>, GraphError> {
        inputs
            .iter()
            .find_map(Variable::tracing_state)
            .ok_or(GraphError::NoTracingState)
    }

    /// Acquires the exclusive section.
    pub fn lock(&self) -> MutexGuard<'_, TraceInner> {
        self.inner.lock()
    }

    /// Registers the top-level inputs of a traced invocation, creating their
    /// graph inputs and attaching the session to them.
    pub fn trace_inputs(self: &Arc<Self>, inputs: &[Variable]) {
        let mut inner = self.lock();
        for input in inputs {
            if input.defined() {
                inner.value_trace(input);
                input.attach_tracing_state(self);
            }
        }
    }

    /// Registers `backward` as the checkpoint that will replay the backward
    /// pass of the call touching `variables`. The context-edge linker later
    /// resolves it through the identities of the call's inputs and outputs.
    pub fn register_backward_checkpoint(&self, variables: &[Variable], backward: Arc<dyn Function>) {
        let mut inner = self.lock();
        for variable in variables {
            if let Some(key) = variable.key() {
                inner.backward_checkpoints.insert(key, Arc::clone(&backward));
            }
        }
    }

    /// Flips the nested-checkpoint flag, returning its previous value so the
    /// caller can restore it on exit.
    pub(crate) fn set_in_checkpoint(&self, value: bool) -> bool {
        let mut inner = self.lock();
        std::mem::replace(&mut inner.in_checkpoint_subgraph, value)
    }
}

/// Applies `node` to `inputs`, mirroring the call into the ambient trace.
///
/// This is the single entry point for forward execution with tracing support.
/// Traceable nodes self-report and bypass the bridge entirely; for everyone
/// else a composite trace node standing for the whole call is inserted, the
/// real forward runs outside the lock, and one select per output projects the
/// composite node's results. Nodes that do not pass state transparently then
/// get their backward subgraph captured, unless execution is already nested
/// inside another checkpoint's subgraph, and a context edge is linked
/// whenever capture ran or the node is itself a checkpoint.
///
/// # Errors
///
/// [`GraphError::NoTracingState`] when no input carries a live session, and
/// [`GraphError::MissingSavedVariables`] when capture is required but the
/// node does not implement saved-variable retrieval. On that fatal path the
/// already-computed outputs are dropped; the caller only sees the error.
pub fn traced_apply(node: Arc<dyn Function>, inputs: &[Variable]) -> Result<Vec<Variable>, GraphError> {
    if node.is_traceable() {
        return node.apply(inputs);
    }

    let state = TraceState::of(inputs)?;
    let mut inner = state.lock();
    tracing::trace!(node = node.name(), num_inputs = inputs.len(), "mirroring call into trace");

    let this_node = inner.graph.create_external_op(Arc::clone(&node));
    for input in inputs {
        let value = inner.value_trace(input);
        inner.graph.add_input(this_node, value);
        input.attach_tracing_state(&state);
    }
    inner.graph.append(this_node);

    // The forward computation must not run under the trace lock.
    drop(inner);
    let outputs = Arc::clone(&node).apply(inputs)?;
    let mut inner = state.lock();

    for (i, output) in outputs.iter().enumerate() {
        let select = inner.graph.create_select(this_node, i);
        inner.graph.append(select);
        if output.defined() {
            inner.graph.set_type(select, TraceType::of_tensor(output.data()));
            inner.set_value_trace(output, select);
            output.attach_tracing_state(&state);
        }
    }

    if !node.passes_state_transparently() {
        // A checkpoint consumes the handle its forward counterpart produced.
        if let Some(context) = node.context_slot().and_then(|slot| slot.get()) {
            inner.graph.add_input(this_node, context);
        }

        // Nested captures are redundant: the enclosing checkpoint already
        // owns the backward subgraph, and many node kinds only implement
        // saved_variables() because capture would otherwise require it.
        let backward_already_traced = inner.in_checkpoint_subgraph;
        if !backward_already_traced {
            let saved = node
                .saved_variables()
                .ok_or_else(|| GraphError::MissingSavedVariables {
                    node: node.name().to_owned(),
                })?;

            let mut subgraph_inputs = inputs.to_vec();
            subgraph_inputs.extend(saved.iter().map(SavedVariable::unpack));
            tracing::debug!(node = node.name(), "marking non-traceable backward subgraph");
            inner.backward_subgraphs.push(BackwardSubgraph {
                inputs: subgraph_inputs,
                outputs: outputs.clone(),
            });
        }

        if !backward_already_traced || node.context_slot().is_some() {
            link_context_edge(&mut inner, this_node, outputs.len(), inputs, &outputs);
        }
    }

    Ok(outputs)
}

/// Appends the context edge of a call: a select projecting the slot right
/// after the real outputs, typed as an opaque handle. If a backward
/// checkpoint is registered for these outputs, the select is stored into its
/// context slot so a later traced backward pass can retrieve the forward
/// context as a first-class traced value.
fn link_context_edge(
    inner: &mut TraceInner,
    node: TraceNodeId,
    context_output_nr: usize,
    inputs: &[Variable],
    outputs: &[Variable],
) {
    let select = inner.graph.create_select(node, context_output_nr);
    inner.graph.append(select);
    inner.graph.set_type(select, TraceType::Handle);

    if let Some(backward) = inner.backward_checkpoint_for(inputs, outputs) {
        if let Some(slot) = backward.context_slot() {
            slot.set(select);
        }
    }
}
