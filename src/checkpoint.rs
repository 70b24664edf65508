use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    error::GraphError,
    function::{Function, FunctionFlags, SavedVariable},
    trace::{TraceNodeId, TraceState},
    variable::Variable,
};

/// Slot holding a node's forward-context select.
///
/// Every checkpoint node kind exposes one through
/// [`Function::context_slot`]; the context-edge linker fills it in when the
/// forward counterpart of the checkpoint is traced. Non-checkpoint kinds
/// simply expose none, which is how the bridge tells the two apart without
/// downcasting.
#[derive(Default)]
pub struct ContextSlot(Mutex<Option<TraceNodeId>>);

impl ContextSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<TraceNodeId> {
        *self.0.lock()
    }

    pub fn set(&self, id: TraceNodeId) {
        *self.0.lock() = Some(id);
    }
}

/// A node standing for a re-entrant, recomputed subgraph.
///
/// Its forward delegates to the wrapped node with the session's
/// nested-checkpoint flag raised, so nodes applied inside the subgraph skip
/// their own redundant backward capture. The flag is restored on exit, nested
/// checkpoints included.
pub struct Checkpoint {
    inner: Arc<dyn Function>,
    flags: FunctionFlags,
    forward_ctx_select: ContextSlot,
}

impl Checkpoint {
    /// Wraps `inner`, stamping flags from the prospective inputs.
    pub fn new<'a, I>(inner: Arc<dyn Function>, inputs: I) -> Arc<Self>
    where
        I: IntoIterator<Item = &'a Variable>,
    {
        Arc::new(Self {
            inner,
            flags: FunctionFlags::from_inputs(inputs),
            forward_ctx_select: ContextSlot::new(),
        })
    }
}

impl Function for Checkpoint {
    fn name(&self) -> &'static str {
        "Checkpoint"
    }

    fn flags(&self) -> &FunctionFlags {
        &self.flags
    }

    fn apply(self: Arc<Self>, inputs: &[Variable]) -> Result<Vec<Variable>, GraphError> {
        match TraceState::of(inputs) {
            Ok(state) => {
                let previous = state.set_in_checkpoint(true);
                let result = Arc::clone(&self.inner).apply(inputs);
                state.set_in_checkpoint(previous);
                result
            }
            // Without a session there is nothing to shield from re-capture.
            Err(_) => Arc::clone(&self.inner).apply(inputs),
        }
    }

    fn saved_variables(&self) -> Option<Vec<SavedVariable>> {
        self.inner.saved_variables()
    }

    fn context_slot(&self) -> Option<&ContextSlot> {
        Some(&self.forward_ctx_select)
    }
}
