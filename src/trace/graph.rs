use std::sync::Arc;

use ndarray::ArrayD;

use crate::function::Function;

/// Index of a node in a [`TraceGraph`] arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TraceNodeId(usize);

/// Type attached to a trace value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceType {
    /// A tensor of the given shape, inferred from concrete forward data.
    Tensor { shape: Vec<usize> },
    /// An opaque handle, used by context edges.
    Handle,
}

impl TraceType {
    /// Infers the trace type of a concrete tensor.
    pub fn of_tensor(data: &ArrayD<f32>) -> Self {
        Self::Tensor {
            shape: data.shape().to_vec(),
        }
    }
}

/// Kind of a trace-graph node.
#[derive(Clone)]
pub enum TraceOp {
    /// A value fed into the trace from outside, or first seen as an input.
    Input,
    /// A whole backward-graph node mirrored as one composite operation.
    ExternalOp { function: Arc<dyn Function> },
    /// Projection of the `index`-th result of `producer`.
    Select { producer: TraceNodeId, index: usize },
}

/// A node of the trace graph.
pub struct TraceNode {
    op: TraceOp,
    inputs: Vec<TraceNodeId>,
    ty: Option<TraceType>,
}

impl TraceNode {
    pub fn op(&self) -> &TraceOp {
        &self.op
    }

    pub fn inputs(&self) -> &[TraceNodeId] {
        &self.inputs
    }

    pub fn ty(&self) -> Option<&TraceType> {
        self.ty.as_ref()
    }
}

/// The graph mirroring forward execution, owned by a tracing session.
///
/// Nodes live in an arena and are addressed by index; `create_*` allocates a
/// node and [`append`](TraceGraph::append) inserts it into the execution
/// order. The optimization and compilation passes that would consume this
/// graph are not this crate's concern.
#[derive(Default)]
pub struct TraceGraph {
    nodes: Vec<TraceNode>,
    order: Vec<TraceNodeId>,
}

impl TraceGraph {
    fn create(&mut self, op: TraceOp) -> TraceNodeId {
        let id = TraceNodeId(self.nodes.len());
        self.nodes.push(TraceNode {
            op,
            inputs: Vec::new(),
            ty: None,
        });

        id
    }

    pub fn create_input(&mut self) -> TraceNodeId {
        self.create(TraceOp::Input)
    }

    pub fn create_external_op(&mut self, function: Arc<dyn Function>) -> TraceNodeId {
        self.create(TraceOp::ExternalOp { function })
    }

    pub fn create_select(&mut self, producer: TraceNodeId, index: usize) -> TraceNodeId {
        self.create(TraceOp::Select { producer, index })
    }

    /// Inserts an allocated node into the execution order.
    pub fn append(&mut self, id: TraceNodeId) {
        self.order.push(id);
    }

    /// Attaches `value` as the next input edge of `node`.
    pub fn add_input(&mut self, node: TraceNodeId, value: TraceNodeId) {
        self.nodes[node.0].inputs.push(value);
    }

    pub fn set_type(&mut self, node: TraceNodeId, ty: TraceType) {
        self.nodes[node.0].ty = Some(ty);
    }

    pub fn node(&self, id: TraceNodeId) -> &TraceNode {
        &self.nodes[id.0]
    }

    /// Nodes in execution order.
    pub fn order(&self) -> &[TraceNodeId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
